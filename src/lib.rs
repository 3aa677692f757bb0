//! Block algebra and abacus arithmetic.
//!
//! The [`engine::Engine`] owns a copy-on-write [`catalog::Catalog`] of blocks and
//! exposes every user intent (create, combine, click, factor, fill molds, move
//! beads, export) as a synchronous transition. Presentation layers read the
//! catalog after each call and display the optional [`error::Notice`].

pub mod abacus;
pub mod block;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod intent;
pub mod mold;
pub mod numtheory;
pub mod revision;

/// Largest value a block may hold: the biggest integer a 64-bit float represents exactly.
pub const MAX_VALUE: u64 = (1 << 53) - 1;
