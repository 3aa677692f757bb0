use crate::MAX_VALUE;
use thiserror::Error;

/// Failures of the outer surfaces: configuration files and intent scripts.
#[derive(Error, Debug)]
pub enum PowerBlocksError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PowerBlocksError>;

/// A recoverable, user-facing outcome of an intent that left the catalog unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    #[error("{value} is a prime number and cannot be factored")]
    PrimeNumber { value: u64 },

    #[error("{divisor} is not a valid divisor of {value}")]
    InvalidDivisor { value: u64, divisor: i64 },

    #[error("This mold already holds a number. Click it to release it.")]
    MoldOccupied,

    #[error("The abacus is empty, there is nothing to export")]
    AbacusEmpty,

    #[error("Result exceeds the largest supported value ({MAX_VALUE})")]
    ValueTooLarge,
}

impl Notice {
    /// Short title, suitable for a toast header.
    pub fn title(&self) -> &'static str {
        match self {
            Notice::PrimeNumber { .. } => "Prime number",
            Notice::InvalidDivisor { .. } => "Invalid factor",
            Notice::MoldOccupied => "Mold occupied",
            Notice::AbacusEmpty => "Empty abacus",
            Notice::ValueTooLarge => "Number too large",
        }
    }
}
