//! Serializable user intents, as issued by a presentation layer or a script.

use crate::block::BlockId;
use crate::config::FactorMode;
use crate::error::Result;
use crate::mold::MoldShape;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Intent {
    CreateSimple {
        value: u64,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    CreateMold {
        shape: MoldShape,
        side: u64,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    CreateAbacus {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    Combine {
        dragged: BlockId,
        target: BlockId,
    },
    Click {
        block: BlockId,
    },
    ApplyManualFactor {
        block: BlockId,
        divisor: i64,
    },
    Move {
        block: BlockId,
        x: f64,
        y: f64,
    },
    Delete {
        block: BlockId,
    },
    ChangeAbacusBeads {
        abacus: BlockId,
        row: u64,
        beads: i64,
    },
    AddAbacusRow {
        abacus: BlockId,
    },
    ExportAbacus {
        abacus: BlockId,
    },
    SetFactorMode {
        mode: FactorMode,
    },
    Undo,
}

impl Intent {
    /// Revision label for this intent.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::CreateSimple { .. } => "create_simple",
            Intent::CreateMold { .. } => "create_mold",
            Intent::CreateAbacus { .. } => "create_abacus",
            Intent::Combine { .. } => "combine",
            Intent::Click { .. } => "click",
            Intent::ApplyManualFactor { .. } => "apply_manual_factor",
            Intent::Move { .. } => "move",
            Intent::Delete { .. } => "delete",
            Intent::ChangeAbacusBeads { .. } => "change_abacus_beads",
            Intent::AddAbacusRow { .. } => "add_abacus_row",
            Intent::ExportAbacus { .. } => "export_abacus",
            Intent::SetFactorMode { .. } => "set_factor_mode",
            Intent::Undo => "undo",
        }
    }
}

/// Parse a JSON array of intents.
pub fn parse_script(data: &[u8]) -> Result<Vec<Intent>> {
    Ok(serde_json::from_slice(data)?)
}

/// Read and parse a JSON intent script from disk.
pub fn load_script(path: &Path) -> Result<Vec<Intent>> {
    let data = fs::read(path)?;
    parse_script(&data)
}
