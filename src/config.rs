use crate::error::{PowerBlocksError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// What a click on a number block does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorMode {
    /// Ask the user for a divisor.
    #[default]
    Manual,
    /// Split along the block's own structure, or its canonical factor pair.
    Automatic,
}

impl FromStr for FactorMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "manual" => Ok(FactorMode::Manual),
            "automatic" | "auto" => Ok(FactorMode::Automatic),
            other => Err(format!("unknown factor mode '{other}' (expected manual or automatic)")),
        }
    }
}

impl fmt::Display for FactorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorMode::Manual => f.write_str("manual"),
            FactorMode::Automatic => f.write_str("automatic"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    /// `block-<uuid v4>`
    #[default]
    Uuid,
    /// `block-1`, `block-2`, ...
    Sequential,
}

/// Dropping a number onto a mold that already holds one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupiedMold {
    #[default]
    Multiply,
    Reject,
}

/// Where factor children land relative to their parent: `(x - dx, y + dy)` and `(x + dx, y + dy)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitOffset {
    pub dx: f64,
    pub dy: f64,
}

impl Default for SplitOffset {
    fn default() -> Self {
        Self { dx: 80.0, dy: 130.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub factor_mode: FactorMode,
    pub id_scheme: IdScheme,
    pub occupied_mold: OccupiedMold,
    pub split_offset: SplitOffset,
    /// Maximum number of revisions retained for undo (0 = unlimited).
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            factor_mode: FactorMode::default(),
            id_scheme: IdScheme::default(),
            occupied_mold: OccupiedMold::default(),
            split_offset: SplitOffset::default(),
            history_limit: 100,
        }
    }
}

impl EngineConfig {
    /// Defaults with sequential ids, for scripts and tests.
    pub fn deterministic() -> Self {
        Self {
            id_scheme: IdScheme::Sequential,
            ..Self::default()
        }
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let config: Self = serde_json::from_slice(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let SplitOffset { dx, dy } = self.split_offset;
        if !dx.is_finite() || !dy.is_finite() {
            return Err(PowerBlocksError::InvalidConfig(
                "split_offset must be finite".into(),
            ));
        }
        Ok(())
    }
}
