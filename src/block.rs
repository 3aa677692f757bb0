use crate::abacus::Abacus;
use crate::mold::Mold;
use crate::MAX_VALUE;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 hash as hex string.
pub type Fingerprint = String;

/// Compute the SHA-256 hex digest of some data.
pub fn compute_hash(data: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Unique, immutable block identifier. Minted by the engine, never reused.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Canvas coordinates. Opaque to the engine apart from the split/release offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// `base^exponent` with the value cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Power {
    base: u64,
    exponent: u32,
    value: u64,
}

impl Power {
    /// `None` if the power exceeds [`MAX_VALUE`].
    pub fn new(base: u64, exponent: u32) -> Option<Self> {
        let value = base.checked_pow(exponent).filter(|v| *v <= MAX_VALUE)?;
        Some(Self {
            base,
            exponent,
            value,
        })
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

/// Ordered factor pair with the product cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    factors: [u64; 2],
    value: u64,
}

impl Product {
    /// `None` if the product exceeds [`MAX_VALUE`].
    pub fn new(a: u64, b: u64) -> Option<Self> {
        let value = a.checked_mul(b).filter(|v| *v <= MAX_VALUE)?;
        Some(Self {
            factors: [a, b],
            value,
        })
    }

    pub fn factors(&self) -> [u64; 2] {
        self.factors
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    Simple { value: u64 },
    Power(Power),
    Product(Product),
    Mold(Mold),
    Abacus(Abacus),
}

impl BlockKind {
    /// The numeric value of a number block; `None` for molds and abaci.
    pub fn number_value(&self) -> Option<u64> {
        match self {
            BlockKind::Simple { value } => Some(*value),
            BlockKind::Power(p) => Some(p.value()),
            BlockKind::Product(p) => Some(p.value()),
            BlockKind::Mold(_) | BlockKind::Abacus(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        self.number_value().is_some()
    }

    /// Base and exponent this block contributes to a fusion.
    ///
    /// A power contributes its own; anything else is its value to the first.
    pub fn power_parts(&self) -> Option<(u64, u32)> {
        match self {
            BlockKind::Power(p) => Some((p.base(), p.exponent())),
            other => other.number_value().map(|v| (v, 1)),
        }
    }
}

/// Any entity placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub position: Position,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: BlockId, position: Position, kind: BlockKind) -> Self {
        Self { id, position, kind }
    }

    pub fn simple(id: BlockId, position: Position, value: u64) -> Self {
        Self::new(id, position, BlockKind::Simple { value })
    }

    pub fn value(&self) -> Option<u64> {
        self.kind.number_value()
    }

    pub fn at(&self, position: Position) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BlockKind::Simple { value } => write!(f, "{} simple {}", self.id, value),
            BlockKind::Power(p) => write!(
                f,
                "{} power {}^{} = {}",
                self.id,
                p.base(),
                p.exponent(),
                p.value()
            ),
            BlockKind::Product(p) => {
                let [a, b] = p.factors();
                write!(f, "{} product {}x{} = {}", self.id, a, b, p.value())
            }
            BlockKind::Mold(m) => write!(f, "{} {}", self.id, m),
            BlockKind::Abacus(a) => write!(f, "{} abacus total {}", self.id, a.total()),
        }
    }
}
