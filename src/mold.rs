//! Square and cube molds: capacity, fill state and fit classification.

use crate::block::{BlockId, BlockKind, Power, Product};
use crate::MAX_VALUE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoldShape {
    Square,
    Cube,
}

impl MoldShape {
    /// `side^2` or `side^3`; `None` past [`MAX_VALUE`].
    pub fn capacity(self, side: u64) -> Option<u64> {
        let exp = match self {
            MoldShape::Square => 2,
            MoldShape::Cube => 3,
        };
        side.checked_pow(exp).filter(|c| *c <= MAX_VALUE)
    }
}

impl FromStr for MoldShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "square" => Ok(MoldShape::Square),
            "cube" => Ok(MoldShape::Cube),
            other => Err(format!("unknown mold shape '{other}' (expected square or cube)")),
        }
    }
}

/// Exact copy of a power or product occupant, kept so a release can rebuild it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Snapshot {
    Power(Power),
    Product(Product),
}

/// How a released occupant is reconstructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Restore {
    /// A simple block holding the filled value, under the occupant's id.
    Simple,
    /// The exact power/product that was poured in, under the occupant's id.
    Snapshot(Snapshot),
    /// Something was multiplied in; identity is lost and a fresh simple block emerges.
    Merged,
}

impl Restore {
    pub fn of(kind: &BlockKind) -> Self {
        match kind {
            BlockKind::Power(p) => Restore::Snapshot(Snapshot::Power(p.clone())),
            BlockKind::Product(p) => Restore::Snapshot(Snapshot::Product(p.clone())),
            _ => Restore::Simple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fill {
    pub occupant: BlockId,
    pub value: u64,
    pub restore: Restore,
}

/// Derived fit classification. Computed on read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoldFit {
    pub surplus: u64,
    pub perfect: bool,
}

pub fn classify(filled_value: u64, capacity: u64) -> MoldFit {
    MoldFit {
        surplus: filled_value.saturating_sub(capacity),
        perfect: filled_value == capacity,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mold {
    shape: MoldShape,
    side: u64,
    capacity: u64,
    fill: Option<Fill>,
    surplus: u64,
}

impl Mold {
    /// Empty mold; `None` if the capacity is out of range. `side` is clamped to at least 1.
    pub fn new(shape: MoldShape, side: u64) -> Option<Self> {
        let side = side.max(1);
        let capacity = shape.capacity(side)?;
        Some(Self {
            shape,
            side,
            capacity,
            fill: None,
            surplus: 0,
        })
    }

    pub fn shape(&self) -> MoldShape {
        self.shape
    }

    pub fn side(&self) -> u64 {
        self.side
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn fill(&self) -> Option<&Fill> {
        self.fill.as_ref()
    }

    pub fn filled_value(&self) -> Option<u64> {
        self.fill.as_ref().map(|f| f.value)
    }

    pub fn surplus(&self) -> u64 {
        self.surplus
    }

    pub fn is_occupied(&self) -> bool {
        self.fill.is_some()
    }

    pub fn fit(&self) -> Option<MoldFit> {
        self.filled_value().map(|v| classify(v, self.capacity))
    }

    pub fn is_perfect_fit(&self) -> bool {
        self.fit().is_some_and(|f| f.perfect)
    }

    pub fn filled(self, fill: Fill) -> Self {
        let surplus = classify(fill.value, self.capacity).surplus;
        Self {
            fill: Some(fill),
            surplus,
            ..self
        }
    }

    /// Multiply the held value by `factor`. The result always releases as a fresh simple block.
    ///
    /// `None` if the mold is empty or the product exceeds [`MAX_VALUE`].
    pub fn multiplied(self, factor: u64) -> Option<Self> {
        let fill = self.fill.as_ref()?;
        let value = fill.value.checked_mul(factor).filter(|v| *v <= MAX_VALUE)?;
        let fill = Fill {
            occupant: fill.occupant.clone(),
            value,
            restore: Restore::Merged,
        };
        Some(self.filled(fill))
    }

    pub fn emptied(self) -> Self {
        Self {
            fill: None,
            surplus: 0,
            ..self
        }
    }
}

impl fmt::Display for Mold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self.shape {
            MoldShape::Square => "square",
            MoldShape::Cube => "cube",
        };
        write!(f, "{shape} mold side {} capacity {}", self.side, self.capacity)?;
        match self.fit() {
            None => write!(f, " (empty)"),
            Some(fit) if fit.perfect => write!(f, " holding {} (perfect fit)", self.capacity),
            Some(fit) => write!(
                f,
                " holding {} (surplus {})",
                self.filled_value().unwrap_or_default(),
                fit.surplus
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_with(value: u64, restore: Restore) -> Fill {
        Fill {
            occupant: "block-1".into(),
            value,
            restore,
        }
    }

    #[test]
    fn capacity_by_shape() {
        assert_eq!(Mold::new(MoldShape::Square, 4).unwrap().capacity(), 16);
        assert_eq!(Mold::new(MoldShape::Cube, 3).unwrap().capacity(), 27);
        assert_eq!(Mold::new(MoldShape::Cube, 0).unwrap().side(), 1);
        assert!(Mold::new(MoldShape::Cube, 1 << 20).is_none());
    }

    #[test]
    fn surplus_over_capacity() {
        let mold = Mold::new(MoldShape::Square, 4)
            .unwrap()
            .filled(fill_with(20, Restore::Simple));
        assert_eq!(mold.surplus(), 4);
        assert!(!mold.is_perfect_fit());
    }

    #[test]
    fn exact_fill_is_perfect() {
        let mold = Mold::new(MoldShape::Square, 4)
            .unwrap()
            .filled(fill_with(16, Restore::Simple));
        assert_eq!(mold.surplus(), 0);
        assert!(mold.is_perfect_fit());
    }

    #[test]
    fn underfill_is_neither() {
        let fit = classify(9, 16);
        assert_eq!(fit.surplus, 0);
        assert!(!fit.perfect);
        assert!(!Mold::new(MoldShape::Square, 4).unwrap().is_perfect_fit());
    }

    #[test]
    fn multiply_in_place_recomputes_and_merges() {
        let mold = Mold::new(MoldShape::Cube, 2)
            .unwrap()
            .filled(fill_with(2, Restore::Simple))
            .multiplied(4)
            .unwrap();
        assert_eq!(mold.filled_value(), Some(8));
        assert!(mold.is_perfect_fit());
        assert_eq!(mold.fill().unwrap().restore, Restore::Merged);

        let over = mold.multiplied(3).unwrap();
        assert_eq!(over.surplus(), 16);
        assert!(!over.is_perfect_fit());
    }

    #[test]
    fn empty_mold_cannot_multiply() {
        assert!(Mold::new(MoldShape::Square, 2).unwrap().multiplied(3).is_none());
    }

    #[test]
    fn emptied_clears_fill_and_surplus() {
        let mold = Mold::new(MoldShape::Square, 2)
            .unwrap()
            .filled(fill_with(10, Restore::Simple))
            .emptied();
        assert!(!mold.is_occupied());
        assert_eq!(mold.surplus(), 0);
        assert_eq!(mold.fit(), None);
    }

    #[test]
    fn restore_snapshots_only_composites() {
        let power = BlockKind::Power(Power::new(2, 3).unwrap());
        assert!(matches!(Restore::of(&power), Restore::Snapshot(Snapshot::Power(_))));
        assert_eq!(Restore::of(&BlockKind::Simple { value: 5 }), Restore::Simple);
    }

    #[test]
    fn shape_parses() {
        assert_eq!("cube".parse::<MoldShape>(), Ok(MoldShape::Cube));
        assert!("cuboid".parse::<MoldShape>().is_err());
    }
}
