//! Decimal place-value rows with carry and borrow normalization.
//!
//! Rows are keyed by place value (1, 10, 100, ...). At rest every row holds
//! 0..=9 beads; during an edit a row may transiently hold 10 or more beads
//! (resolved by [`Abacus::normalize`]'s carry pass) or a negative count
//! (resolved by its borrow pass).
//!
//! Place values stop at [`TOP_PLACE`], the first power of ten above
//! [`MAX_VALUE`](crate::MAX_VALUE). That row never carries further.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// 10^16, the highest place value a row may have.
pub const TOP_PLACE: u64 = 10_000_000_000_000_000;

/// A decrement could not be satisfied by borrowing. The row was clamped to 0.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot borrow into place value {place}: nothing above it to convert")]
pub struct BorrowImpossible {
    pub place: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Abacus {
    rows: BTreeMap<u64, i64>,
}

impl Default for Abacus {
    fn default() -> Self {
        Self::new()
    }
}

impl Abacus {
    /// A single units row with no beads.
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::from([(1, 0)]),
        }
    }

    /// Rows as `(place value, beads)`, lowest place first.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = (u64, i64)> + '_ {
        self.rows.iter().map(|(p, b)| (*p, *b))
    }

    pub fn beads(&self, place: u64) -> Option<i64> {
        self.rows.get(&place).copied()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn highest_place(&self) -> u64 {
        self.rows.keys().next_back().copied().unwrap_or(1)
    }

    /// Represented value: sum of `beads * place`. Negative only mid-edit.
    pub fn total(&self) -> i64 {
        self.rows.iter().fold(0i64, |acc, (place, beads)| {
            let place = i64::try_from(*place).unwrap_or(i64::MAX);
            acc.saturating_add(place.saturating_mul(*beads))
        })
    }

    /// The total if row `place` held `beads` instead. `None` on overflow or
    /// an unknown row.
    pub fn total_with(&self, place: u64, beads: i64) -> Option<i64> {
        let mut total = 0i64;
        for (p, b) in &self.rows {
            let b = if *p == place { beads } else { *b };
            total = total.checked_add(i64::try_from(*p).ok()?.checked_mul(b)?)?;
        }
        self.rows.contains_key(&place).then_some(total)
    }

    /// Every row in 0..=9 and place values exactly 1, 10, 100, ... with no gaps.
    pub fn is_canonical(&self) -> bool {
        let mut expected = Some(1u64);
        for (place, beads) in &self.rows {
            if expected != Some(*place) || !(0..=9).contains(beads) {
                return false;
            }
            expected = place.checked_mul(10);
        }
        true
    }

    /// Append the next place value above the highest row. `None` once the
    /// top row is [`TOP_PLACE`].
    pub fn add_row(&mut self) -> Option<u64> {
        let place = self.highest_place().checked_mul(10)?;
        if place > TOP_PLACE {
            return None;
        }
        self.rows.entry(place).or_insert(0);
        Some(place)
    }

    /// Set one row's bead count and renormalize. Unknown places are ignored.
    pub fn set_beads(&mut self, place: u64, beads: i64) -> Result<(), BorrowImpossible> {
        match self.rows.get_mut(&place) {
            Some(row) => *row = beads,
            None => return Ok(()),
        }
        self.normalize()
    }

    /// Add `value` to the represented total, re-deriving every row.
    ///
    /// Existing rows are kept; rows are added upward until the highest place
    /// value reaches the new total, then beads are assigned greedily from the top.
    pub fn deposit(&mut self, value: u64) -> u64 {
        let current = u64::try_from(self.total()).unwrap_or(0);
        let total = current.saturating_add(value);
        self.rebuild(total);
        self.carry();
        total
    }

    /// Zero every row, keeping the rows themselves.
    pub fn clear(&mut self) {
        for beads in self.rows.values_mut() {
            *beads = 0;
        }
    }

    /// Restore the canonical range: borrow first, then carry.
    ///
    /// The carry pass runs even when a borrow is rejected.
    pub fn normalize(&mut self) -> Result<(), BorrowImpossible> {
        let borrowed = self.borrow();
        self.carry();
        borrowed
    }

    fn rebuild(&mut self, total: u64) {
        if total == 0 {
            self.rows = BTreeMap::from([(1, 0)]);
            return;
        }
        self.rows.entry(1).or_insert(0);
        let mut top = self.highest_place();
        while top < total && top < TOP_PLACE {
            top *= 10;
            self.rows.insert(top, 0);
        }
        let mut remaining = total;
        for (place, beads) in self.rows.iter_mut().rev() {
            *beads = i64::try_from(remaining / place).unwrap_or(i64::MAX);
            remaining %= place;
        }
    }

    fn borrow(&mut self) -> Result<(), BorrowImpossible> {
        while let Some(place) = self.lowest_negative() {
            if self.total() < 0 {
                self.rows.insert(place, 0);
                return Err(BorrowImpossible { place });
            }
            let source = self
                .rows
                .range(place + 1..)
                .find(|(_, beads)| **beads > 0)
                .map(|(p, _)| *p);
            let Some(source) = source else {
                self.rows.insert(place, 0);
                return Err(BorrowImpossible { place });
            };

            // Walk down one row at a time so intermediate rows end up holding 9.
            let chain: Vec<u64> = self.rows.range(place..=source).map(|(p, _)| *p).collect();
            for pair in chain.windows(2).rev() {
                let (lower, higher) = (pair[0], pair[1]);
                let units = i64::try_from(higher / lower).unwrap_or(10);
                *self.rows.entry(higher).or_insert(0) -= 1;
                *self.rows.entry(lower).or_insert(0) += units;
            }
        }
        Ok(())
    }

    fn carry(&mut self) {
        loop {
            let overflow = self
                .rows
                .range(..TOP_PLACE)
                .find(|(_, beads)| **beads >= 10)
                .map(|(p, b)| (*p, *b));
            let Some((place, beads)) = overflow else {
                break;
            };
            self.rows.insert(place, beads % 10);
            *self.rows.entry(place * 10).or_insert(0) += beads / 10;
        }
    }

    fn lowest_negative(&self) -> Option<u64> {
        self.rows
            .iter()
            .find(|(_, beads)| **beads < 0)
            .map(|(p, _)| *p)
    }
}

impl fmt::Display for Abacus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (place, beads) in self.rows().rev() {
            let filled = usize::try_from(beads.clamp(0, 9)).unwrap_or(0);
            writeln!(
                f,
                "{:>12} | {}{} {}",
                place,
                "o".repeat(filled),
                ".".repeat(9 - filled),
                beads
            )?;
        }
        writeln!(f, "total: {}", self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abacus(rows: &[(u64, i64)]) -> Abacus {
        Abacus {
            rows: rows.iter().copied().collect(),
        }
    }

    fn rows_of(a: &Abacus) -> Vec<(u64, i64)> {
        a.rows().collect()
    }

    #[test]
    fn new_abacus_has_units_row() {
        let a = Abacus::new();
        assert_eq!(rows_of(&a), vec![(1, 0)]);
        assert_eq!(a.total(), 0);
        assert!(a.is_canonical());
    }

    #[test]
    fn deposit_carries_into_new_row() {
        let mut a = abacus(&[(1, 9)]);
        assert_eq!(a.deposit(1), 10);
        assert_eq!(rows_of(&a), vec![(1, 0), (10, 1)]);
    }

    #[test]
    fn deposit_grows_rows_to_cover_total() {
        let mut a = Abacus::new();
        a.deposit(25);
        assert_eq!(rows_of(&a), vec![(1, 5), (10, 2), (100, 0)]);
        assert_eq!(a.total(), 25);
        assert!(a.is_canonical());
    }

    #[test]
    fn deposit_keeps_added_rows() {
        let mut a = Abacus::new();
        a.add_row();
        a.add_row();
        a.deposit(7);
        assert_eq!(rows_of(&a), vec![(1, 7), (10, 0), (100, 0)]);
    }

    #[test]
    fn deposit_then_total_round_trips() {
        for v in [0u64, 1, 9, 10, 11, 99, 100, 101, 999, 1000, 123_456_789, 9_007_199_254_740_991] {
            let mut a = Abacus::new();
            a.deposit(v);
            assert_eq!(a.total(), v as i64, "{v}");
            assert!(a.is_canonical(), "{v}: {a:?}");
        }
    }

    #[test]
    fn deposits_accumulate() {
        let mut a = Abacus::new();
        a.deposit(48);
        a.deposit(57);
        assert_eq!(a.total(), 105);
        assert_eq!(rows_of(&a), vec![(1, 5), (10, 0), (100, 1), (1000, 0)]);
    }

    #[test]
    fn increment_past_nine_carries() {
        let mut a = abacus(&[(1, 9), (10, 9)]);
        a.set_beads(1, 10).unwrap();
        assert_eq!(rows_of(&a), vec![(1, 0), (10, 0), (100, 1)]);
    }

    #[test]
    fn decrement_borrows_from_next_row() {
        let mut a = abacus(&[(1, 0), (10, 1)]);
        a.set_beads(1, -1).unwrap();
        assert_eq!(rows_of(&a), vec![(1, 9), (10, 0)]);
    }

    #[test]
    fn decrement_borrows_through_empty_rows() {
        let mut a = abacus(&[(1, 0), (10, 0), (100, 1)]);
        a.set_beads(1, -1).unwrap();
        assert_eq!(rows_of(&a), vec![(1, 9), (10, 9), (100, 0)]);
        assert_eq!(a.total(), 99);
    }

    #[test]
    fn decrement_on_empty_abacus_is_clamped() {
        let mut a = abacus(&[(1, 0)]);
        let err = a.set_beads(1, -1).unwrap_err();
        assert_eq!(err.place, 1);
        assert_eq!(rows_of(&a), vec![(1, 0)]);
    }

    #[test]
    fn decrement_of_top_row_with_nothing_above_is_clamped() {
        let mut a = abacus(&[(1, 5), (10, 0)]);
        assert!(a.set_beads(10, -1).is_err());
        assert_eq!(rows_of(&a), vec![(1, 5), (10, 0)]);
        assert!(a.total() >= 0);
    }

    #[test]
    fn set_beads_on_unknown_row_is_ignored() {
        let mut a = abacus(&[(1, 3)]);
        a.set_beads(1000, 4).unwrap();
        assert_eq!(rows_of(&a), vec![(1, 3)]);
    }

    #[test]
    fn add_row_appends_next_power_of_ten() {
        let mut a = Abacus::new();
        assert_eq!(a.add_row(), Some(10));
        assert_eq!(a.add_row(), Some(100));
        assert_eq!(a.row_count(), 3);
        assert!(a.is_canonical());
    }

    #[test]
    fn add_row_stops_at_top_place() {
        let mut a = Abacus::new();
        while a.add_row().is_some() {}
        assert_eq!(a.highest_place(), TOP_PLACE);
        assert_eq!(a.row_count(), 17);
        assert_eq!(a.add_row(), None);
        assert!(a.is_canonical());
    }

    #[test]
    fn carry_stops_at_top_place() {
        let mut a = Abacus::new();
        a.set_beads(1, i64::MAX).unwrap();
        assert_eq!(a.highest_place(), TOP_PLACE);
        assert!(a.rows().all(|(place, _)| place <= TOP_PLACE));
        assert!(!a.is_canonical());
    }

    #[test]
    fn total_with_reports_candidate_and_overflow() {
        let a = abacus(&[(1, 5), (10, 2)]);
        assert_eq!(a.total_with(10, 7), Some(75));
        assert_eq!(a.total_with(100, 1), None);
        assert_eq!(a.total_with(10, i64::MAX), None);
    }

    #[test]
    fn clear_keeps_rows() {
        let mut a = abacus(&[(1, 5), (10, 2)]);
        a.clear();
        assert_eq!(rows_of(&a), vec![(1, 0), (10, 0)]);
    }

    #[test]
    fn canonical_check_rejects_gaps_and_overflow() {
        assert!(!abacus(&[(1, 0), (100, 1)]).is_canonical());
        assert!(!abacus(&[(1, 10)]).is_canonical());
        assert!(!abacus(&[(1, -1)]).is_canonical());
        assert!(!abacus(&[(1, 0), (u64::MAX, 0)]).is_canonical());
    }

    #[test]
    fn display_lists_highest_place_first() {
        let a = abacus(&[(1, 5), (10, 2)]);
        let text = a.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].trim_start().starts_with("10 |"));
        assert!(lines[1].trim_start().starts_with("1 |"));
        assert_eq!(lines[2], "total: 25");
    }
}
