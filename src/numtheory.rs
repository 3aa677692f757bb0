//! Stateless factorization helpers.

use std::fmt;

/// Canonical factor pair of `n`: the smallest divisor `f >= 2` and its cofactor.
///
/// Returns `None` for terminal leaves: `n <= 3` and primes.
pub fn factor_pair(n: u64) -> Option<(u64, u64)> {
    if n <= 3 {
        return None;
    }
    if n % 2 == 0 {
        return Some((2, n / 2));
    }
    let mut d = 3;
    // d <= n / d is d * d <= n without the overflow
    while d <= n / d {
        if n % d == 0 {
            return Some((d, n / d));
        }
        d += 2;
    }
    None
}

/// Whether `d` is a proper, non-trivial divisor of `n` (`1 < d < n`).
pub fn is_valid_divisor(n: u64, d: u64) -> bool {
    d > 1 && d < n && n % d == 0
}

/// The full tree obtained by repeatedly applying [`factor_pair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactorTree {
    Leaf(u64),
    Node {
        value: u64,
        left: Box<FactorTree>,
        right: Box<FactorTree>,
    },
}

impl FactorTree {
    pub fn build(n: u64) -> Self {
        match factor_pair(n) {
            None => FactorTree::Leaf(n),
            Some((a, b)) => FactorTree::Node {
                value: n,
                left: Box::new(FactorTree::build(a)),
                right: Box::new(FactorTree::build(b)),
            },
        }
    }

    pub fn value(&self) -> u64 {
        match self {
            FactorTree::Leaf(v) | FactorTree::Node { value: v, .. } => *v,
        }
    }

    /// Leaves in left-to-right order (non-decreasing for canonical trees).
    pub fn leaves(&self) -> Vec<u64> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<u64>) {
        match self {
            FactorTree::Leaf(v) => out.push(*v),
            FactorTree::Node { left, right, .. } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{}{}", "  ".repeat(depth), self.value())?;
        if let FactorTree::Node { left, right, .. } = self {
            left.write_indented(f, depth + 1)?;
            right.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for FactorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
