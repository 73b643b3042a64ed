//! Real-valued difficulty type.

use std::fmt;
use std::ops::{Add, AddAssign};

/// Mining difficulty as reported by an algorithm.
///
/// Multi-algorithm boards compare difficulties from hash functions with
/// different difficulty-1 targets, so the value is kept as a float rather
/// than an integer multiplier. Which target a difficulty corresponds to is
/// the algorithm's business; this type only orders, sums, and displays.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Difficulty(f64);

impl Difficulty {
    pub const ZERO: Self = Self(0.0);

    /// Create a new difficulty value.
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl From<f64> for Difficulty {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Difficulty> for f64 {
    fn from(diff: Difficulty) -> Self {
        diff.0
    }
}

impl Add for Difficulty {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Difficulty {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;

        let (scaled, suffix) = [(1e15, "P"), (1e12, "T"), (1e9, "G"), (1e6, "M"), (1e3, "K")]
            .into_iter()
            .find(|(scale, _)| value >= *scale)
            .map(|(scale, suffix)| (value / scale, suffix))
            .unwrap_or((value, ""));

        if scaled >= 100.0 {
            write!(f, "{:.0}{}", scaled, suffix)
        } else if scaled >= 10.0 {
            write!(f, "{:.1}{}", scaled, suffix)
        } else if scaled >= 0.01 || scaled == 0.0 {
            write!(f, "{:.2}{}", scaled, suffix)
        } else {
            // Sub-unit shares from easy algorithms
            write!(f, "{:.2e}", scaled)
        }
    }
}
