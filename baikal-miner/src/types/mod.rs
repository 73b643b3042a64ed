//! Core numeric types shared by the board modules.

mod difficulty;

pub use difficulty::Difficulty;

/// Hashrate measurement, stored in hashes per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct HashRate(pub u64);

impl HashRate {
    /// Create from whole kilohashes per second.
    pub fn from_kilohashes(kh: u64) -> Self {
        Self(kh.saturating_mul(1_000))
    }

    /// Value in whole kilohashes per second, truncated.
    pub fn as_kilohashes(&self) -> u64 {
        self.0 / 1_000
    }

    pub fn as_megahashes(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn as_gigahashes(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Format as human-readable string with appropriate units
    pub fn to_human_readable(&self) -> String {
        if self.0 >= 1_000_000_000 {
            format!("{:.2} GH/s", self.as_gigahashes())
        } else if self.0 >= 1_000_000 {
            format!("{:.2} MH/s", self.as_megahashes())
        } else if self.0 >= 1_000 {
            format!("{} kH/s", self.as_kilohashes())
        } else {
            format!("{} H/s", self.0)
        }
    }
}

impl From<HashRate> for f64 {
    fn from(rate: HashRate) -> Self {
        rate.0 as f64
    }
}
