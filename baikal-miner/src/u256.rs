//! 256-bit unsigned integer arithmetic for network targets.
//!
//! Wraps `ruint::aliases::U256` so callers see only the handful of
//! operations target handling needs.

use ruint::aliases::U256 as Ruint256;
use std::fmt;
use std::ops::Div;

/// A 256-bit unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U256(Ruint256);

impl U256 {
    /// Zero constant.
    pub const ZERO: Self = Self(Ruint256::ZERO);

    /// Largest representable value.
    pub const MAX: Self = Self(Ruint256::MAX);

    /// Create from little-endian 64-bit limbs.
    pub const fn from_limbs(limbs: [u64; 4]) -> Self {
        Self(Ruint256::from_limbs(limbs))
    }

    /// Create from big-endian bytes, the order pools send targets in.
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(Ruint256::from_be_bytes(bytes))
    }

    /// Create from little-endian bytes.
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Self(Ruint256::from_le_bytes(bytes))
    }

    /// Convert to big-endian bytes.
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    /// Convert to u64, saturating at u64::MAX.
    pub fn saturating_to_u64(self) -> u64 {
        self.0.saturating_to()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        Self(Ruint256::from(value))
    }
}

impl Div for U256 {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Self(self.0 / rhs.0)
    }
}

impl Div<u64> for U256 {
    type Output = Self;

    fn div(self, rhs: u64) -> Self::Output {
        Self(self.0 / Ruint256::from(rhs))
    }
}

impl fmt::LowerHex for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_be_bytes()))
    }
}
