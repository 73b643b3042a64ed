//! Network target to on-device target conversion.
//!
//! Baikal chips compare only the top 64 bits of a hash against their target,
//! so the board target is the full target shifted down by 192 bits. The
//! difficulty that goes with a target comes from the bound algorithm.

use crate::{algorithm::Algorithm, types::Difficulty, u256::U256};

/// Divisor that truncates a full target to board precision (2^192).
pub const BOARD_TARGET_DIVISOR: U256 = U256::from_limbs([0, 0, 0, 1]);

/// Full target together with its derived board target and difficulty.
///
/// Only constructed through [`TargetPair::convert`], so the three values
/// always describe the same target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPair {
    full: U256,
    board: u64,
    difficulty: Difficulty,
}

impl TargetPair {
    pub fn convert<A: Algorithm + ?Sized>(algorithm: &A, full: U256) -> Self {
        Self {
            full,
            board: board_target(full),
            difficulty: algorithm.difficulty_for_target(full),
        }
    }

    pub fn full(&self) -> U256 {
        self.full
    }

    /// Truncated target sent with every work submission.
    pub fn board(&self) -> u64 {
        self.board
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

/// Truncate a full 256-bit target to the 64 bits the chips compare.
pub fn board_target(full: U256) -> u64 {
    // Quotient of a 256-bit value by 2^192 always fits
    (full / BOARD_TARGET_DIVISOR).saturating_to_u64()
}
