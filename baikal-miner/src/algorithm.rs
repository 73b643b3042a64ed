//! Boundary to the hashing layer.
//!
//! The board never hashes anything itself. Header construction, the hash
//! function and the target/difficulty math all live behind [`Algorithm`],
//! which the owner binds to each board before mining. Implementations must
//! be deterministic: the same job, extranonces and nonce always produce the
//! same header, and hashing a header is pure.

use bytes::Bytes;
use thiserror::Error;

use crate::{types::Difficulty, u256::U256};

/// Output of an algorithm's hash function.
pub type Hash256 = [u8; 32];

/// Failure while rebuilding a header from a stored job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct AlgorithmError(pub String);

/// Algorithm identifiers understood by the board firmware.
///
/// Sent with every work submission so the chips select the right hashing
/// core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BoardAlgorithm {
    X11 = 0x01,
    X13 = 0x02,
    X14 = 0x03,
    X15 = 0x04,
    Quark = 0x05,
    Qubit = 0x06,
    MyriadGroestl = 0x07,
    Skein = 0x08,
    Nist5 = 0x09,
    Veltor = 0x0a,
    Blakecoin = 0x0b,
    Decred = 0x0c,
}

impl BoardAlgorithm {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for BoardAlgorithm {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use BoardAlgorithm::*;
        [
            X11,
            X13,
            X14,
            X15,
            Quark,
            Qubit,
            MyriadGroestl,
            Skein,
            Nist5,
            Veltor,
            Blakecoin,
            Decred,
        ]
        .into_iter()
        .find(|algo| *algo as u8 == value)
        .ok_or(value)
    }
}

/// Hashing and target collaborator bound to a board.
pub trait Algorithm: Send + Sync {
    /// Job reference the owner hands over with each work item.
    type Job: Send + Sync;

    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Identifier the board firmware uses for this algorithm, or `None` if
    /// the board cannot mine it.
    fn board_algorithm(&self) -> Option<BoardAlgorithm>;

    fn difficulty_for_target(&self, target: U256) -> Difficulty;

    /// Rebuild the block header a chip hashed for `nonce`.
    fn header_from_job(
        &self,
        job: &Self::Job,
        extranonce1: &[u8],
        extranonce2: &[u8],
        nonce: u32,
    ) -> Result<Bytes, AlgorithmError>;

    fn hash(&self, header: &[u8]) -> Hash256;

    fn difficulty_for_hash(&self, hash: &Hash256) -> Difficulty;

    /// Expected number of hashes needed to find shares worth `accepted`
    /// difficulty in total.
    fn estimated_hashes_for_shares(&self, accepted: Difficulty) -> f64;
}
