//! Error types for board operations.

use thiserror::Error;

use crate::{algorithm::AlgorithmError, transport::TransportError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No algorithm set, set algorithm first")]
    AlgorithmNotSet,

    #[error("No target set, set target first")]
    TargetNotSet,

    #[error("Algorithm {0} is not supported by the board")]
    UnsupportedAlgorithm(String),

    #[error("No work recorded for slot {slot}")]
    LookupMiss { slot: u8 },

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Header reconstruction failed: {0}")]
    Algorithm(#[from] AlgorithmError),
}

impl Error {
    /// Whether this error stems from a missing or invalid binding rather
    /// than from device traffic.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::AlgorithmNotSet
                | Error::TargetNotSet
                | Error::UnsupportedAlgorithm(_)
        )
    }
}
