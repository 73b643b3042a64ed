//! Deterministic collaborators for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    algorithm::{Algorithm, AlgorithmError, BoardAlgorithm, Hash256},
    transport::{
        InfoReport, Notification, ResultReport, ResultStatus, SendWorkEcho, Transport,
        TransportError,
    },
    types::Difficulty,
    u256::U256,
};

/// Target that [`TestAlgorithm`] maps to difficulty 1 (2^224).
pub const DIFF1_TARGET: U256 = U256::from_limbs([0, 0, 0, 1 << 32]);

/// Job id that makes [`TestAlgorithm::header_from_job`] fail.
pub const BROKEN_JOB: u32 = u32::MAX;

/// Algorithm whose share difficulty equals the nonce.
///
/// Headers are `job || en1 || en2 || nonce` and the "hash" carries the nonce
/// in its first four bytes, so a test picks the share difficulty simply by
/// choosing the nonce it reports.
pub struct TestAlgorithm;

impl Algorithm for TestAlgorithm {
    type Job = u32;

    fn name(&self) -> &str {
        "test"
    }

    fn board_algorithm(&self) -> Option<BoardAlgorithm> {
        Some(BoardAlgorithm::X11)
    }

    fn difficulty_for_target(&self, target: U256) -> Difficulty {
        if target.is_zero() {
            return Difficulty::new(f64::MAX);
        }
        Difficulty::new((DIFF1_TARGET / target).saturating_to_u64() as f64)
    }

    fn header_from_job(
        &self,
        job: &u32,
        extranonce1: &[u8],
        extranonce2: &[u8],
        nonce: u32,
    ) -> Result<Bytes, AlgorithmError> {
        if *job == BROKEN_JOB {
            return Err(AlgorithmError(format!("job {} has no coinbase", job)));
        }
        let mut header = BytesMut::new();
        header.put_u32_le(*job);
        header.put_slice(extranonce1);
        header.put_slice(extranonce2);
        header.put_u32_le(nonce);
        Ok(header.freeze())
    }

    fn hash(&self, header: &[u8]) -> Hash256 {
        let mut hash = [0u8; 32];
        let nonce_at = header.len().saturating_sub(4);
        hash[..4].copy_from_slice(&header[nonce_at..]);
        hash
    }

    fn difficulty_for_hash(&self, hash: &Hash256) -> Difficulty {
        Difficulty::new(u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]]) as f64)
    }

    fn estimated_hashes_for_shares(&self, accepted: Difficulty) -> f64 {
        accepted.as_f64() * 4_294_967_296.0
    }
}

/// Algorithm the board firmware cannot run.
pub struct UnsupportedAlgorithm;

impl Algorithm for UnsupportedAlgorithm {
    type Job = u32;

    fn name(&self) -> &str {
        "sha256d"
    }

    fn board_algorithm(&self) -> Option<BoardAlgorithm> {
        None
    }

    fn difficulty_for_target(&self, _target: U256) -> Difficulty {
        Difficulty::new(1.0)
    }

    fn header_from_job(
        &self,
        _job: &u32,
        _extranonce1: &[u8],
        _extranonce2: &[u8],
        _nonce: u32,
    ) -> Result<Bytes, AlgorithmError> {
        Err(AlgorithmError("unsupported".into()))
    }

    fn hash(&self, _header: &[u8]) -> Hash256 {
        [0xff; 32]
    }

    fn difficulty_for_hash(&self, _hash: &Hash256) -> Difficulty {
        Difficulty::ZERO
    }

    fn estimated_hashes_for_shares(&self, _accepted: Difficulty) -> f64 {
        0.0
    }
}

/// A command recorded by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RequestInfo {
        board_id: u8,
    },
    SetOption {
        board_id: u8,
        cutoff_temp: u8,
        fan_speed: u8,
    },
    SendWork {
        board_id: u8,
        slot: u8,
        algorithm: BoardAlgorithm,
        board_target: u64,
        header_template: Vec<u8>,
    },
    RequestResult {
        board_id: u8,
    },
}

/// Transport that records commands and optionally fails them.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    fail: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            Err(TransportError::Disconnected)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn bus_number(&self) -> u8 {
        1
    }

    fn device_address(&self) -> u8 {
        12
    }

    async fn request_info(&self, board_id: u8) -> Result<(), TransportError> {
        self.record(Call::RequestInfo { board_id })
    }

    async fn set_option(
        &self,
        board_id: u8,
        cutoff_temp: u8,
        fan_speed: u8,
    ) -> Result<(), TransportError> {
        self.record(Call::SetOption {
            board_id,
            cutoff_temp,
            fan_speed,
        })
    }

    async fn send_work(
        &self,
        board_id: u8,
        slot: u8,
        algorithm: BoardAlgorithm,
        board_target: u64,
        header_template: &[u8],
    ) -> Result<(), TransportError> {
        self.record(Call::SendWork {
            board_id,
            slot,
            algorithm,
            board_target,
            header_template: header_template.to_vec(),
        })
    }

    async fn request_result(&self, board_id: u8) -> Result<(), TransportError> {
        self.record(Call::RequestResult { board_id })
    }
}

pub fn nonce_ready(board_id: u8, work_index: u8, nonce: u32, temperature: u8) -> Notification {
    Notification::Result(ResultReport {
        board_id,
        status: ResultStatus::NonceReady,
        work_index,
        nonce,
        temperature,
    })
}

pub fn status(board_id: u8, status: ResultStatus, temperature: u8) -> Notification {
    Notification::Result(ResultReport {
        board_id,
        status,
        work_index: 0,
        nonce: 0,
        temperature,
    })
}

pub fn info(board_id: u8) -> Notification {
    Notification::Info(InfoReport {
        board_id,
        firmware_version: 0x11,
        hardware_version: 2,
        clock: 300,
        asic_count: 16,
        asic_version: 2,
    })
}

pub fn echo(board_id: u8, param: u8) -> Notification {
    Notification::SendWorkEcho(SendWorkEcho { board_id, param })
}
