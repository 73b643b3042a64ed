//! Baikal USB hash boards.
//!
//! A [`BaikalBoard`] is the unit the scheduler talks to. It truncates the
//! network target for the chips, streams work to the device, and turns the
//! device's asynchronous replies into [`BoardEvent`]s.
//!
//! Boards communicate with their owner through an event channel rather than
//! callbacks. Shares are reported only when they beat the difficulty bound at
//! the time the result is processed; everything below that is dropped
//! silently.

mod baikal;
pub(crate) mod protocol;
pub mod target;

pub use baikal::BaikalBoard;
pub use target::TargetPair;

use std::sync::Arc;

use bytes::Bytes;
use tokio::time::Instant;

use crate::{algorithm::Hash256, types::Difficulty, u256::U256, work_log::WorkItem};

/// Prefix of every board identity string.
pub const BOARD_ID_PREFIX: &str = "BLKU";

/// Format the identity of board `board_id` on the given USB device.
pub fn board_identity(bus_number: u8, device_address: u8, board_id: u8) -> String {
    format!(
        "{}:{}:{}:{}",
        BOARD_ID_PREFIX, bus_number, device_address, board_id
    )
}

/// A nonce whose hash beat the board's difficulty bound.
#[derive(Debug, Clone)]
pub struct Share<J> {
    /// Identity of the board that found it
    pub board_id: String,
    pub block_header: Bytes,
    pub block_hash: Hash256,
    /// Difficulty of the hash itself, not the bound it beat
    pub difficulty: Difficulty,
    /// Full network target bound when the result was processed
    pub target: U256,
    pub nonce: u32,
    /// Work item the nonce was correlated with
    pub work: Arc<WorkItem<J>>,
}

/// Events emitted by a board during operation.
#[derive(Debug, Clone)]
pub enum BoardEvent<J> {
    /// A chip found a nonce meeting the current difficulty
    ShareFound(Share<J>),

    /// The device reported an unexpected reset or a new miner on its bus.
    /// Recovery is up to the owner.
    HardFault,
}

/// Mutable per-board record driven by device notifications.
#[derive(Debug, Clone)]
pub struct BoardState {
    pub firmware_version: Option<u8>,
    pub hardware_version: Option<u8>,
    /// Chip clock in MHz
    pub chip_clock: Option<u16>,
    pub chip_count: Option<u8>,
    pub chip_hardware_version: Option<u8>,
    /// Board temperature in °C
    pub temperature: Option<u8>,
    pub last_result_at: Option<Instant>,
    pub last_result_slot: Option<u8>,
    /// Sum of the difficulty bound credited for each accepted share
    pub accepted_difficulty: Difficulty,
    pub stats_started_at: Instant,
}

impl BoardState {
    pub fn new() -> Self {
        Self {
            firmware_version: None,
            hardware_version: None,
            chip_clock: None,
            chip_count: None,
            chip_hardware_version: None,
            temperature: None,
            last_result_at: None,
            last_result_slot: None,
            accepted_difficulty: Difficulty::ZERO,
            stats_started_at: Instant::now(),
        }
    }

    /// Restart the statistics window. Hardware fields are kept.
    pub fn clear_stats(&mut self) {
        self.stats_started_at = Instant::now();
        self.accepted_difficulty = Difficulty::ZERO;
    }

    /// Board hardware version, with the chips' version appended when the two
    /// disagree.
    pub fn hardware_version_display(&self) -> Option<String> {
        let board = self.hardware_version?;
        Some(match self.chip_hardware_version {
            Some(chip) if chip != board => format!("HW: {} ASIC: {}", board, chip),
            _ => board.to_string(),
        })
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}
