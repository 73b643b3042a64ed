//! Host side of the Baikal USB link.
//!
//! Framing, bulk transfers and device enumeration belong to the USB layer.
//! Boards only see the [`Transport`] trait for outgoing commands and the
//! decoded [`Notification`]s that come back. A single transport handle is
//! shared by every board on the same USB device.

mod notification;

pub use notification::{InfoReport, Notification, ResultReport, ResultStatus, SendWorkEcho};

use async_trait::async_trait;
use thiserror::Error;

use crate::algorithm::BoardAlgorithm;

/// Errors reported by the USB layer.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device disconnected")]
    Disconnected,

    #[error("Transfer timed out")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

/// Commands a board can issue to its USB device.
///
/// Completing a call means the command was handed to the device, not that the
/// device acted on it; replies arrive later as notifications.
#[async_trait]
pub trait Transport: Send + Sync {
    /// USB bus the device sits on.
    fn bus_number(&self) -> u8;

    /// Address of the device on its bus.
    fn device_address(&self) -> u8;

    /// Ask a board for its telemetry. Answered by [`Notification::Info`].
    async fn request_info(&self, board_id: u8) -> Result<(), TransportError>;

    /// Configure a board's cutoff temperature (°C) and fan speed (%).
    async fn set_option(
        &self,
        board_id: u8,
        cutoff_temp: u8,
        fan_speed: u8,
    ) -> Result<(), TransportError>;

    /// Queue work on a board under `slot`. Answered by
    /// [`Notification::SendWorkEcho`].
    async fn send_work(
        &self,
        board_id: u8,
        slot: u8,
        algorithm: BoardAlgorithm,
        board_target: u64,
        header_template: &[u8],
    ) -> Result<(), TransportError>;

    /// Poll a board for a pending result. Answered by
    /// [`Notification::Result`].
    async fn request_result(&self, board_id: u8) -> Result<(), TransportError>;
}
