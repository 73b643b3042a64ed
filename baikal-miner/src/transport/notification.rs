//! Decoded messages a Baikal USB device sends back to the host.
//!
//! The USB layer turns raw frames into these types and delivers them in
//! arrival order. One device hosts several boards, so every message names the
//! board it concerns; boards ignore messages addressed to their siblings.

/// Board telemetry, sent in reply to an info request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoReport {
    pub board_id: u8,
    pub firmware_version: u8,
    pub hardware_version: u8,
    /// Chip clock in MHz
    pub clock: u16,
    pub asic_count: u8,
    /// Hardware version reported by the chips themselves
    pub asic_version: u8,
}

/// Status byte of a result message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResultStatus {
    /// A nonce is available for the given work index
    NonceReady = 0x01,
    /// The board has no queued work
    JobEmpty = 0x02,
    /// The board restarted or a new miner appeared on the bus
    NewMiner = 0x03,
}

impl TryFrom<u8> for ResultStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            x if x == Self::NonceReady as u8 => Ok(Self::NonceReady),
            x if x == Self::JobEmpty as u8 => Ok(Self::JobEmpty),
            x if x == Self::NewMiner as u8 => Ok(Self::NewMiner),
            _ => Err(value),
        }
    }
}

/// Reply to a result request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultReport {
    pub board_id: u8,
    pub status: ResultStatus,
    /// Slot the nonce belongs to (meaningful only for `NonceReady`)
    pub work_index: u8,
    pub nonce: u32,
    /// Board temperature in °C
    pub temperature: u8,
}

/// Acknowledgement of a work submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendWorkEcho {
    pub board_id: u8,
    /// Running chip clock in units of 2 MHz
    pub param: u8,
}

/// Any message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Info(InfoReport),
    Result(ResultReport),
    SendWorkEcho(SendWorkEcho),
}

impl Notification {
    /// Board the message is addressed to.
    pub fn board_id(&self) -> u8 {
        match self {
            Notification::Info(report) => report.board_id,
            Notification::Result(report) => report.board_id,
            Notification::SendWorkEcho(echo) => echo.board_id,
        }
    }
}
