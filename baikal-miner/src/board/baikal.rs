//! Baikal board coordinator.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::Instant;

use super::{
    board_identity,
    protocol::{self, ResultContext},
    BoardEvent, BoardState, TargetPair,
};
use crate::{
    algorithm::{Algorithm, BoardAlgorithm},
    config::BoardConfig,
    error::{Error, Result},
    tracing::prelude::*,
    transport::{Notification, Transport, TransportError},
    types::{Difficulty, HashRate},
    u256::U256,
    work_log::{WorkItem, WorkLog},
};

/// Theoretical kH/s each chip delivers per MHz of clock.
const KILOHASHES_PER_CHIP_MHZ: u64 = 500;

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// One hash board behind a Baikal USB device.
///
/// Owns the board's work log, target and state. All methods are meant to be
/// called from a single task per board; nothing here locks.
pub struct BaikalBoard<T, A: Algorithm> {
    id: String,
    board_id: u8,
    transport: Arc<T>,
    config: BoardConfig,
    algorithm: Option<Arc<A>>,
    target: Option<TargetPair>,
    work_log: WorkLog<A::Job>,
    state: BoardState,
    event_tx: mpsc::Sender<BoardEvent<A::Job>>,
    event_rx: Option<mpsc::Receiver<BoardEvent<A::Job>>>,
}

impl<T: Transport, A: Algorithm> BaikalBoard<T, A> {
    /// Create board `board_id` on the device behind `transport`.
    pub fn new(transport: Arc<T>, board_id: u8, config: BoardConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let id = board_identity(transport.bus_number(), transport.device_address(), board_id);

        Self {
            id,
            board_id,
            transport,
            config,
            algorithm: None,
            target: None,
            work_log: WorkLog::new(),
            state: BoardState::new(),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Take ownership of the event receiver for this board.
    ///
    /// Returns None if the receiver was already taken.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<BoardEvent<A::Job>>> {
        self.event_rx.take()
    }

    /// Bind the hashing collaborator. Must precede `set_target`.
    ///
    /// The current target is not converted again; call `set_target` after
    /// switching algorithms.
    pub fn set_algorithm(&mut self, algorithm: Arc<A>) {
        debug!(board = %self.id, algorithm = algorithm.name(), "Algorithm set");
        self.algorithm = Some(algorithm);
    }

    /// Bind a new network target, deriving board target and difficulty.
    pub fn set_target(&mut self, target: U256) -> Result<()> {
        let algorithm = self.algorithm.as_deref().ok_or(Error::AlgorithmNotSet)?;
        let pair = TargetPair::convert(algorithm, target);

        debug!(
            board = %self.id,
            target = %pair.full(),
            board_target = format!("{:#018x}", pair.board()),
            difficulty = %pair.difficulty(),
            "Target set"
        );
        self.target = Some(pair);
        Ok(())
    }

    /// Record `work` and send it to the device.
    ///
    /// Returns the slot the work was stored under. Transport failures are
    /// logged and otherwise ignored; the work stays in the log either way.
    pub async fn submit_work(&mut self, work: WorkItem<A::Job>) -> Result<u8> {
        let algorithm = self.algorithm.as_deref().ok_or(Error::AlgorithmNotSet)?;
        let board_algorithm = algorithm
            .board_algorithm()
            .ok_or_else(|| Error::UnsupportedAlgorithm(algorithm.name().to_string()))?;
        let board_target = self.target.as_ref().ok_or(Error::TargetNotSet)?.board();

        let work = Arc::new(work);
        let slot = self.work_log.push(Arc::clone(&work));

        if let Err(e) = self
            .send_work(slot, board_algorithm, board_target, &work.header_template)
            .await
        {
            warn!(board = %self.id, slot, error = %e, "Could not send work to device");
        } else {
            trace!(board = %self.id, slot, "Work sent");
        }

        Ok(slot)
    }

    async fn send_work(
        &self,
        slot: u8,
        algorithm: BoardAlgorithm,
        board_target: u64,
        header_template: &[u8],
    ) -> std::result::Result<(), TransportError> {
        self.transport
            .send_work(self.board_id, slot, algorithm, board_target, header_template)
            .await?;
        self.transport.request_result(self.board_id).await
    }

    /// Ask the device for telemetry; the reply arrives as a notification.
    pub async fn request_info(&self) -> Result<()> {
        Ok(self.transport.request_info(self.board_id).await?)
    }

    /// Set the board's cutoff temperature (°C) and fan speed (%).
    pub async fn set_option(&self, cutoff_temp: u8, fan_speed: u8) -> Result<()> {
        Ok(self
            .transport
            .set_option(self.board_id, cutoff_temp, fan_speed)
            .await?)
    }

    /// Push the configured cutoff temperature and fan speed to the device.
    pub async fn apply_config(&self) -> Result<()> {
        self.set_option(self.config.cutoff_temp, self.config.fan_speed)
            .await
    }

    /// Handle a message from the transport.
    ///
    /// Messages for other boards on the same device are ignored. Never fails;
    /// problems with individual messages are logged.
    pub async fn handle_notification(&mut self, notification: &Notification) {
        if notification.board_id() != self.board_id {
            return;
        }

        let event = match notification {
            Notification::Info(report) => {
                protocol::handle_info(&mut self.state, report);
                None
            }
            Notification::SendWorkEcho(echo) => {
                protocol::handle_send_work_echo(&mut self.state, echo);
                None
            }
            Notification::Result(report) => {
                let ctx = ResultContext {
                    board_id: &self.id,
                    algorithm: self.algorithm.as_deref(),
                    target: self.target.as_ref(),
                    work_log: &self.work_log,
                    staleness: self.config.staleness,
                };
                protocol::handle_result(&ctx, &mut self.state, report)
            }
        };

        // Must not wait on the owner: the backplane dispatches inline.
        if let Some(event) = event {
            match self.event_tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(board = %self.id, "Board event queue full, dropping event");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(board = %self.id, "Failed to send board event (owner gone)");
                }
            }
        }
    }

    /// Hashrate implied by accepted shares since the last `clear_stats`,
    /// truncated to whole kH/s.
    pub fn effective_hashrate(&self) -> HashRate {
        let Some(algorithm) = self.algorithm.as_deref() else {
            return HashRate::default();
        };

        let elapsed = Instant::now()
            .duration_since(self.state.stats_started_at)
            .as_secs_f64();
        if elapsed <= 0.0 {
            return HashRate::default();
        }

        let hashes = algorithm.estimated_hashes_for_shares(self.state.accepted_difficulty);
        HashRate::from_kilohashes((hashes / elapsed / 1000.0) as u64)
    }

    /// Theoretical hashrate from chip clock and count.
    pub fn raw_hashrate(&self) -> HashRate {
        let clock = self.state.chip_clock.unwrap_or(0) as u64;
        let chips = self.state.chip_count.unwrap_or(0) as u64;
        HashRate::from_kilohashes(clock * chips * KILOHASHES_PER_CHIP_MHZ)
    }

    /// Restart the statistics window.
    pub fn clear_stats(&mut self) {
        self.state.clear_stats();
    }

    /// Identity string, `BLKU:<bus>:<address>:<board>`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Board index on its USB device.
    pub fn board_id(&self) -> u8 {
        self.board_id
    }

    pub fn firmware_version(&self) -> Option<u8> {
        self.state.firmware_version
    }

    pub fn hardware_version(&self) -> Option<String> {
        self.state.hardware_version_display()
    }

    pub fn temperature(&self) -> Option<u8> {
        self.state.temperature
    }

    pub fn chip_count(&self) -> Option<u8> {
        self.state.chip_count
    }

    pub fn chip_clock(&self) -> Option<u16> {
        self.state.chip_clock
    }

    /// Difficulty of the bound target, if any.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.target.map(|t| t.difficulty())
    }

    pub fn target(&self) -> Option<&TargetPair> {
        self.target.as_ref()
    }

    pub fn algorithm(&self) -> Option<&Arc<A>> {
        self.algorithm.as_ref()
    }

    pub fn accepted_difficulty(&self) -> Difficulty {
        self.state.accepted_difficulty
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }
}
