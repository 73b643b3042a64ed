//! Interpretation of device notifications.
//!
//! Each handler mutates the board's [`BoardState`] and, for results, decides
//! whether a reported nonce is a share. Handlers never fail: anything that
//! goes wrong while processing one message is logged and the board moves on
//! to the next.
//!
//! # Result correlation
//!
//! A result names only a work slot and a nonce. The slot is looked up in the
//! [`WorkLog`], the header is rebuilt from the stored job and extranonces,
//! and the hash difficulty is compared against the difficulty bound *now*,
//! which is not necessarily the bound in force when the work was sent.

use tokio::time::Instant;

use super::{BoardEvent, BoardState, Share, TargetPair};
use crate::{
    algorithm::Algorithm,
    config::StalenessPolicy,
    error::{Error, Result},
    tracing::prelude::*,
    transport::{InfoReport, ResultReport, ResultStatus, SendWorkEcho},
    work_log::WorkLog,
};

/// Everything a result handler reads besides the board state.
pub(crate) struct ResultContext<'a, A: Algorithm> {
    pub board_id: &'a str,
    pub algorithm: Option<&'a A>,
    pub target: Option<&'a TargetPair>,
    pub work_log: &'a WorkLog<A::Job>,
    pub staleness: StalenessPolicy,
}

/// Telemetry overwrites the identity and clock fields wholesale.
pub(crate) fn handle_info(state: &mut BoardState, report: &InfoReport) {
    state.firmware_version = Some(report.firmware_version);
    state.hardware_version = Some(report.hardware_version);
    state.chip_clock = Some(report.clock);
    state.chip_count = Some(report.asic_count);
    state.chip_hardware_version = Some(report.asic_version);

    debug!(
        firmware = report.firmware_version,
        hardware = report.hardware_version,
        clock_mhz = report.clock,
        chips = report.asic_count,
        asic = report.asic_version,
        "Board info"
    );
}

/// The echo carries the clock the chips are actually running at, which
/// supersedes the boot-time value from telemetry.
pub(crate) fn handle_send_work_echo(state: &mut BoardState, echo: &SendWorkEcho) {
    let clock = (echo.param as u16) << 1;
    if state.chip_clock != Some(clock) {
        trace!(clock_mhz = clock, "Chip clock changed");
    }
    state.chip_clock = Some(clock);
}

/// Process a result message. Returns the event to publish, if any.
///
/// Temperature is applied whatever the outcome.
pub(crate) fn handle_result<A: Algorithm>(
    ctx: &ResultContext<'_, A>,
    state: &mut BoardState,
    report: &ResultReport,
) -> Option<BoardEvent<A::Job>> {
    let event = match report.status {
        ResultStatus::NonceReady => match correlate_nonce(ctx, state, report) {
            Ok(share) => share.map(BoardEvent::ShareFound),
            Err(Error::LookupMiss { slot }) => {
                debug!(
                    board = ctx.board_id,
                    slot,
                    nonce = format!("{:#010x}", report.nonce),
                    "Could not find work for slot"
                );
                None
            }
            Err(e) => {
                warn!(
                    board = ctx.board_id,
                    slot = report.work_index,
                    error = %e,
                    "Failed to validate nonce"
                );
                None
            }
        },

        ResultStatus::JobEmpty => {
            trace!(board = ctx.board_id, "Board has no queued work");
            None
        }

        ResultStatus::NewMiner => {
            warn!(board = ctx.board_id, "Board reported a new miner");
            Some(BoardEvent::HardFault)
        }
    };

    state.temperature = Some(report.temperature);
    event
}

fn correlate_nonce<A: Algorithm>(
    ctx: &ResultContext<'_, A>,
    state: &mut BoardState,
    report: &ResultReport,
) -> Result<Option<Share<A::Job>>> {
    let slot = report.work_index;
    let work = ctx.work_log.get(slot).ok_or(Error::LookupMiss { slot })?;

    let now = Instant::now();
    let since_last = state
        .last_result_at
        .map(|at| now.duration_since(at))
        .unwrap_or_default();
    state.last_result_at = Some(now);
    state.last_result_slot = Some(slot);

    let slots_since = ctx.work_log.slots_since(slot);
    debug!(
        board = ctx.board_id,
        slot,
        cursor = ctx.work_log.cursor(),
        slots_since,
        since_last_ms = since_last.as_millis() as u64,
        "Nonce reported"
    );

    if ctx.staleness.is_stale(slots_since) {
        debug!(
            board = ctx.board_id,
            slot, slots_since, "Discarding result for stale work"
        );
        return Ok(None);
    }

    let algorithm = ctx.algorithm.ok_or(Error::AlgorithmNotSet)?;
    let target = ctx.target.ok_or(Error::TargetNotSet)?;

    let header = algorithm.header_from_job(
        &work.job,
        &work.extranonce1,
        &work.extranonce2,
        report.nonce,
    )?;
    let hash = algorithm.hash(&header);
    let share_difficulty = algorithm.difficulty_for_hash(&hash);

    if share_difficulty <= target.difficulty() {
        trace!(
            board = ctx.board_id,
            slot,
            nonce = format!("{:#010x}", report.nonce),
            hash_diff = %share_difficulty,
            target_diff = %target.difficulty(),
            "Nonce does not meet target (filtered)"
        );
        return Ok(None);
    }

    state.accepted_difficulty += target.difficulty();

    debug!(
        board = ctx.board_id,
        slot,
        nonce = format!("{:#010x}", report.nonce),
        hash = %hex::encode(hash),
        hash_diff = %share_difficulty,
        target_diff = %target.difficulty(),
        "Share found"
    );

    Ok(Some(Share {
        board_id: ctx.board_id.to_string(),
        block_header: header,
        block_hash: hash,
        difficulty: share_difficulty,
        target: target.full(),
        nonce: report.nonce,
        work: work.clone(),
    }))
}
