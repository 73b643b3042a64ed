//! Correlation of device results with dispatched work.
//!
//! Baikal boards echo an 8-bit work index with every nonce they report.
//! [`WorkLog`] keeps a snapshot of each work item sent under that index so a
//! nonce can be matched back to the job and extranonces that produced it.
//! Results may arrive out of order and long after submission; once 255 newer
//! submissions have been made the slot is reused and the old snapshot is gone.

use std::sync::Arc;

use bytes::Bytes;

/// Number of work slots the board firmware addresses.
pub const WORK_LOG_CAPACITY: usize = 255;

/// Snapshot of a unit of work sent to a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem<J> {
    /// Job reference supplied by the owner
    pub job: J,
    /// Pool-assigned extranonce prefix
    pub extranonce1: Bytes,
    /// Extranonce chosen for this submission
    pub extranonce2: Bytes,
    /// Header the chips hash, nonce field left for the device to fill
    pub header_template: Bytes,
}

/// Fixed-size ring of the most recent work items, indexed by slot.
pub struct WorkLog<J> {
    slots: Box<[Option<Arc<WorkItem<J>>>; WORK_LOG_CAPACITY]>,
    cursor: u8,
}

impl<J> WorkLog<J> {
    pub fn new() -> Self {
        Self {
            slots: Box::new(std::array::from_fn(|_| None)),
            cursor: 0,
        }
    }

    /// Store `work` at the cursor and return the slot used.
    pub fn push(&mut self, work: Arc<WorkItem<J>>) -> u8 {
        let slot = self.cursor;
        self.slots[slot as usize] = Some(work);
        self.cursor = ((slot as usize + 1) % WORK_LOG_CAPACITY) as u8;
        slot
    }

    /// Current occupant of `slot`, if it was ever written.
    pub fn get(&self, slot: u8) -> Option<&Arc<WorkItem<J>>> {
        self.slots.get(slot as usize).and_then(|w| w.as_ref())
    }

    /// Slot the next push will write.
    pub fn cursor(&self) -> u8 {
        self.cursor
    }

    /// Circular distance from `slot` forward to the cursor.
    ///
    /// 1 means `slot` holds the newest submission; 0 means it is the next one
    /// to be overwritten.
    pub fn slots_since(&self, slot: u8) -> u8 {
        ((self.cursor as usize + WORK_LOG_CAPACITY - slot as usize % WORK_LOG_CAPACITY)
            % WORK_LOG_CAPACITY) as u8
    }
}

impl<J> Default for WorkLog<J> {
    fn default() -> Self {
        Self::new()
    }
}
