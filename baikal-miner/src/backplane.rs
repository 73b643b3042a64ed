//! Notification routing for boards sharing one USB device.
//!
//! A Baikal USB device hosts several boards behind a single transport. The
//! USB layer delivers every decoded message into one channel; the backplane
//! drains it and hands each message to the board it addresses, one at a
//! time, so board state never needs locking.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    algorithm::Algorithm,
    board::BaikalBoard,
    tracing::prelude::*,
    transport::{Notification, Transport},
};

/// Boards on one USB device, keyed by board id.
pub struct Backplane<T, A: Algorithm> {
    boards: BTreeMap<u8, BaikalBoard<T, A>>,
}

impl<T: Transport, A: Algorithm> Backplane<T, A> {
    pub fn new() -> Self {
        Self {
            boards: BTreeMap::new(),
        }
    }

    /// Add a board, replacing any board already registered under its id.
    pub fn insert(&mut self, board: BaikalBoard<T, A>) -> Option<BaikalBoard<T, A>> {
        debug!(board = %board.id(), "Board attached");
        self.boards.insert(board.board_id(), board)
    }

    /// Detach a board, e.g. after a hard fault.
    pub fn remove(&mut self, board_id: u8) -> Option<BaikalBoard<T, A>> {
        self.boards.remove(&board_id)
    }

    pub fn board(&self, board_id: u8) -> Option<&BaikalBoard<T, A>> {
        self.boards.get(&board_id)
    }

    pub fn board_mut(&mut self, board_id: u8) -> Option<&mut BaikalBoard<T, A>> {
        self.boards.get_mut(&board_id)
    }

    pub fn boards_mut(&mut self) -> impl Iterator<Item = &mut BaikalBoard<T, A>> {
        self.boards.values_mut()
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// Deliver one notification to the board it addresses.
    pub async fn dispatch(&mut self, notification: &Notification) {
        match self.boards.get_mut(&notification.board_id()) {
            Some(board) => board.handle_notification(notification).await,
            None => trace!(
                board_id = notification.board_id(),
                "Notification for unknown board"
            ),
        }
    }

    /// Deliver notifications until the channel closes or `shutdown` fires.
    pub async fn run(
        &mut self,
        mut notifications: mpsc::Receiver<Notification>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Backplane shutting down");
                    break;
                }
                notification = notifications.recv() => match notification {
                    Some(notification) => self.dispatch(&notification).await,
                    None => {
                        debug!("Transport closed its notification channel");
                        break;
                    }
                },
            }
        }
    }
}

impl<T: Transport, A: Algorithm> Default for Backplane<T, A> {
    fn default() -> Self {
        Self::new()
    }
}
