//! Admission pool for connected players waiting to be seated
//!
//! New connections land here in arrival order. The pool releases players in
//! batches of exactly the configured quorum, never splitting a player across
//! batches and never dropping one. All mutation of the waiting set happens
//! under a single mutex, since admissions race in from every connection
//! handler at once.

use std::collections::VecDeque;

use log::debug;
use tokio::sync::{Mutex, Notify};

use shared::waiting_for_players;

use crate::player::Player;

/// Holds connected-but-unseated players until a quorum accumulates.
pub struct Lobby {
    /// Players required to start a session
    quorum: usize,
    /// Waiting players in arrival order
    waiting: Mutex<VecDeque<Player>>,
    /// Wakes the manager loop when an admission may have completed a batch
    ready: Notify,
}

impl Lobby {
    pub fn new(quorum: usize) -> Self {
        assert!(quorum > 0, "quorum must be at least 1");
        Self {
            quorum,
            waiting: Mutex::new(VecDeque::new()),
            ready: Notify::new(),
        }
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Adds a player to the waiting set.
    ///
    /// While the pool is still short of quorum, every waiting player (the
    /// new arrival included) is told how many more are needed. Repeats of
    /// that announcement across admissions are expected.
    pub async fn admit(&self, player: Player) {
        let mut waiting = self.waiting.lock().await;
        debug!(
            "Player {} admitted to the waiting pool ({} waiting)",
            player.id(),
            waiting.len() + 1
        );
        waiting.push_back(player);

        if waiting.len() < self.quorum {
            let message = waiting_for_players(self.quorum - waiting.len());
            for player in waiting.iter_mut() {
                player.send_announcement(&message);
            }
        }
        drop(waiting);

        self.ready.notify_one();
    }

    /// Removes and returns the first quorum-many players, if that many are
    /// waiting. Players beyond the quorum stay queued for the next batch.
    pub async fn try_release_batch(&self) -> Option<Vec<Player>> {
        let mut waiting = self.waiting.lock().await;
        if waiting.len() < self.quorum {
            return None;
        }
        Some(waiting.drain(..self.quorum).collect())
    }

    /// Waits until a full batch can be released.
    ///
    /// Suspends on admissions rather than polling; the `Notify` permit means
    /// an admission that lands between the check and the wait is not lost.
    pub async fn next_batch(&self) -> Vec<Player> {
        loop {
            if let Some(batch) = self.try_release_batch().await {
                return batch;
            }
            self.ready.notified().await;
        }
    }

    pub async fn waiting_count(&self) -> usize {
        self.waiting.lock().await.len()
    }
}
