//! Game manager: ties connections, the lobby, and sessions together
//!
//! One manager task runs for the server's lifetime. It pulls full batches
//! out of the lobby and launches each one as an independent session task,
//! then immediately goes back for the next batch; admission never waits for
//! a game to end. A session failing (or panicking) is logged from its own
//! task and affects nothing else.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{error, info};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Duration;

use shared::Request;

use crate::lobby::Lobby;
use crate::player::{Player, PlayerStatus};
use crate::question::QuestionSource;
use crate::session::GameSession;

pub struct GameManager {
    lobby: Arc<Lobby>,
    source: Arc<dyn QuestionSource>,
    round_duration: Duration,
    next_player_id: AtomicU32,
    next_game_id: AtomicU32,
}

impl GameManager {
    pub fn new(lobby: Arc<Lobby>, source: Arc<dyn QuestionSource>, round_duration: Duration) -> Self {
        Self {
            lobby,
            source,
            round_duration,
            next_player_id: AtomicU32::new(1),
            next_game_id: AtomicU32::new(1),
        }
    }

    pub fn lobby(&self) -> &Arc<Lobby> {
        &self.lobby
    }

    /// Builds a player proxy around a connection's channel pair and admits
    /// it to the lobby.
    ///
    /// Returns the player id and the completion signal the connection
    /// handler parks on; it resolves with the player's terminal status once
    /// the engine is done with them.
    pub async fn register(
        &self,
        outbound: mpsc::UnboundedSender<Request>,
        answers: mpsc::UnboundedReceiver<String>,
    ) -> (u32, oneshot::Receiver<PlayerStatus>) {
        let id = self.next_player_id.fetch_add(1, Ordering::Relaxed);
        let (player, done) = Player::new(id, outbound, answers);
        self.lobby.admit(player).await;
        (id, done)
    }

    /// Launches sessions for as long as the server runs.
    pub async fn run(&self) {
        loop {
            let batch = self.lobby.next_batch().await;
            let game_id = self.next_game_id.fetch_add(1, Ordering::Relaxed);
            info!("Starting game {} with {} player(s)", game_id, batch.len());

            let session = GameSession::new(
                game_id,
                batch,
                Arc::clone(&self.source),
                self.round_duration,
            );
            tokio::spawn(async move {
                // Contained here: one broken game must not touch the others
                match session.run().await {
                    Ok(outcome) => info!("Game {} ended: {:?}", game_id, outcome),
                    Err(e) => error!("Game {} failed: {}", game_id, e),
                }
            });
        }
    }
}
