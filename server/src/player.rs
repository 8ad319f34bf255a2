//! Player proxy: the single point of message exchange with one client
//!
//! A [`Player`] wraps the pair of channels a connection handler sets up for
//! its socket, so the game session can talk to a client without knowing
//! anything about the transport or its failure modes. Outbound intents
//! become JSON-RPC request frames pushed onto the connection's write pump;
//! inbound answers arrive as plain strings. Every transport-level problem is
//! absorbed here and normalized: sends to a closed connection are no-ops,
//! and a timeout, disconnect, or garbled reply all collapse into the same
//! "no answer" outcome the round logic sees.
//!
//! The proxy also carries the single-use completion signal that the original
//! connection handler parks on; [`Player::finish`] fires it with a terminal
//! status, handing control of the socket back to that handler.

use log::{debug, warn};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use shared::{
    AnnouncementParams, AnswersParams, Question, Request, METHOD_ANNOUNCEMENT, METHOD_ANSWERS,
    METHOD_ASK_QUESTION,
};

/// Where a player currently stands in the engine.
///
/// `Eliminated`, `Winner`, and `NoWinner` are terminal: reaching one of them
/// releases the connection handler. `Disconnected` is observed mid-round and
/// is always followed by a terminal status from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Waiting,
    Active,
    Eliminated,
    Winner,
    NoWinner,
    Disconnected,
}

impl PlayerStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlayerStatus::Eliminated | PlayerStatus::Winner | PlayerStatus::NoWinner
        )
    }
}

/// Handle to a single remote player.
///
/// Exclusively owned by whichever component is responsible for the player at
/// the moment: the lobby while waiting, then exactly one game session.
#[derive(Debug)]
pub struct Player {
    id: u32,
    status: PlayerStatus,
    outbound: mpsc::UnboundedSender<Request>,
    answers: mpsc::UnboundedReceiver<String>,
    done: Option<oneshot::Sender<PlayerStatus>>,
    next_request_id: u64,
}

impl Player {
    /// Creates a proxy from a connection's channel pair.
    ///
    /// Returns the proxy and the receiving half of its completion signal;
    /// the connection handler awaits the receiver and closes the socket once
    /// it resolves.
    pub fn new(
        id: u32,
        outbound: mpsc::UnboundedSender<Request>,
        answers: mpsc::UnboundedReceiver<String>,
    ) -> (Self, oneshot::Receiver<PlayerStatus>) {
        let (done_tx, done_rx) = oneshot::channel();
        let player = Self {
            id,
            status: PlayerStatus::Waiting,
            outbound,
            answers,
            done: Some(done_tx),
            next_request_id: 1,
        };
        (player, done_rx)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    /// Marks the player as seated in a running game.
    pub fn set_active(&mut self) {
        self.status = PlayerStatus::Active;
    }

    pub fn is_disconnected(&self) -> bool {
        self.status == PlayerStatus::Disconnected
    }

    fn send_request(&mut self, method: &str, params: impl Serialize) {
        let id = self.next_request_id;
        self.next_request_id += 1;

        match Request::new(id, method, params) {
            // A closed connection makes this a no-op; the round logic never
            // needs to know.
            Ok(request) => {
                let _ = self.outbound.send(request);
            }
            Err(e) => {
                warn!(
                    "Player {}: failed to encode '{}' request: {}",
                    self.id, method, e
                );
            }
        }
    }

    /// Sends an informational announcement; no reply is expected.
    pub fn send_announcement(&mut self, message: &str) {
        self.send_request(
            METHOD_ANNOUNCEMENT,
            AnnouncementParams {
                message: message.to_string(),
            },
        );
    }

    /// Sends the round's question, stripped of its answer.
    pub fn send_question(&mut self, question: &Question) {
        self.send_request(METHOD_ASK_QUESTION, question.public_view());
    }

    /// Reveals the resolved question and the per-choice counts.
    pub fn send_answers(&mut self, question: &Question, choice_counts: &[usize]) {
        self.send_request(
            METHOD_ANSWERS,
            AnswersParams {
                question: question.clone(),
                choice_counts: choice_counts.to_vec(),
            },
        );
    }

    /// Throws away any replies still queued from an earlier round, so a late
    /// answer can never be credited to a question it was not given for.
    /// Called right before the next question goes out.
    pub fn discard_pending_answers(&mut self) {
        while let Ok(stale) = self.answers.try_recv() {
            debug!("Player {}: discarding late answer {:?}", self.id, stale);
        }
    }

    /// Waits for this player's next answer, bounded by `deadline`.
    ///
    /// Resolves to `Some(answer)` on a recognized reply, or `None` when the
    /// deadline passes or the connection closes. A closed connection also
    /// marks the proxy [`PlayerStatus::Disconnected`]; the session treats
    /// that exactly like a wrong answer but still attempts best-effort final
    /// sends.
    pub async fn await_answer(&mut self, deadline: Instant) -> Option<String> {
        match tokio::time::timeout_at(deadline, self.answers.recv()).await {
            Ok(Some(answer)) => Some(answer),
            Ok(None) => {
                debug!("Player {}: connection closed while waiting for answer", self.id);
                self.status = PlayerStatus::Disconnected;
                None
            }
            // Deadline elapsed without a reply
            Err(_) => None,
        }
    }

    /// Records a terminal status and releases the connection handler.
    ///
    /// The completion signal fires at most once; calling `finish` again only
    /// updates the status.
    pub fn finish(&mut self, status: PlayerStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        if let Some(done) = self.done.take() {
            // The handler may already be gone for disconnected players.
            let _ = done.send(status);
        }
    }
}
