//! # Trivia Server Library
//!
//! This library implements a real-time elimination-trivia server: many
//! players connect, wait together for a full table, and then play
//! synchronized rounds of multiple-choice questions until a single winner
//! remains (or nobody does).
//!
//! ## Core Responsibilities
//!
//! ### Player Admission
//! Every new connection becomes a player proxy and joins the lobby. The
//! lobby releases players in arrival order, in batches of exactly the
//! configured size, and keeps everyone else informed about how many more
//! are needed. No player is ever dropped or seated twice.
//!
//! ### Session Orchestration
//! Each batch becomes one independent game session. A round broadcasts a
//! question to every active player, collects answers concurrently under a
//! single shared deadline, tabulates per-choice counts, reveals the correct
//! answer, and eliminates everyone who did not submit it. The game ends
//! when one player remains (winner) or none do (no winner).
//!
//! ### Failure Normalization
//! Timeouts, disconnects, and malformed replies are all absorbed at the
//! player-proxy boundary and become the same "no answer" outcome. The round
//! state machine never sees a per-player error; only a failing question
//! source can end a session early, and even that is contained to the one
//! session.
//!
//! ## Architecture Design
//!
//! ### Task Layout
//! One task per connection (socket pumps plus a parked handler waiting for
//! the engine to hand control back), one task per running session, and one
//! manager task that turns lobby batches into sessions. Session state is
//! owned by its session task alone; the lobby's waiting set is the only
//! state touched from many tasks and sits behind a single mutex.
//!
//! ### The Collection Barrier
//! Answer collection fans out one concurrent wait per active player, all
//! against the same wall-clock deadline, and joins on every one of them
//! before tabulating. A slow player never delays another's answer from
//! being recorded, and a disconnect cancels only that player's wait.
//!
//! ### Control Hand-Back
//! Connection handlers park on a one-shot completion signal owned by their
//! player proxy. When a session finishes a player (eliminated, winner, or
//! no-winner), the signal fires, the handler wakes, and the socket closes
//! after the final messages drain.
//!
//! ## Module Organization
//!
//! - [`player`] — the per-connection proxy and status lifecycle
//! - [`lobby`] — the waiting pool and batch release
//! - [`session`] — the round state machine and tally
//! - [`manager`] — the batch-to-session loop and connection registry
//! - [`question`] — pluggable question sources (HTTP API, static list)
//! - [`network`] — WebSocket accept loop and per-connection pumps
//! - [`error`] — the server error type
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::time::Duration;
//! use server::lobby::Lobby;
//! use server::manager::GameManager;
//! use server::network::WsServer;
//! use server::question::{OpenTdbSource, DEFAULT_QUESTION_API};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lobby = Arc::new(Lobby::new(2));
//!     let source = Arc::new(OpenTdbSource::new(DEFAULT_QUESTION_API)?);
//!     let manager = Arc::new(GameManager::new(lobby, source, Duration::from_secs(10)));
//!
//!     let server = WsServer::bind("127.0.0.1:9999").await?;
//!     let network = {
//!         let manager = Arc::clone(&manager);
//!         tokio::spawn(async move { server.run(manager).await })
//!     };
//!     manager.run().await;
//!     network.await??;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod lobby;
pub mod manager;
pub mod network;
pub mod player;
pub mod question;
pub mod session;
