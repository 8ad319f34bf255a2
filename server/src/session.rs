//! Game session: the round state machine for one batch of players
//!
//! A session owns its players outright from the moment the lobby releases
//! them until each one reaches a terminal status. Each round walks the same
//! path: fetch a question, send it to every active player, collect answers
//! concurrently under one shared deadline, tabulate, reveal, eliminate, and
//! decide whether the game continues. The active set only ever shrinks.
//!
//! The collection step is the part that has to be right: every player's wait
//! runs concurrently against the same wall-clock deadline, and the round
//! joins on *all* of them before tabulating. A slow or vanished player costs
//! the round nothing beyond the deadline itself and can never stall the
//! others out of having their answers recorded.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::time::{Duration, Instant};

use shared::{
    round_starting, Question, MESSAGE_CORRECT_MOVING_TO_NEXT_ROUND,
    MESSAGE_NETWORK_ERROR_OCCURRED, MESSAGE_YOU_ARE_ELIMINATED, MESSAGE_YOU_ARE_THE_WINNER,
};

use crate::error::{GameError, Result};
use crate::player::{Player, PlayerStatus};
use crate::question::QuestionSource;

/// How a completed session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Exactly one player survived; carries the winner's id.
    Winner(u32),
    /// Every remaining player was eliminated in the same round.
    NoWinner,
}

/// Per-round answer counts, computed before any elimination.
///
/// `per_choice` is aligned with the question's choice list and is what goes
/// out on the wire; submissions matching no listed choice land in
/// `no_answer` together with timeouts and disconnects, so the buckets always
/// add up to the number of players active at round start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTally {
    pub per_choice: Vec<usize>,
    pub no_answer: usize,
}

impl RoundTally {
    pub fn tabulate<'a>(
        question: &Question,
        submissions: impl Iterator<Item = Option<&'a str>>,
    ) -> Self {
        let mut per_choice = vec![0; question.choices.len()];
        let mut no_answer = 0;

        for submission in submissions {
            match submission.and_then(|answer| question.choice_index(answer)) {
                Some(index) => per_choice[index] += 1,
                None => no_answer += 1,
            }
        }

        Self {
            per_choice,
            no_answer,
        }
    }

    pub fn total(&self) -> usize {
        self.per_choice.iter().sum::<usize>() + self.no_answer
    }
}

/// One running game: a batch of players and a round counter.
pub struct GameSession {
    game_id: u32,
    players: Vec<Player>,
    current_round: u32,
    round_duration: Duration,
    source: Arc<dyn QuestionSource>,
}

impl GameSession {
    pub fn new(
        game_id: u32,
        mut players: Vec<Player>,
        source: Arc<dyn QuestionSource>,
        round_duration: Duration,
    ) -> Self {
        for player in &mut players {
            player.set_active();
        }
        Self {
            game_id,
            players,
            current_round: 0,
            round_duration,
            source,
        }
    }

    /// Drives rounds until the game produces an outcome.
    ///
    /// On a round failure (question source down, collection task lost) the
    /// session aborts: remaining players hear about the problem, everyone is
    /// released, and the error is returned to the session task. Nothing
    /// escapes past that task.
    pub async fn run(mut self) -> Result<SessionOutcome> {
        if self.players.is_empty() {
            return Err(GameError::invalid_batch(format!(
                "game {} started with an empty batch",
                self.game_id
            )));
        }

        info!(
            "Game {} starting with {} player(s)",
            self.game_id,
            self.players.len()
        );

        let outcome = loop {
            match self.execute_next_round().await {
                Ok(None) => continue,
                Ok(Some(outcome)) => break outcome,
                Err(e) => {
                    warn!("Game {} aborting after error: {}", self.game_id, e);
                    self.abort();
                    return Err(e);
                }
            }
        };

        info!("Game {} finished: {:?}", self.game_id, outcome);
        Ok(outcome)
    }

    /// Plays one full round. Returns `None` while the game continues, or the
    /// final outcome once 0 or 1 players remain.
    async fn execute_next_round(&mut self) -> Result<Option<SessionOutcome>> {
        self.current_round += 1;
        let question = self.source.next_question().await?;

        debug!(
            "Game {} round {}: asking {} player(s)",
            self.game_id,
            self.current_round,
            self.players.len()
        );

        // Question distribution: every send is issued before the round clock
        // starts, and replies parked since the previous round are dropped.
        let announcement = round_starting(self.current_round);
        for player in &mut self.players {
            player.send_announcement(&announcement);
            player.discard_pending_answers();
            player.send_question(&question);
        }

        // Collection: one deadline, shared by every player in the round.
        let deadline = Instant::now() + self.round_duration;
        let submissions = self.collect_answers(deadline).await?;

        // Tabulation covers everyone who was active at round start.
        let tally = RoundTally::tabulate(
            &question,
            submissions.iter().map(|(_, answer)| answer.as_deref()),
        );
        debug_assert_eq!(tally.total(), submissions.len());

        // Reveal: the same counts go to every player, whatever their fate,
        // including best-effort sends to the already-disconnected.
        let mut submissions = submissions;
        for (player, _) in &mut submissions {
            player.send_answers(&question, &tally.per_choice);
        }

        // Elimination: anything but the correct choice ends the player's run.
        let mut survivors = Vec::with_capacity(submissions.len());
        for (mut player, answer) in submissions {
            match answer {
                Some(ref choice) if question.is_correct(choice) => survivors.push(player),
                _ => {
                    debug!(
                        "Game {} round {}: player {} eliminated",
                        self.game_id,
                        self.current_round,
                        player.id()
                    );
                    player.send_announcement(MESSAGE_YOU_ARE_ELIMINATED);
                    player.finish(PlayerStatus::Eliminated);
                }
            }
        }
        self.players = survivors;

        match self.players.len() {
            0 => Ok(Some(SessionOutcome::NoWinner)),
            1 => {
                let winner = &mut self.players[0];
                winner.send_announcement(MESSAGE_YOU_ARE_THE_WINNER);
                winner.finish(PlayerStatus::Winner);
                let winner_id = winner.id();
                self.players.clear();
                Ok(Some(SessionOutcome::Winner(winner_id)))
            }
            _ => {
                for player in &mut self.players {
                    player.send_announcement(MESSAGE_CORRECT_MOVING_TO_NEXT_ROUND);
                }
                Ok(None)
            }
        }
    }

    /// Fans out one concurrent wait per player against `deadline` and joins
    /// on all of them. This barrier is what makes the tally trustworthy: no
    /// answer is counted until every player has answered, timed out, or
    /// dropped, and a disconnect cancels only that player's wait.
    async fn collect_answers(&mut self, deadline: Instant) -> Result<Vec<(Player, Option<String>)>> {
        let mut waits = Vec::with_capacity(self.players.len());
        for mut player in self.players.drain(..) {
            waits.push(tokio::spawn(async move {
                let answer = player.await_answer(deadline).await;
                (player, answer)
            }));
        }

        let mut submissions = Vec::with_capacity(waits.len());
        for wait in waits {
            submissions.push(wait.await?);
        }
        Ok(submissions)
    }

    /// Best-effort teardown when a round fails: tell everyone, release
    /// everyone. Players finish as no-winner so their connection handlers
    /// always unblock.
    fn abort(&mut self) {
        for player in &mut self.players {
            player.send_announcement(MESSAGE_NETWORK_ERROR_OCCURRED);
            player.finish(PlayerStatus::NoWinner);
        }
        self.players.clear();
    }
}
