//! Question sources for game rounds
//!
//! Where questions come from, and in what order, is a policy the engine
//! stays out of: a session just calls [`QuestionSource::next_question`] once
//! per round. The default source fetches one multiple-choice question per
//! call from an opentdb.com-compatible HTTP API; [`StaticSource`] serves a
//! fixed list round-robin for offline use and tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;
use rand::Rng;
use serde::Deserialize;
use tokio::time::Duration;

use shared::Question;

use crate::error::{GameError, Result};

/// Default question API: one easy multiple-choice question per request.
pub const DEFAULT_QUESTION_API: &str =
    "http://opentdb.com/api.php?amount=1&type=multiple&difficulty=easy";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future so sources stay object-safe behind `Arc<dyn QuestionSource>`.
pub type QuestionFuture<'a> = Pin<Box<dyn Future<Output = Result<Question>> + Send + 'a>>;

/// Supplier of the next round's question.
///
/// Implementations are free to randomize, cycle, or repeat; a failure aborts
/// only the session that asked.
pub trait QuestionSource: Send + Sync {
    fn next_question(&self) -> QuestionFuture<'_>;
}

/// Fetches questions from an opentdb.com-compatible trivia API.
pub struct OpenTdbSource {
    client: reqwest::Client,
    url: String,
}

impl OpenTdbSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl QuestionSource for OpenTdbSource {
    fn next_question(&self) -> QuestionFuture<'_> {
        Box::pin(async move {
            let response = self.client.get(&self.url).send().await?;
            if !response.status().is_success() {
                return Err(GameError::question_source(format!(
                    "received response {} from {}",
                    response.status(),
                    self.url
                )));
            }

            let body = response.text().await?;
            let question = parse_opentdb(&body)?;
            debug!("Fetched question: {}", question.question);
            Ok(question)
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenTdbResponse {
    results: Vec<OpenTdbResult>,
}

#[derive(Debug, Deserialize)]
struct OpenTdbResult {
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

/// Converts an opentdb JSON payload into a [`Question`], inserting the
/// correct answer at a random position among the incorrect ones so its index
/// carries no information.
pub fn parse_opentdb(json_text: &str) -> Result<Question> {
    let response: OpenTdbResponse = serde_json::from_str(json_text)?;
    let result = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GameError::question_source("question API returned no results"))?;

    if result.incorrect_answers.is_empty() {
        return Err(GameError::question_source(
            "question API returned no incorrect answers",
        ));
    }

    let mut choices = result.incorrect_answers;
    let index = rand::thread_rng().gen_range(0..=choices.len());
    choices.insert(index, result.correct_answer.clone());

    Ok(Question::new(result.question, choices, result.correct_answer))
}

/// Serves a fixed question list, cycling in order.
pub struct StaticSource {
    questions: Vec<Question>,
    cursor: AtomicUsize,
}

impl StaticSource {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl QuestionSource for StaticSource {
    fn next_question(&self) -> QuestionFuture<'_> {
        Box::pin(async move {
            if self.questions.is_empty() {
                return Err(GameError::question_source("static question list is empty"));
            }
            let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.questions.len();
            Ok(self.questions[index].clone())
        })
    }
}
