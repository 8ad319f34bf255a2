//! Shared wire vocabulary for the trivia server and its clients.
//!
//! Everything that crosses the WebSocket boundary is defined here: the
//! question value, the JSON-RPC request/response frames, the typed parameter
//! shapes for each server-to-client method, and the canonical announcement
//! texts. The server and any client binary agree on these types so the
//! engine itself never touches raw JSON.

use serde::{Deserialize, Serialize};

/// JSON-RPC method name for informational broadcasts.
pub const METHOD_ANNOUNCEMENT: &str = "announcement";
/// JSON-RPC method name for distributing a round's question.
pub const METHOD_ASK_QUESTION: &str = "ask_question";
/// JSON-RPC method name for revealing the answer and per-choice counts.
pub const METHOD_ANSWERS: &str = "answers";

pub const MESSAGE_NETWORK_ERROR_OCCURRED: &str =
    "Network error encountered. Please try again later.";
pub const MESSAGE_CORRECT_MOVING_TO_NEXT_ROUND: &str =
    "Correct! You are moving to the next round!";
pub const MESSAGE_YOU_ARE_ELIMINATED: &str =
    "Did not receive a correct response! You have been eliminated from the game!";
pub const MESSAGE_YOU_ARE_THE_WINNER: &str = "Congratulations, you are the winner!";

/// Announcement sent to everyone still in the waiting pool.
pub fn waiting_for_players(needed: usize) -> String {
    format!("Waiting for {} more player(s) to join...", needed)
}

/// Announcement sent to survivors when the next round is about to start.
pub fn round_starting(round: u32) -> String {
    format!("Round {} is starting!", round)
}

/// One multiple-choice question used in a game round.
///
/// `choices` is ordered and index-addressed by the tally; `answer` is always
/// one of the listed choices. The full struct (answer included) is only sent
/// to clients after the round closes; while a round is open, clients see the
/// [`QuestionParams`] view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub choices: Vec<String>,
    pub answer: String,
}

impl Question {
    pub fn new(
        question: impl Into<String>,
        choices: Vec<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            choices,
            answer: answer.into(),
        }
    }

    /// The view of this question that is safe to send while a round is open.
    pub fn public_view(&self) -> QuestionParams {
        QuestionParams {
            question: self.question.clone(),
            choices: self.choices.clone(),
        }
    }

    pub fn is_correct(&self, candidate: &str) -> bool {
        self.answer == candidate
    }

    /// Index of `candidate` in the choice list, if it is a listed choice.
    pub fn choice_index(&self, candidate: &str) -> Option<usize> {
        self.choices.iter().position(|c| c == candidate)
    }
}

/// Params of an `ask_question` request: the question without its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionParams {
    pub question: String,
    pub choices: Vec<String>,
}

/// Params of an `announcement` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementParams {
    pub message: String,
}

/// Params of an `answers` request: the resolved question (answer included)
/// and the count of submissions per choice, aligned with `question.choices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswersParams {
    pub question: Question,
    pub choice_counts: Vec<usize>,
}

/// A server-to-client request frame, loosely following JSON-RPC 1.0.
///
/// Request ids increment per connection; clients echo them back in their
/// responses, though the server correlates answers to the most recent
/// `ask_question` rather than by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub method: String,
    pub params: serde_json::Value,
}

impl Request {
    pub fn new(id: u64, method: &str, params: impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            id,
            method: method.to_string(),
            params: serde_json::to_value(params)?,
        })
    }

    /// Decode the params back into their typed shape.
    pub fn params_as<T: for<'de> Deserialize<'de>>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.params.clone())
    }
}

/// A client-to-server response frame, loosely following JSON-RPC 1.0.
/// `result` carries the chosen answer string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

impl Response {
    pub fn answer(id: u64, answer: impl Into<String>) -> Self {
        Self {
            id: serde_json::Value::from(id),
            error: None,
            result: Some(answer.into()),
        }
    }
}

/// Extract the submitted answer from raw response text.
///
/// Returns `None` for anything that does not parse as a response frame or
/// that carries no result; callers treat that as "no answer".
pub fn parse_answer(text: &str) -> Option<String> {
    serde_json::from_str::<Response>(text).ok()?.result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question::new(
            "What is the tallest mountain on Earth?",
            vec![
                "K2".to_string(),
                "Mount Everest".to_string(),
                "Kangchenjunga".to_string(),
                "Lhotse".to_string(),
            ],
            "Mount Everest",
        )
    }

    #[test]
    fn test_public_view_strips_answer() {
        let q = question();
        let view = q.public_view();

        assert_eq!(view.question, q.question);
        assert_eq!(view.choices, q.choices);

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("\"answer\""));
    }

    #[test]
    fn test_choice_index() {
        let q = question();
        assert_eq!(q.choice_index("K2"), Some(0));
        assert_eq!(q.choice_index("Lhotse"), Some(3));
        assert_eq!(q.choice_index("Denali"), None);
    }

    #[test]
    fn test_is_correct() {
        let q = question();
        assert!(q.is_correct("Mount Everest"));
        assert!(!q.is_correct("K2"));
        assert!(!q.is_correct("mount everest"));
    }

    #[test]
    fn test_request_frame_shape() {
        let req = Request::new(
            1,
            METHOD_ANNOUNCEMENT,
            AnnouncementParams {
                message: "hello".to_string(),
            },
        )
        .unwrap();

        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"method":"announcement","params":{"message":"hello"}}"#
        );
    }

    #[test]
    fn test_request_params_roundtrip() {
        let req = Request::new(7, METHOD_ASK_QUESTION, question().public_view()).unwrap();
        let params: QuestionParams = req.params_as().unwrap();
        assert_eq!(params.choices.len(), 4);
    }

    #[test]
    fn test_parse_answer() {
        let answer = parse_answer(r#"{"id": 3, "error": null, "result": "Mount Everest"}"#);
        assert_eq!(answer, Some("Mount Everest".to_string()));
    }

    #[test]
    fn test_parse_answer_missing_result() {
        assert_eq!(parse_answer(r#"{"id": 3, "error": "boom"}"#), None);
        assert_eq!(
            parse_answer(r#"{"id": 3, "error": null, "result": null}"#),
            None
        );
    }

    #[test]
    fn test_parse_answer_malformed() {
        assert_eq!(parse_answer("not json at all"), None);
        assert_eq!(parse_answer(r#"{"result": 42}"#), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn test_waiting_announcement_counts() {
        assert_eq!(
            waiting_for_players(1),
            "Waiting for 1 more player(s) to join..."
        );
        assert_eq!(
            waiting_for_players(3),
            "Waiting for 3 more player(s) to join..."
        );
    }
}
