//! Error handling for the trivia server

use std::fmt;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, GameError>;

/// Server error types
///
/// Per-player failures (timeouts, disconnects, malformed replies) never show
/// up here; they are normalized to a "no answer" outcome at the player-proxy
/// boundary. These variants cover faults that end a whole session or the
/// server itself.
#[derive(Debug, Clone)]
pub enum GameError {
    /// Network-related errors (socket setup, accept loop)
    Network(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// The question source failed to produce a question
    QuestionSource(String),
    /// A session was started with an unusable player batch
    InvalidBatch(String),
    /// Server internal error
    Internal(String),
}

impl GameError {
    /// Create a network error
    pub fn network<T: Into<String>>(msg: T) -> Self {
        GameError::Network(msg.into())
    }

    /// Create a serialization error
    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        GameError::Serialization(msg.into())
    }

    /// Create a question source error
    pub fn question_source<T: Into<String>>(msg: T) -> Self {
        GameError::QuestionSource(msg.into())
    }

    /// Create an invalid batch error
    pub fn invalid_batch<T: Into<String>>(msg: T) -> Self {
        GameError::InvalidBatch(msg.into())
    }

    /// Create an internal error
    pub fn internal<T: Into<String>>(msg: T) -> Self {
        GameError::Internal(msg.into())
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Network(msg) => write!(f, "Network error: {}", msg),
            GameError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            GameError::QuestionSource(msg) => write!(f, "Question source error: {}", msg),
            GameError::InvalidBatch(msg) => write!(f, "Invalid batch: {}", msg),
            GameError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for GameError {}

impl From<std::io::Error> for GameError {
    fn from(err: std::io::Error) -> Self {
        GameError::Network(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for GameError {
    fn from(err: reqwest::Error) -> Self {
        GameError::QuestionSource(format!("HTTP error: {}", err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GameError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        GameError::Network(format!("WebSocket error: {}", err))
    }
}

impl From<tokio::task::JoinError> for GameError {
    fn from(err: tokio::task::JoinError) -> Self {
        GameError::Internal(format!("Task join error: {}", err))
    }
}
