use std::io;
use thiserror::Error;

/// Custom error type for pagewatch
#[derive(Error, Debug)]
pub enum PagewatchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for pagewatch
pub type Result<T> = std::result::Result<T, PagewatchError>;

impl PagewatchError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PagewatchError::Config(msg.into())
    }

    /// Create a Telegram API error
    pub fn telegram<S: Into<String>>(msg: S) -> Self {
        PagewatchError::Telegram(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PagewatchError::Other(msg.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, PagewatchError::Config(_))
    }
}
