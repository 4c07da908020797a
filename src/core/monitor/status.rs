//! Health classification of HTTP status codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health level derived from a page's status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLevel {
    Healthy,
    Warning,
    Critical,
}

impl StatusLevel {
    /// `200` is healthy, `>= 500` is critical, everything else (including the
    /// `0` probe-failure sentinel) is a warning.
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => StatusLevel::Healthy,
            s if s >= 500 => StatusLevel::Critical,
            _ => StatusLevel::Warning,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            StatusLevel::Healthy => "🟢",
            StatusLevel::Warning => "🟡",
            StatusLevel::Critical => "🔴",
        }
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusLevel::Healthy => "healthy",
            StatusLevel::Warning => "warning",
            StatusLevel::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Emoji indicator for a status code
pub fn status_emoji(status: u16) -> &'static str {
    StatusLevel::from_status(status).emoji()
}
