//! Outbound notifications and inbound operator commands.

mod console;
mod telegram;

pub use console::{ConsoleNotifier, StdinCommandSource};
pub use telegram::{TelegramCommandSource, TelegramNotifier};

use async_trait::async_trait;
use std::fmt;

use crate::Result;

/// Delivers text to the operator channel.
///
/// Delivery is best-effort: implementations log failures instead of returning them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str);
}

/// Produces operator commands, waiting until at least one batch arrives.
#[async_trait]
pub trait CommandSource: Send {
    async fn next_commands(&mut self) -> Result<Vec<OperatorCommand>>;
}

/// Commands an operator can issue from the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Status,
    Restart,
}

impl OperatorCommand {
    /// Parse `/status` or `/restart`, optionally addressed as `/status@SomeBot`.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let command = first.strip_prefix('/')?;
        let name = command.split('@').next().unwrap_or(command);

        match name {
            "status" => Some(OperatorCommand::Status),
            "restart" => Some(OperatorCommand::Restart),
            _ => None,
        }
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorCommand::Status => f.write_str("status"),
            OperatorCommand::Restart => f.write_str("restart"),
        }
    }
}
