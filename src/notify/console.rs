//! Local stand-ins for the chat bot: print to stdout, read commands from stdin.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::{CommandSource, Notifier, OperatorCommand};
use crate::Result;

pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, text: &str) {
        println!("{}", text);
    }
}

/// Reads `/status` and `/restart` (the slash is optional) from stdin
pub struct StdinCommandSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinCommandSource {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinCommandSource {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_console_line(line: &str) -> Option<OperatorCommand> {
    let trimmed = line.trim();
    if trimmed.starts_with('/') {
        OperatorCommand::parse(trimmed)
    } else {
        OperatorCommand::parse(&format!("/{}", trimmed))
    }
}

#[async_trait]
impl CommandSource for StdinCommandSource {
    async fn next_commands(&mut self) -> Result<Vec<OperatorCommand>> {
        loop {
            match self.lines.next_line().await? {
                Some(line) => {
                    if let Some(command) = parse_console_line(&line) {
                        return Ok(vec![command]);
                    }
                    if !line.trim().is_empty() {
                        log::info!("Unknown command '{}', expected status or restart", line.trim());
                    }
                }
                // stdin closed: no more commands will ever arrive
                None => std::future::pending::<()>().await,
            }
        }
    }
}
