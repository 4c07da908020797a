//! Locale-keyed message templates.
//!
//! Templates contain `{{name}}` placeholders that are replaced literally.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::core::monitor::{status_emoji, ChangeEvent, PageSnapshot};
use crate::error::{PagewatchError, Result};

/// Kinds of messages the monitor sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    MonitoringStarted,
    CommandStatus,
    StatusEntry,
    StatusChange,
    BlockCountChange,
    Restart,
    RestartFailed,
}

impl MessageKind {
    pub const ALL: [MessageKind; 7] = [
        MessageKind::MonitoringStarted,
        MessageKind::CommandStatus,
        MessageKind::StatusEntry,
        MessageKind::StatusChange,
        MessageKind::BlockCountChange,
        MessageKind::Restart,
        MessageKind::RestartFailed,
    ];

    /// Key used in the messages file
    pub fn key(&self) -> &'static str {
        match self {
            MessageKind::MonitoringStarted => "monitoring_started",
            MessageKind::CommandStatus => "command_status",
            MessageKind::StatusEntry => "status_entry",
            MessageKind::StatusChange => "status_change",
            MessageKind::BlockCountChange => "block_count_change",
            MessageKind::Restart => "restart",
            MessageKind::RestartFailed => "restart_failed",
        }
    }

    /// Built-in English template used when the locale has no entry
    pub fn default_template(&self) -> &'static str {
        match self {
            MessageKind::MonitoringStarted => "Monitoring started",
            MessageKind::CommandStatus => "Current status:",
            MessageKind::StatusEntry => "{{emoji}} {{url}} - status {{status}}, blocks {{block_count}}",
            MessageKind::StatusChange => "{{url}} status changed: {{old_status}} -> {{new_status}}",
            MessageKind::BlockCountChange => {
                "{{url}} block count changed: {{old_blocks}} -> {{new_blocks}}"
            }
            MessageKind::Restart => "Restarting monitoring...",
            MessageKind::RestartFailed => "Restart failed, keeping previous configuration",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Replace every `{{key}}` in `template` with its value.
///
/// Placeholders without a replacement are left as-is.
pub fn format_message(template: &str, replacements: &[(&str, String)]) -> String {
    let mut message = template.to_string();
    for (key, value) in replacements {
        message = message.replace(&format!("{{{{{}}}}}", key), value);
    }
    message
}

/// All templates, keyed by locale then by message kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageCatalog {
    locales: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            PagewatchError::config(format!(
                "Failed to read messages file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&data).map_err(|e| {
            PagewatchError::config(format!(
                "Failed to parse messages file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn insert(&mut self, locale: &str, kind: MessageKind, template: &str) {
        self.locales
            .entry(locale.to_string())
            .or_default()
            .insert(kind.key().to_string(), template.to_string());
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.contains_key(locale)
    }

    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.locales.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    /// Template for `kind` in `locale`, falling back to the built-in default.
    pub fn template(&self, locale: &str, kind: MessageKind) -> &str {
        self.locales
            .get(locale)
            .and_then(|templates| templates.get(kind.key()))
            .map(String::as_str)
            .unwrap_or_else(|| {
                log::debug!("No '{}' template for locale '{}', using default", kind, locale);
                kind.default_template()
            })
    }

    pub fn render(&self, locale: &str, kind: MessageKind, replacements: &[(&str, String)]) -> String {
        format_message(self.template(locale, kind), replacements)
    }

    /// Text sent for a detected change on `base_url + page_id`.
    pub fn render_event(&self, locale: &str, base_url: &str, event: &ChangeEvent) -> String {
        let url = format!("{}{}", base_url, event.page_id());
        match event {
            ChangeEvent::StatusChanged {
                old_status,
                new_status,
                level,
                ..
            } => {
                let body = self.render(
                    locale,
                    MessageKind::StatusChange,
                    &[
                        ("emoji", level.emoji().to_string()),
                        ("url", url),
                        ("old_status", old_status.to_string()),
                        ("new_status", new_status.to_string()),
                    ],
                );
                format!("{} {}", level.emoji(), body)
            }
            ChangeEvent::BlockCountChanged {
                old_count,
                new_count,
                ..
            } => self.render(
                locale,
                MessageKind::BlockCountChange,
                &[
                    ("url", url),
                    ("old_blocks", old_count.to_string()),
                    ("new_blocks", new_count.to_string()),
                ],
            ),
        }
    }

    /// Status report: a header line followed by one entry per page.
    pub fn render_status_report(
        &self,
        locale: &str,
        base_url: &str,
        snapshots: &[(String, PageSnapshot)],
    ) -> String {
        let mut report = self.render(locale, MessageKind::CommandStatus, &[]);
        report.push('\n');

        for (page_id, snapshot) in snapshots {
            let status = snapshot.sample.status_code;
            let entry = self.render(
                locale,
                MessageKind::StatusEntry,
                &[
                    ("emoji", status_emoji(status).to_string()),
                    ("url", format!("{}{}", base_url, page_id)),
                    ("status", status.to_string()),
                    ("block_count", snapshot.sample.element_count.to_string()),
                    ("checked_at", snapshot.observed_at.to_rfc3339()),
                ],
            );
            report.push_str(&entry);
            report.push('\n');
        }

        report
    }
}
