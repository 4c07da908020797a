//! Debounced change detection over per-page sample windows.
//!
//! A change is reported only once the new value has been seen three cycles in
//! a row after an older, really observed value. Single-cycle flaps and the
//! first three cycles of a page's life never produce events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::history::{HistoryStore, Metric};
use super::status::StatusLevel;

/// One probe result for a page. `status_code == 0` marks a failed probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub status_code: u16,
    pub element_count: u32,
}

impl Sample {
    pub fn new(status_code: u16, element_count: u32) -> Self {
        Self {
            status_code,
            element_count,
        }
    }

    /// Sample recorded when a page could not be fetched or parsed.
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn is_unreachable(&self) -> bool {
        self.status_code == 0
    }
}

/// A sustained change detected for a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    StatusChanged {
        page_id: String,
        old_status: u16,
        new_status: u16,
        level: StatusLevel,
    },
    BlockCountChanged {
        page_id: String,
        old_count: u32,
        new_count: u32,
    },
}

impl ChangeEvent {
    pub fn page_id(&self) -> &str {
        match self {
            ChangeEvent::StatusChanged { page_id, .. } => page_id,
            ChangeEvent::BlockCountChanged { page_id, .. } => page_id,
        }
    }
}

/// Latest observation of a page, used for status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub sample: Sample,
    pub observed_at: DateTime<Utc>,
}

/// Owns the sample history and latest snapshots for every page.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    history: HistoryStore,
    latest: BTreeMap<String, PageSnapshot>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one sample for a page and returns the changes it completes.
    pub fn observe(&mut self, page_id: &str, sample: Sample) -> Vec<ChangeEvent> {
        self.observe_at(page_id, sample, Utc::now())
    }

    pub fn observe_at(
        &mut self,
        page_id: &str,
        sample: Sample,
        observed_at: DateTime<Utc>,
    ) -> Vec<ChangeEvent> {
        let mut events = Vec::new();

        let status = u32::from(sample.status_code);
        let status_window = self
            .history
            .push(page_id, Metric::Status, status)
            .advanced(status);
        if let Some((old, _)) = status_window.settled_transition() {
            events.push(ChangeEvent::StatusChanged {
                page_id: page_id.to_string(),
                old_status: u16::try_from(old).unwrap_or(u16::MAX),
                new_status: sample.status_code,
                level: StatusLevel::from_status(sample.status_code),
            });
        }

        let count_window = self
            .history
            .push(page_id, Metric::ElementCount, sample.element_count)
            .advanced(sample.element_count);
        if let Some((old, _)) = count_window.settled_transition() {
            events.push(ChangeEvent::BlockCountChanged {
                page_id: page_id.to_string(),
                old_count: old,
                new_count: sample.element_count,
            });
        }

        self.latest.insert(
            page_id.to_string(),
            PageSnapshot {
                sample,
                observed_at,
            },
        );

        events
    }

    pub fn snapshot(&self, page_id: &str) -> Option<PageSnapshot> {
        self.latest.get(page_id).copied()
    }

    /// Latest snapshot of every page observed so far, ordered by page id.
    pub fn snapshots(&self) -> Vec<(String, PageSnapshot)> {
        self.latest
            .iter()
            .map(|(page_id, snapshot)| (page_id.clone(), *snapshot))
            .collect()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Drops all history and snapshots; every page starts over from the sentinel.
    pub fn reset(&mut self) {
        self.history.clear();
        self.latest.clear();
    }
}
