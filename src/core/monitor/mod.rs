//! Page monitoring core.
//!
//! Per-page sample history, debounced change detection and the loops that
//! feed probe results through it.

mod detector;
mod history;
pub mod runtime;
mod status;

pub use detector::{ChangeDetector, ChangeEvent, PageSnapshot, Sample};
pub use history::{HistoryStore, HistoryWindow, Metric, WINDOW_SIZE};
pub use runtime::{ConfigLoader, MonitorRuntime, MonitorService, MonitorState};
pub use status::{status_emoji, StatusLevel};
