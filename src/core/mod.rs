// Core business logic module

pub mod config;
pub mod messages;
pub mod monitor;
pub mod probe;

// Re-export commonly used items
pub use config::{ConfigSources, LoadedConfig, MonitorConfig, PageDescriptor};
pub use messages::{format_message, MessageCatalog, MessageKind};
pub use probe::{HttpProber, Prober};
