// Command handlers module
pub mod check;
pub mod run;
pub mod version;

use clap::ArgMatches;
use std::path::PathBuf;

use crate::core::config::ConfigSources;

/// Config file locations from the shared `--env-file/--pages/--messages` flags
pub fn config_sources(matches: &ArgMatches) -> ConfigSources {
    let path = |id: &str| matches.get_one::<String>(id).map(PathBuf::from);
    ConfigSources {
        env_file: path("env-file"),
        pages_path: path("pages"),
        messages_path: path("messages"),
    }
}

// Re-exports for cleaner imports
pub use check::execute as check;
pub use run::execute as run;
pub use version::execute as version;
