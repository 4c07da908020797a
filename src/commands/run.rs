//! Long-running monitor command.

use anyhow::{Context, Result};
use clap::ArgMatches;
use std::sync::Arc;

use crate::core::config::LoadedConfig;
use crate::core::monitor::{ConfigLoader, MonitorRuntime, MonitorService, MonitorState};
use crate::core::probe::HttpProber;
use crate::notify::{
    CommandSource, ConsoleNotifier, Notifier, StdinCommandSource, TelegramCommandSource,
    TelegramNotifier,
};

/// Execute the run command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let sources = super::config_sources(matches);
    let console = matches.get_flag("console");

    // Startup config errors are fatal
    let loaded = LoadedConfig::load(&sources).context("Failed to load configuration")?;
    log::info!(
        "Watching {} pages on {} every {:?} (language: {})",
        loaded.monitor.pages.len(),
        loaded.monitor.base_url,
        loaded.monitor.interval,
        loaded.monitor.language
    );

    let runtime = MonitorRuntime::new().context("Failed to start async runtime")?;

    // stdin and the HTTP clients are created inside the runtime context
    let (prober, notifier, commands) = {
        let _guard = runtime.enter();
        let prober = Arc::new(HttpProber::new(loaded.request_timeout)?);
        let (notifier, commands): (Arc<dyn Notifier>, Box<dyn CommandSource>) = if console {
            (Arc::new(ConsoleNotifier), Box::new(StdinCommandSource::new()))
        } else {
            (
                Arc::new(TelegramNotifier::new(loaded.telegram.clone())?),
                Box::new(TelegramCommandSource::new(loaded.telegram.clone())?),
            )
        };
        (prober, notifier, commands)
    };

    let reload_sources = sources.clone();
    let loader: ConfigLoader =
        Arc::new(move || LoadedConfig::reload(&reload_sources).map(|loaded| loaded.monitor));

    let state = Arc::new(MonitorState::new(loaded.monitor));
    let service = Arc::new(MonitorService::new(state, prober, notifier, loader));

    let shutdown_tx = runtime.shutdown_handle();
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, shutting down");
        let _ = shutdown_tx.send(());
    })
    .context("Failed to install Ctrl-C handler")?;

    runtime.run(service, commands);
    Ok(())
}
