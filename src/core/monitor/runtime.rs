//! Probe-cycle and command loops.
//!
//! `MonitorState` is the shared registry both loops work against. A whole
//! probe cycle holds the cycle gate, so a restart either waits for the cycle
//! in flight to finish or runs before the next one starts.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::detector::{ChangeDetector, ChangeEvent, PageSnapshot, Sample};
use crate::core::config::MonitorConfig;
use crate::core::messages::MessageKind;
use crate::core::probe::{probe_or_sentinel, Prober};
use crate::notify::{CommandSource, Notifier, OperatorCommand};
use crate::{PagewatchError, Result};

/// Pause before polling for commands again after a transport error.
const COMMAND_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Builds a fresh configuration when an operator asks for a restart.
///
/// Runs on the blocking pool, so it may do file I/O.
pub type ConfigLoader = Arc<dyn Fn() -> Result<MonitorConfig> + Send + Sync>;

/// Current configuration plus detector state, shared by both loops.
pub struct MonitorState {
    config: RwLock<Arc<MonitorConfig>>,
    detector: Mutex<ChangeDetector>,
    cycle_gate: tokio::sync::Mutex<()>,
}

impl MonitorState {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            detector: Mutex::new(ChangeDetector::new()),
            cycle_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> Arc<MonitorConfig> {
        self.config.read().clone()
    }

    pub fn observe(&self, page_id: &str, sample: Sample) -> Vec<ChangeEvent> {
        self.detector.lock().observe(page_id, sample)
    }

    pub fn snapshot(&self, page_id: &str) -> Option<PageSnapshot> {
        self.detector.lock().snapshot(page_id)
    }

    pub fn snapshots(&self) -> Vec<(String, PageSnapshot)> {
        self.detector.lock().snapshots()
    }

    /// Swap in `config` and forget all history, never in the middle of a cycle.
    pub async fn replace_config(&self, config: MonitorConfig) {
        let _gate = self.cycle_gate.lock().await;
        *self.config.write() = Arc::new(config);
        self.detector.lock().reset();
    }
}

/// Drives probing, change notifications and operator commands
pub struct MonitorService {
    state: Arc<MonitorState>,
    prober: Arc<dyn Prober>,
    notifier: Arc<dyn Notifier>,
    loader: ConfigLoader,
}

impl MonitorService {
    pub fn new(
        state: Arc<MonitorState>,
        prober: Arc<dyn Prober>,
        notifier: Arc<dyn Notifier>,
        loader: ConfigLoader,
    ) -> Self {
        Self {
            state,
            prober,
            notifier,
            loader,
        }
    }

    pub fn state(&self) -> &Arc<MonitorState> {
        &self.state
    }

    async fn notify(&self, config: &MonitorConfig, kind: MessageKind) {
        let text = config.messages.render(&config.language, kind, &[]);
        self.notifier.send(&text).await;
    }

    /// Probe every configured page once and deliver any changes detected.
    ///
    /// Returns the number of change events sent.
    pub async fn run_cycle(&self) -> usize {
        let _gate = self.state.cycle_gate.lock().await;
        let config = self.state.config();
        let mut sent = 0;

        log::debug!("Starting probe cycle over {} pages", config.pages.len());

        for page in &config.pages {
            let url = config.page_url(page);
            let sample = probe_or_sentinel(self.prober.as_ref(), &url, &page.selector).await;
            let events = self.state.observe(&page.id, sample);

            for event in &events {
                log::info!("Change detected on {}: {:?}", url, event);
                let text = config
                    .messages
                    .render_event(&config.language, &config.base_url, event);
                self.notifier.send(&text).await;
                sent += 1;
            }
        }

        sent
    }

    pub async fn handle_command(&self, command: OperatorCommand) {
        log::info!("Received /{} command", command);

        match command {
            OperatorCommand::Status => {
                let config = self.state.config();
                let report = config.messages.render_status_report(
                    &config.language,
                    &config.base_url,
                    &self.state.snapshots(),
                );
                self.notifier.send(&report).await;
            }
            OperatorCommand::Restart => {
                let current = self.state.config();
                self.notify(&current, MessageKind::Restart).await;

                match self.reload().await {
                    Ok(config) => {
                        self.state.replace_config(config).await;
                        let config = self.state.config();
                        log::info!(
                            "Configuration reloaded: {} pages every {:?}",
                            config.pages.len(),
                            config.interval
                        );
                        self.notify(&config, MessageKind::MonitoringStarted).await;
                    }
                    Err(e) => {
                        log::error!("Restart failed, keeping previous configuration: {}", e);
                        self.notify(&current, MessageKind::RestartFailed).await;
                    }
                }
            }
        }
    }

    async fn reload(&self) -> Result<MonitorConfig> {
        let loader = Arc::clone(&self.loader);
        tokio::task::spawn_blocking(move || loader())
            .await
            .map_err(|e| PagewatchError::other(format!("configuration reload task failed: {}", e)))?
    }

    async fn cycle_loop(&self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                _ = self.run_cycle() => {}
                _ = shutdown.recv() => break,
            }

            let interval = self.state.config().interval;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => break,
            }
        }
        log::debug!("Probe loop stopped");
    }

    async fn command_loop(
        &self,
        mut commands: Box<dyn CommandSource>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                result = commands.next_commands() => match result {
                    Ok(batch) => {
                        for command in batch {
                            self.handle_command(command).await;
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to receive commands: {}", e);
                        tokio::select! {
                            _ = tokio::time::sleep(COMMAND_RETRY_DELAY) => {}
                            _ = shutdown.recv() => break,
                        }
                    }
                },
                _ = shutdown.recv() => break,
            }
        }
        log::debug!("Command loop stopped");
    }

    /// Announce startup, then run both loops until `shutdown` fires.
    pub async fn run(
        self: Arc<Self>,
        commands: Box<dyn CommandSource>,
        shutdown: broadcast::Receiver<()>,
    ) {
        self.notify(&self.state.config(), MessageKind::MonitoringStarted)
            .await;

        let cycles = {
            let service = Arc::clone(&self);
            let shutdown = shutdown.resubscribe();
            tokio::spawn(async move { service.cycle_loop(shutdown).await })
        };
        let listener = {
            let service = Arc::clone(&self);
            let shutdown = shutdown.resubscribe();
            tokio::spawn(async move { service.command_loop(commands, shutdown).await })
        };

        for handle in [cycles, listener] {
            if let Err(e) = handle.await {
                log::error!("Monitor task failed: {}", e);
            }
        }
    }
}

/// Owns the Tokio runtime the service runs on.
pub struct MonitorRuntime {
    runtime: tokio::runtime::Runtime,
    shutdown_tx: broadcast::Sender<()>,
}

impl MonitorRuntime {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("pagewatch-worker")
            .build()?;
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        Ok(Self {
            runtime,
            shutdown_tx,
        })
    }

    /// Sender that stops the service when signalled.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub fn enter(&self) -> tokio::runtime::EnterGuard<'_> {
        self.runtime.enter()
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Run `service` until shutdown is signalled.
    pub fn run(&self, service: Arc<MonitorService>, commands: Box<dyn CommandSource>) {
        let shutdown = self.shutdown_tx.subscribe();
        self.runtime.block_on(service.run(commands, shutdown));
    }
}
