use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use pagewatch::core::config::{MonitorConfig, PageDescriptor};
use pagewatch::core::messages::{MessageCatalog, MessageKind};
use pagewatch::core::monitor::{ConfigLoader, MonitorService, MonitorState, Sample};
use pagewatch::core::probe::{ProbeError, Prober};
use pagewatch::notify::{CommandSource, Notifier, OperatorCommand};
use pagewatch::{PagewatchError, Result};

const BASE: &str = "https://example.com";

/// Replays scripted samples per URL; `None` simulates an unreachable page.
#[derive(Default)]
struct ScriptedProber {
    scripts: Mutex<HashMap<String, VecDeque<Option<Sample>>>>,
}

impl ScriptedProber {
    fn script(&self, path: &str, samples: &[Option<(u16, u32)>]) {
        self.scripts.lock().entry(format!("{}{}", BASE, path)).or_default().extend(
            samples
                .iter()
                .map(|s| s.map(|(status, count)| Sample::new(status, count))),
        );
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, url: &str, _selector: &str) -> std::result::Result<Sample, ProbeError> {
        let next = self
            .scripts
            .lock()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Some(Sample::new(200, 1)));
        next.ok_or_else(|| ProbeError::Unreachable {
            url: url.to_string(),
            reason: "scripted failure".to_string(),
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.sent.lock())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) {
        self.sent.lock().push(text.to_string());
    }
}

struct ChannelCommands(mpsc::Receiver<OperatorCommand>);

#[async_trait]
impl CommandSource for ChannelCommands {
    async fn next_commands(&mut self) -> Result<Vec<OperatorCommand>> {
        match self.0.recv().await {
            Some(command) => Ok(vec![command]),
            None => std::future::pending().await,
        }
    }
}

fn catalog() -> MessageCatalog {
    let mut messages = MessageCatalog::new();
    messages.insert("en", MessageKind::MonitoringStarted, "started");
    messages.insert("en", MessageKind::Restart, "restarting");
    messages.insert("en", MessageKind::RestartFailed, "restart failed");
    messages.insert("en", MessageKind::CommandStatus, "status:");
    messages.insert("en", MessageKind::StatusEntry, "{{url}} {{status}} {{block_count}}");
    messages.insert(
        "en",
        MessageKind::StatusChange,
        "{{url}} {{old_status}}->{{new_status}}",
    );
    messages.insert(
        "en",
        MessageKind::BlockCountChange,
        "{{url}} blocks {{old_blocks}}->{{new_blocks}}",
    );
    messages
}

fn config(paths: &[&str]) -> MonitorConfig {
    MonitorConfig::new(
        BASE.to_string(),
        paths
            .iter()
            .map(|p| PageDescriptor {
                id: p.to_string(),
                selector: "item".to_string(),
            })
            .collect(),
        Duration::from_millis(10),
        "en".to_string(),
        catalog(),
    )
    .unwrap()
}

fn service_with(
    paths: &[&str],
    loader: ConfigLoader,
) -> (Arc<MonitorService>, Arc<ScriptedProber>, Arc<RecordingNotifier>) {
    let prober = Arc::new(ScriptedProber::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = Arc::new(MonitorState::new(config(paths)));
    let service = Arc::new(MonitorService::new(
        state,
        prober.clone(),
        notifier.clone(),
        loader,
    ));
    (service, prober, notifier)
}

fn service(paths: &[&str]) -> (Arc<MonitorService>, Arc<ScriptedProber>, Arc<RecordingNotifier>) {
    let owned: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
    service_with(
        paths,
        Arc::new(move || {
            let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
            Ok(config(&refs))
        }),
    )
}

#[tokio::test]
async fn test_cycle_sends_sustained_change() {
    let (service, prober, notifier) = service(&["/shop"]);
    prober.script(
        "/shop",
        &[
            Some((200, 5)),
            Some((200, 5)),
            Some((200, 5)),
            Some((200, 5)),
            Some((503, 5)),
            Some((503, 5)),
            Some((503, 5)),
        ],
    );

    let mut sent = Vec::new();
    for _ in 0..7 {
        sent.push(service.run_cycle().await);
    }

    assert_eq!(sent, vec![0, 0, 0, 0, 0, 0, 1]);
    assert_eq!(notifier.take(), vec!["🔴 https://example.com/shop 200->503"]);
}

#[tokio::test]
async fn test_unreachable_page_goes_through_debounce() {
    let (service, prober, notifier) = service(&["/"]);
    prober.script(
        "/",
        &[Some((200, 3)), Some((200, 3)), Some((200, 3)), Some((200, 3)), None, None, None],
    );

    for _ in 0..7 {
        service.run_cycle().await;
    }

    assert_eq!(
        notifier.take(),
        vec![
            "🟡 https://example.com/ 200->0".to_string(),
            "https://example.com/ blocks 3->0".to_string(),
        ]
    );
    let snapshot = service.state().snapshot("/").unwrap();
    assert_eq!(snapshot.sample, Sample::unreachable());
}

#[tokio::test]
async fn test_failing_page_does_not_affect_others() {
    let (service, prober, notifier) = service(&["/a", "/b"]);
    prober.script("/a", &[None; 8]);
    prober.script("/b", &[Some((200, 2)); 8]);

    for _ in 0..8 {
        service.run_cycle().await;
    }

    assert!(notifier.take().is_empty());
    assert_eq!(
        service.state().snapshot("/b").unwrap().sample,
        Sample::new(200, 2)
    );
    assert!(service.state().snapshot("/a").unwrap().sample.is_unreachable());
}

#[tokio::test]
async fn test_status_command_reports_latest_samples() {
    let (service, prober, notifier) = service(&["/a", "/b"]);
    prober.script("/a", &[Some((200, 1)), Some((404, 2))]);
    prober.script("/b", &[Some((503, 7)), Some((200, 8))]);

    service.run_cycle().await;
    service.run_cycle().await;
    service.handle_command(OperatorCommand::Status).await;

    assert_eq!(
        notifier.take(),
        vec!["status:\nhttps://example.com/a 404 2\nhttps://example.com/b 200 8\n"]
    );
}

#[tokio::test]
async fn test_restart_resets_history() {
    let (service, prober, notifier) = service(&["/"]);
    prober.script("/", &[Some((200, 1)); 4]);
    for _ in 0..4 {
        service.run_cycle().await;
    }

    service.handle_command(OperatorCommand::Restart).await;
    assert_eq!(notifier.take(), vec!["restarting", "started"]);
    assert!(service.state().snapshots().is_empty());

    // The same 200 -> 503 pattern that would fire before the restart is
    // suppressed while the fresh windows fill up.
    prober.script("/", &[Some((503, 1)); 3]);
    for _ in 0..3 {
        assert_eq!(service.run_cycle().await, 0);
    }
    assert!(notifier.take().is_empty());
}

#[tokio::test]
async fn test_failed_restart_keeps_previous_config() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let (service, prober, notifier) = service_with(
        &["/"],
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(PagewatchError::config("pages_config.json is not valid JSON"))
        }),
    );
    prober.script("/", &[Some((200, 1)); 4]);
    for _ in 0..4 {
        service.run_cycle().await;
    }

    service.handle_command(OperatorCommand::Restart).await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(notifier.take(), vec!["restarting", "restart failed"]);
    assert_eq!(service.state().config().pages.len(), 1);
    // History survives a failed reload
    assert!(service.state().snapshot("/").is_some());
}

#[tokio::test]
async fn test_panicking_reload_keeps_service_running() {
    let (service, prober, notifier) =
        service_with(&["/"], Arc::new(|| panic!("loader exploded")));
    prober.script("/", &[Some((200, 1)); 2]);
    service.run_cycle().await;

    service.handle_command(OperatorCommand::Restart).await;
    assert_eq!(notifier.take(), vec!["restarting", "restart failed"]);

    service.run_cycle().await;
    assert!(service.state().snapshot("/").is_some());
}

#[tokio::test]
async fn test_restart_applies_new_pages() {
    let (service, _prober, notifier) =
        service_with(&["/old"], Arc::new(|| Ok(config(&["/new", "/other"]))));

    service.handle_command(OperatorCommand::Restart).await;
    service.run_cycle().await;
    service.handle_command(OperatorCommand::Status).await;

    let messages = notifier.take();
    assert_eq!(
        messages.last().map(String::as_str),
        Some("status:\nhttps://example.com/new 200 1\nhttps://example.com/other 200 1\n")
    );
}

#[tokio::test]
async fn test_run_handles_commands_until_shutdown() {
    let (service, prober, notifier) = service(&["/"]);
    prober.script("/", &[Some((200, 4)); 2]);

    let (command_tx, command_rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(
        service
            .clone()
            .run(Box::new(ChannelCommands(command_rx)), shutdown_rx),
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    command_tx.send(OperatorCommand::Status).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("service did not stop")
        .unwrap();

    let messages = notifier.take();
    assert_eq!(messages.first().map(String::as_str), Some("started"));
    assert!(messages
        .iter()
        .any(|m| m.starts_with("status:\nhttps://example.com/ ")));
}
