//! Drives the UI state machine through whole requests with an in-memory
//! connector.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use net_text::app::{App, AppAction, EditorAction, SEED_TEXT};
use net_text::error::ConnectError;
use net_text::platform::DeviceType;
use net_text::session::{ConfigSession, Credentials, DeviceConnector};
use tokio::runtime::Runtime;
use tokio::sync::Notify;
use tui_input::InputRequest;

#[derive(Default)]
struct Calls {
    detects: AtomicUsize,
    sent: Mutex<Vec<Vec<String>>>,
}

/// Echoes each line behind an IOS-style config prompt.
struct EchoSession {
    calls: Arc<Calls>,
}

#[async_trait]
impl ConfigSession for EchoSession {
    fn device_type(&self) -> DeviceType {
        DeviceType::CiscoIos
    }

    async fn send_config(&mut self, lines: &[String]) -> Result<String, ConnectError> {
        self.calls.sent.lock().expect("lock poisoned").push(lines.to_vec());
        Ok(transcript(lines))
    }

    async fn close(&mut self) -> Result<(), ConnectError> {
        Ok(())
    }
}

fn transcript(lines: &[String]) -> String {
    let mut out = String::from("R1#configure terminal\n");
    for line in lines {
        out.push_str(&format!("R1(config)#{line}\n"));
    }
    out.push_str("R1(config)#end\nR1#");
    out
}

struct FakeConnector {
    calls: Arc<Calls>,
    /// When set, detection waits for this before answering.
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl DeviceConnector for FakeConnector {
    async fn detect_device_type(
        &self,
        host: &str,
        _credentials: &Credentials,
    ) -> Result<DeviceType, ConnectError> {
        self.calls.detects.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if host.is_empty() {
            return Err(ConnectError::InvalidHost("empty hostname".into()));
        }
        Ok(DeviceType::CiscoIos)
    }

    async fn open_session(
        &self,
        _host: &str,
        _credentials: &Credentials,
        _device_type: DeviceType,
    ) -> Result<Box<dyn ConfigSession>, ConnectError> {
        Ok(Box::new(EchoSession {
            calls: self.calls.clone(),
        }))
    }
}

fn setup(gate: Option<Arc<Notify>>) -> (Runtime, App, Arc<Calls>) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("runtime");
    let calls = Arc::new(Calls::default());
    let connector = Arc::new(FakeConnector {
        calls: calls.clone(),
        gate,
    });
    let app = App::new(
        connector,
        Credentials::new("admin", "admin"),
        runtime.handle().clone(),
    );
    (runtime, app, calls)
}

fn type_host(app: &mut App, host: &str) {
    for c in host.chars() {
        app.handle_action(AppAction::Host(InputRequest::InsertChar(c)));
    }
}

fn type_config(app: &mut App, text: &str) {
    for c in text.chars() {
        let edit = if c == '\n' {
            EditorAction::Newline
        } else {
            EditorAction::Insert(c)
        };
        app.handle_action(AppAction::Editor(edit));
    }
}

/// Pumps the worker channel the way the UI tick does.
fn wait_idle(app: &mut App) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while app.is_busy() {
        assert!(Instant::now() < deadline, "request never finished");
        app.drain_events();
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn config_lines_reach_the_device_and_output_replaces_editor() {
    let (_runtime, mut app, calls) = setup(None);
    type_host(&mut app, "r1.lab");
    type_config(&mut app, "interface Gi0/1\nno shutdown\n");

    assert!(app.on_submit().is_some());
    wait_idle(&mut app);

    let sent = calls.sent.lock().expect("lock poisoned").clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0],
        vec![
            SEED_TEXT.trim_end_matches('\n').to_string(),
            "interface Gi0/1".to_string(),
            "no shutdown".to_string(),
            String::new(),
        ]
    );

    let text = app.editor().text();
    assert!(text.starts_with("R1#configure terminal\n"));
    assert!(text.ends_with("R1(config)#end\nR1#"));
    assert!(!app.editor().is_loading());
}

#[test]
fn empty_host_shows_connect_failure() {
    let (_runtime, mut app, _calls) = setup(None);
    type_config(&mut app, "hostname R1");

    app.on_submit();
    wait_idle(&mut app);

    assert_eq!(app.editor().text(), "Could not connect to device!");
    assert!(app.status().contains("failed"));
}

#[test]
fn second_submit_is_rejected_while_first_runs() {
    let gate = Arc::new(Notify::new());
    let (_runtime, mut app, calls) = setup(Some(gate.clone()));
    type_host(&mut app, "r1.lab");

    assert_eq!(app.on_submit(), Some(1));
    assert_eq!(app.on_submit(), None);

    gate.notify_one();
    wait_idle(&mut app);
    assert_eq!(calls.detects.load(Ordering::SeqCst), 1);
    assert_eq!(calls.sent.lock().expect("lock poisoned").len(), 1);
}

#[test]
fn cancel_releases_editor_and_ignores_late_result() {
    let gate = Arc::new(Notify::new());
    let (_runtime, mut app, calls) = setup(Some(gate.clone()));
    type_host(&mut app, "r1.lab");

    app.on_submit();
    app.handle_action(AppAction::Cancel);
    assert!(!app.is_busy());
    assert_eq!(app.editor().text(), SEED_TEXT);

    gate.notify_one();
    std::thread::sleep(Duration::from_millis(100));
    app.drain_events();
    assert_eq!(app.editor().text(), SEED_TEXT);
    assert!(calls.sent.lock().expect("lock poisoned").is_empty());
}

#[test]
fn resubmitting_replaces_rather_than_appends() {
    let (_runtime, mut app, _calls) = setup(None);
    type_host(&mut app, "r1.lab");
    type_config(&mut app, "hostname R1");

    app.on_submit();
    wait_idle(&mut app);
    let first = app.editor().text();

    app.on_submit();
    wait_idle(&mut app);
    let second = app.editor().text();

    let resent: Vec<String> = first.split('\n').map(str::to_string).collect();
    assert_eq!(second, transcript(&resent));
}

#[test]
fn resubmit_after_cancel_waits_for_worker_to_report() {
    let gate = Arc::new(Notify::new());
    let (_runtime, mut app, calls) = setup(Some(gate.clone()));
    type_host(&mut app, "r1.lab");

    assert_eq!(app.on_submit(), Some(1));
    app.handle_action(AppAction::Cancel);
    assert_eq!(app.on_submit(), None);

    let deadline = Instant::now() + Duration::from_secs(5);
    while app.is_closing() {
        assert!(Instant::now() < deadline, "cancelled worker never reported");
        app.drain_events();
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(app.on_submit(), Some(2));
    gate.notify_one();
    wait_idle(&mut app);
    assert_eq!(calls.sent.lock().expect("lock poisoned").len(), 1);
}
