//! Terminal UI shell.
//!
//! The UI runs a synchronous crossterm loop on the main thread. Each accepted
//! submit spawns one worker on the tokio runtime; workers report back through
//! an unbounded channel that the loop drains every tick.

pub mod editor;
pub mod guard;
pub mod input;
pub mod view;
pub mod worker;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event;
use log::{debug, info, warn};
use ratatui::DefaultTerminal;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tui_input::Input;

use crate::session::{Credentials, DeviceConnector};

pub use editor::{ConfigEditor, EditorAction, SEED_TEXT};
pub use input::AppAction;
pub use worker::{ConfigRequest, TaskOutcome, WorkerEvent, split_commands};

/// Event poll interval of the UI loop.
pub const TICK: Duration = Duration::from_millis(100);

/// Which widget receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Host,
    Editor,
    Button,
}

impl Focus {
    pub fn next(self) -> Focus {
        match self {
            Focus::Host => Focus::Editor,
            Focus::Editor => Focus::Button,
            Focus::Button => Focus::Host,
        }
    }

    pub fn prev(self) -> Focus {
        match self {
            Focus::Host => Focus::Button,
            Focus::Editor => Focus::Host,
            Focus::Button => Focus::Editor,
        }
    }
}

/// Marker for the request currently running. At most one exists.
#[derive(Debug)]
struct InFlight {
    id: u64,
    hostname: String,
    cancel: CancellationToken,
}

pub struct App {
    host: Input,
    editor: ConfigEditor,
    focus: Focus,
    status: String,
    in_flight: Option<InFlight>,
    /// Cancelled request whose worker has not reported yet.
    closing: Option<InFlight>,
    next_request_id: u64,
    should_quit: bool,
    connector: Arc<dyn DeviceConnector>,
    credentials: Credentials,
    runtime: Handle,
    events_tx: UnboundedSender<WorkerEvent>,
    events_rx: UnboundedReceiver<WorkerEvent>,
}

impl App {
    pub fn new(
        connector: Arc<dyn DeviceConnector>,
        credentials: Credentials,
        runtime: Handle,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            host: Input::default(),
            editor: ConfigEditor::default(),
            focus: Focus::default(),
            status: String::from("Ready"),
            in_flight: None,
            closing: None,
            next_request_id: 1,
            should_quit: false,
            connector,
            credentials,
            runtime,
            events_tx,
            events_rx,
        }
    }

    pub fn host(&self) -> &Input {
        &self.host
    }

    pub fn editor(&self) -> &ConfigEditor {
        &self.editor
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::Quit => self.quit(),
            AppAction::Submit => {
                self.on_submit();
            }
            AppAction::Cancel => self.cancel(),
            AppAction::FocusNext => self.focus = self.focus.next(),
            AppAction::FocusPrev => self.focus = self.focus.prev(),
            AppAction::Host(request) => {
                self.host.handle(request);
            }
            // Editor is read-only while a request runs.
            AppAction::Editor(_) if self.is_busy() => {}
            AppAction::Editor(edit) => self.editor.apply(edit),
        }
    }

    /// Starts a configuration request for the current host and editor text.
    ///
    /// Returns the request id, or `None` if a request is already running.
    pub fn on_submit(&mut self) -> Option<u64> {
        if let Some(running) = &self.in_flight {
            warn!(
                "submit ignored: request {} to {} still running",
                running.id, running.hostname
            );
            self.status = format!(
                "Still configuring {} (Esc to cancel)",
                running.hostname
            );
            return None;
        }
        if let Some(closing) = &self.closing {
            warn!(
                "submit ignored: cancelled request {} to {} still closing",
                closing.id, closing.hostname
            );
            self.status = format!("Still closing the session to {}", closing.hostname);
            return None;
        }

        let id = self.next_request_id;
        self.next_request_id += 1;
        let request = ConfigRequest {
            id,
            hostname: self.host.value().to_string(),
            commands: split_commands(&self.editor.text()),
        };
        let cancel = CancellationToken::new();

        info!(
            "request {id}: configuring {:?} with {} line(s)",
            request.hostname,
            request.commands.len()
        );
        self.status = format!("Configuring {}...", request.hostname);
        self.editor.set_loading(true);
        self.in_flight = Some(InFlight {
            id,
            hostname: request.hostname.clone(),
            cancel: cancel.clone(),
        });

        worker::spawn_request(
            &self.runtime,
            self.connector.clone(),
            self.credentials.clone(),
            request,
            cancel,
            self.events_tx.clone(),
        );
        Some(id)
    }

    /// Replaces the editor contents with `output` and clears the busy state.
    pub fn on_task_complete(&mut self, output: &str) {
        self.editor.load_text(output);
        self.editor.set_loading(false);
        self.in_flight = None;
    }

    /// Cancels the running request, if any.
    ///
    /// The editor is released at once. New submits stay blocked until the
    /// worker reports, so two sessions never overlap.
    pub fn cancel(&mut self) {
        if let Some(running) = self.in_flight.take() {
            info!("request {}: cancelled by operator", running.id);
            running.cancel.cancel();
            self.editor.set_loading(false);
            self.status = format!("Cancelling configuration of {}...", running.hostname);
            self.closing = Some(running);
        }
    }

    /// True while a cancelled worker is still shutting down.
    pub fn is_closing(&self) -> bool {
        self.closing.is_some()
    }

    /// Applies one worker report.
    ///
    /// A report from a cancelled worker only unblocks submitting. Reports for
    /// any other request are dropped.
    pub fn apply(&mut self, event: WorkerEvent) {
        if let Some(closed) = self.closing.take_if(|closing| closing.id == event.request_id) {
            debug!("request {}: worker done after cancel", closed.id);
            self.status = format!("Cancelled configuration of {}", closed.hostname);
            return;
        }
        let Some(running) = &self.in_flight else {
            debug!("dropping report for finished request {}", event.request_id);
            return;
        };
        if running.id != event.request_id {
            debug!(
                "dropping report for request {} while {} runs",
                event.request_id,
                running.id
            );
            return;
        }
        let hostname = running.hostname.clone();

        self.status = match &event.outcome {
            TaskOutcome::Output(_) => format!("Configured {hostname}"),
            TaskOutcome::ConnectFailed(err) if err.is_soft() => {
                format!("Connection to {hostname:?} failed: {err} (check hostname and credentials)")
            }
            TaskOutcome::ConnectFailed(err) => format!("Connection to {hostname:?} failed: {err}"),
            TaskOutcome::SendFailed(err) => format!("Configuration of {hostname} failed: {err}"),
            TaskOutcome::Cancelled => format!("Cancelled configuration of {hostname}"),
            TaskOutcome::Crashed(reason) => format!("Worker crashed: {reason}"),
        };
        match event.outcome.editor_text() {
            Some(text) => self.on_task_complete(&text),
            None => {
                self.editor.set_loading(false);
                self.in_flight = None;
            }
        }
    }

    /// Applies every report waiting on the worker channel.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    fn quit(&mut self) {
        self.cancel();
        self.should_quit = true;
    }
}

/// Runs the UI loop until the operator quits.
pub fn run(app: &mut App, terminal: &mut DefaultTerminal) -> io::Result<()> {
    while !app.should_quit() {
        app.drain_events();
        terminal.draw(|frame| view::render(frame, app))?;

        if event::poll(TICK)? {
            let evt = event::read()?;
            if let Some(action) = input::event_to_action(&evt, app.focus()) {
                app.handle_action(action);
            }
        }
    }
    Ok(())
}
