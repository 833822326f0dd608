//! Background configuration tasks.
//!
//! One task runs per accepted submit. It connects, pushes the configuration
//! through a single session, closes the session and reports a
//! [`WorkerEvent`] back to the UI thread over an unbounded channel.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::adapter;
use crate::error::ConnectError;
use crate::session::{Credentials, DeviceConnector};

/// Text shown in the editor when no session could be opened.
pub const CONNECT_FAILED_TEXT: &str = "Could not connect to device!";

/// One press of the Configure! button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRequest {
    pub id: u64,
    pub hostname: String,
    pub commands: Vec<String>,
}

/// How a request ended.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Device transcript.
    Output(String),
    ConnectFailed(ConnectError),
    SendFailed(ConnectError),
    Cancelled,
    /// The task panicked or was aborted by the runtime.
    Crashed(String),
}

impl TaskOutcome {
    /// Text that replaces the editor contents, or `None` if the editor should
    /// keep what the operator typed.
    pub fn editor_text(&self) -> Option<String> {
        match self {
            TaskOutcome::Output(output) => Some(output.clone()),
            TaskOutcome::ConnectFailed(_) => Some(CONNECT_FAILED_TEXT.to_string()),
            TaskOutcome::SendFailed(err) => Some(format!("Configuration failed: {err}")),
            TaskOutcome::Crashed(reason) => Some(format!("Configuration task aborted: {reason}")),
            TaskOutcome::Cancelled => None,
        }
    }
}

/// Message from a worker to the UI thread.
#[derive(Debug)]
pub struct WorkerEvent {
    pub request_id: u64,
    pub outcome: TaskOutcome,
}

/// Runs one request to completion.
///
/// Cancellation is observed before connecting and while each blocking step
/// is in progress. The session is opened once and always closed.
pub async fn run_request(
    connector: &dyn DeviceConnector,
    credentials: &Credentials,
    request: &ConfigRequest,
    cancel: &CancellationToken,
) -> TaskOutcome {
    if cancel.is_cancelled() {
        return TaskOutcome::Cancelled;
    }

    let mut session = tokio::select! {
        _ = cancel.cancelled() => return TaskOutcome::Cancelled,
        result = adapter::connect(connector, &request.hostname, credentials) => match result {
            Ok(session) => session,
            Err(err) => return TaskOutcome::ConnectFailed(err),
        },
    };

    info!(
        "request {}: sending {} line(s) to {} ({})",
        request.id,
        request.commands.len(),
        request.hostname,
        session.device_type()
    );

    let outcome = tokio::select! {
        _ = cancel.cancelled() => {
            warn!("request {}: cancelled while configuring {}", request.id, request.hostname);
            TaskOutcome::Cancelled
        }
        result = session.send_config(&request.commands) => match result {
            Ok(output) => TaskOutcome::Output(output),
            Err(err) => {
                error!("request {}: configuration failed: {err}", request.id);
                TaskOutcome::SendFailed(err)
            }
        },
    };

    if let Err(err) = session.close().await {
        warn!("request {}: error closing session: {err}", request.id);
    }

    if cancel.is_cancelled() {
        return TaskOutcome::Cancelled;
    }
    outcome
}

/// Spawns a request on `runtime` and reports its outcome on `events`.
///
/// A supervising task awaits the worker so a panic still produces an event.
pub fn spawn_request(
    runtime: &Handle,
    connector: Arc<dyn DeviceConnector>,
    credentials: Credentials,
    request: ConfigRequest,
    cancel: CancellationToken,
    events: UnboundedSender<WorkerEvent>,
) {
    let request_id = request.id;
    let worker = runtime.spawn(async move {
        run_request(connector.as_ref(), &credentials, &request, &cancel).await
    });

    runtime.spawn(async move {
        let outcome = match worker.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!("request {request_id}: worker ended abnormally: {join_err}");
                TaskOutcome::Crashed(join_err.to_string())
            }
        };
        if events
            .send(WorkerEvent {
                request_id,
                outcome,
            })
            .is_err()
        {
            warn!("request {request_id}: UI is gone, dropping result");
        }
    });
}

/// Splits editor text into command lines on `'\n'`.
///
/// Nothing is trimmed or filtered; a trailing newline yields a trailing
/// empty command.
pub fn split_commands(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}
