//! SSH sessions to network devices.
//!
//! The rest of the crate talks to devices only through two traits:
//! [`DeviceConnector`] detects a device's platform and opens a session,
//! and [`ConfigSession`] pushes configuration lines through that session.
//! [`SshConnector`] is the SSH implementation of both.
//!
//! # Main Components
//!
//! - [`Shell`] - Prompt-driven command I/O, independent of the transport
//! - [`ShellClient`] - SSH connection feeding a [`Shell`]
//! - [`SshConnector`] - Platform detection and session factory
//! - [`SshSession`] - Configuration session bound to one device

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_ssh2_tokio::client::{AuthMethod, Client};
use async_ssh2_tokio::{Config, ServerCheckMethod};
use async_trait::async_trait;
use log::{debug, trace};
use russh::{ChannelMsg, Preferred};
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::config;
use crate::device::{IGNORE_START_LINE, PromptMachine};
use crate::error::ConnectError;
use crate::platform::DeviceType;

pub use connector::{SshConnector, SshSession};
pub use security::{ConnectionSecurityOptions, SecurityLevel};

/// Login credentials shared by every request of a UI session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Detects device platforms and opens configuration sessions.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    /// Probes `host` and returns the platform it runs.
    async fn detect_device_type(
        &self,
        host: &str,
        credentials: &Credentials,
    ) -> Result<DeviceType, ConnectError>;

    /// Opens a session to `host`, driving it as `device_type`.
    async fn open_session(
        &self,
        host: &str,
        credentials: &Credentials,
        device_type: DeviceType,
    ) -> Result<Box<dyn ConfigSession>, ConnectError>;
}

/// An open session able to apply configuration.
#[async_trait]
pub trait ConfigSession: Send {
    /// Platform the session was opened as.
    fn device_type(&self) -> DeviceType;

    /// Enters configuration mode, sends every line in order, returns to
    /// exec mode and yields the device transcript.
    async fn send_config(&mut self, lines: &[String]) -> Result<String, ConnectError>;

    /// Leaves the device and releases the connection.
    async fn close(&mut self) -> Result<(), ConnectError>;
}

/// The result of one command on the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// False if the device printed an error for this command.
    pub success: bool,
    /// Output with the echoed command and the trailing prompt removed.
    pub content: String,
    /// Everything the device printed, prompt included.
    pub all: String,
}

/// Prompt-driven command I/O over a pair of text channels.
///
/// `sender` carries keystrokes to the device and `recv` yields raw device
/// output. The prompt machine decides when a command has finished.
pub struct Shell {
    sender: Sender<String>,
    recv: Receiver<String>,
    machine: PromptMachine,
    device_addr: String,
}

/// Interactive shell over SSH with a prompt machine tracking the device mode.
pub struct ShellClient {
    client: Client,
    shell: Shell,
}

mod client;
mod connector;
mod security;
mod shell;

#[cfg(test)]
mod scripted;
