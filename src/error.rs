//! Error types for device connection and configuration delivery.
//!
//! Every failure that can happen between "the operator pressed Configure!"
//! and "the device output is on screen" is mapped onto [`ConnectError`].
//! Errors from the SSH stack are classified on conversion so callers can
//! match on what went wrong instead of on which library reported it.

use std::io;

use thiserror::Error;
use tokio::sync::mpsc::error::SendError;

/// Errors that can occur while detecting, connecting to or configuring a device.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// The hostname or another argument cannot be used to reach a device.
    #[error("invalid host: {0}")]
    InvalidHost(String),

    /// The device did not answer in time (TCP connect, SSH handshake or keepalive).
    #[error("connection timed out: {0}")]
    Timeout(String),

    /// The device rejected the supplied credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The device refused the connection or could not be routed to.
    #[error("device unreachable: {0}")]
    Unreachable(String),

    /// The server host key did not pass verification.
    #[error("host key rejected")]
    HostKeyRejected,

    /// No supported platform matched the detection probes.
    #[error("unsupported device type on {0}")]
    UnsupportedDevice(String),

    /// The SSH channel was disconnected while waiting for a prompt.
    ///
    /// This typically happens when the remote device closes the connection
    /// unexpectedly during login or command execution.
    #[error("channel disconnect on wait prompt")]
    ChannelDisconnect,

    /// The SSH connection has already been closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// A command did not return to a prompt within the configured timeout.
    ///
    /// Carries the partial output received before the timeout.
    #[error("exec command timeout: {0}")]
    ExecTimeout(String),

    /// The requested mode cannot be reached from the current mode.
    #[error("unreachable state {0}")]
    UnreachableState(String),

    /// A prompt machine template failed to compile.
    #[error("invalid prompt machine: {0}")]
    InvalidPromptMachine(String),

    /// The request was cancelled by the operator.
    #[error("request cancelled")]
    Cancelled,

    /// Anything the classifications above do not cover.
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl ConnectError {
    /// Returns true for the failure kinds an operator is expected to hit in
    /// normal use: timeouts, bad credentials and malformed hosts.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            ConnectError::Timeout(_)
                | ConnectError::AuthenticationFailed(_)
                | ConnectError::InvalidHost(_)
        )
    }

    fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => ConnectError::Timeout(err.to_string()),
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable => ConnectError::Unreachable(err.to_string()),
            io::ErrorKind::InvalidInput => ConnectError::InvalidHost(err.to_string()),
            _ => ConnectError::Unknown(err.to_string()),
        }
    }
}

impl From<russh::Error> for ConnectError {
    fn from(err: russh::Error) -> Self {
        match err {
            russh::Error::ConnectionTimeout
            | russh::Error::InactivityTimeout
            | russh::Error::KeepaliveTimeout => ConnectError::Timeout(err.to_string()),
            russh::Error::NotAuthenticated => ConnectError::AuthenticationFailed(err.to_string()),
            russh::Error::IO(io_err) => ConnectError::from_io(io_err),
            other => ConnectError::Unknown(other.to_string()),
        }
    }
}

impl From<async_ssh2_tokio::Error> for ConnectError {
    fn from(err: async_ssh2_tokio::Error) -> Self {
        match err {
            async_ssh2_tokio::Error::PasswordWrong | async_ssh2_tokio::Error::KeyAuthFailed => {
                ConnectError::AuthenticationFailed(err.to_string())
            }
            async_ssh2_tokio::Error::AddressInvalid(io_err) => {
                ConnectError::InvalidHost(io_err.to_string())
            }
            async_ssh2_tokio::Error::ServerCheckFailed => ConnectError::HostKeyRejected,
            async_ssh2_tokio::Error::SshError(ssh_err) => ConnectError::from(ssh_err),
            async_ssh2_tokio::Error::IoError(io_err) => ConnectError::from_io(io_err),
            other => ConnectError::Unknown(other.to_string()),
        }
    }
}

impl From<SendError<String>> for ConnectError {
    fn from(_: SendError<String>) -> Self {
        ConnectError::ConnectionClosed
    }
}
