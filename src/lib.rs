//! # net-text - push configuration text to network devices
//!
//! `net-text` is a small terminal application. The operator types a hostname
//! and a block of configuration lines, presses **Configure!**, and the device
//! transcript replaces the text in the editor.
//!
//! The device type is detected over SSH before the session is opened, so the
//! same screen works for Cisco IOS/NX-OS/IOS-XR, Arista EOS, Juniper Junos,
//! Huawei VRP and HP Comware.
//!
//! ## Main Components
//!
//! - [`app`] - terminal UI, key handling and background workers
//! - [`adapter::connect`] - detect the device type and open a session
//! - [`session::DeviceConnector`] / [`session::ConfigSession`] - the SSH seam
//! - [`device::PromptMachine`] - prompt recognition and mode transitions
//! - [`platform::DeviceType`] - per-platform prompts, probes and modes
//! - [`error::ConnectError`] - error types for connection and state operations
//! - [`config`] - SSH algorithm lists per security level
//! - [`settings`] - `NET_TEXT_*` environment settings
//!
//! ## Library use
//!
//! ```rust,no_run
//! use net_text::adapter;
//! use net_text::session::{Credentials, SshConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connector = SshConnector::default();
//!     let credentials = Credentials::new("admin", "admin");
//!
//!     let mut session = adapter::connect(&connector, "192.168.1.1", &credentials).await?;
//!     let lines = vec!["interface Gi0/1".to_string(), "no shutdown".to_string()];
//!     println!("{}", session.send_config(&lines).await?);
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod app;
pub mod config;
pub mod device;
pub mod error;
pub mod platform;
pub mod session;
pub mod settings;
