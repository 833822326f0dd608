//! In-memory devices for exercising [`Shell`] without a network.

use std::sync::{Arc, Mutex};

use super::*;

pub(super) const DEVICE_ADDR: &str = "test@device:22";

/// Starts a fake device that prints `banner`, records every keystroke batch
/// it receives and answers with `respond(input)`.
///
/// An empty reply sends nothing. `None` hangs up.
pub(super) fn scripted_shell<F>(
    machine: PromptMachine,
    banner: &str,
    mut respond: F,
) -> (Shell, Arc<Mutex<Vec<String>>>)
where
    F: FnMut(&str) -> Option<String> + Send + 'static,
{
    let (to_device, mut from_shell) = mpsc::channel::<String>(256);
    let (to_shell, from_device) = mpsc::channel::<String>(256);
    let written = Arc::new(Mutex::new(Vec::new()));

    let banner = banner.to_string();
    let log = written.clone();
    tokio::spawn(async move {
        if to_shell.send(banner).await.is_err() {
            return;
        }
        while let Some(input) = from_shell.recv().await {
            if let Ok(mut log) = log.lock() {
                log.push(input.clone());
            }
            match respond(&input) {
                Some(reply) if reply.is_empty() => {}
                Some(reply) => {
                    if to_shell.send(reply).await.is_err() {
                        return;
                    }
                }
                None => return,
            }
        }
    });

    (
        Shell::new(to_device, from_device, machine, DEVICE_ADDR),
        written,
    )
}

/// A Cisco IOS router named `R1` that understands just enough to be
/// configured.
#[derive(Debug, Clone, Default)]
pub(super) struct IosDevice {
    /// Submode suffix inside config mode, e.g. `config-if`.
    config: Option<String>,
}

impl IosDevice {
    fn prompt(&self) -> String {
        match &self.config {
            Some(mode) => format!("R1({mode})#"),
            None => "R1#".to_string(),
        }
    }

    fn reply(&mut self, input: &str) -> Option<String> {
        let command = input.trim_end_matches('\n');
        let body = match command {
            "reload" => return None,
            "show clock" => "*10:00:00.000 UTC Mon Oct 19 2026\r\n".to_string(),
            "show version" => "Cisco IOS Software, C2960 Software (C2960-LANBASEK9-M), \
                               Version 15.0(2)SE\r\n"
                .to_string(),
            "terminal length 0" => String::new(),
            "configure terminal" if self.config.is_none() => {
                self.config = Some("config".to_string());
                "Enter configuration commands, one per line.  End with CNTL/Z.\r\n".to_string()
            }
            "end" if self.config.is_some() => {
                self.config = None;
                String::new()
            }
            command if command.starts_with("shwo") => {
                "          ^\r\n% Invalid input detected at '^' marker.\r\n\r\n".to_string()
            }
            command if command.starts_with("interface ") && self.config.is_some() => {
                self.config = Some("config-if".to_string());
                String::new()
            }
            _ => String::new(),
        };
        Some(format!("{command}\r\n{body}{}", self.prompt()))
    }

    pub(super) fn into_fn(mut self) -> impl FnMut(&str) -> Option<String> + Send + 'static {
        move |input: &str| self.reply(input)
    }
}
