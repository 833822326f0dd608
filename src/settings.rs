//! Environment-driven settings.
//!
//! Everything is read once at start-up. Credentials fall back to
//! `admin`/`admin`, which matches the factory defaults of most lab images.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::session::{ConnectionSecurityOptions, Credentials, SecurityLevel, SshConnector};

pub const USER_VAR: &str = "NET_TEXT_USER";
pub const PASS_VAR: &str = "NET_TEXT_PASS";
pub const PORT_VAR: &str = "NET_TEXT_PORT";
pub const TIMEOUT_VAR: &str = "NET_TEXT_TIMEOUT";
pub const SECURITY_VAR: &str = "NET_TEXT_SECURITY";
pub const LOG_FILE_VAR: &str = "NET_TEXT_LOG_FILE";

const DEFAULT_USER: &str = "admin";
const DEFAULT_PASS: &str = "admin";
const DEFAULT_PORT: u16 = 22;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Process-lifetime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub port: u16,
    /// Per-command timeout on the device shell.
    pub command_timeout: Duration,
    pub security: SecurityLevel,
    pub log_file: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Settings, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(USER_VAR).unwrap_or_else(|| DEFAULT_USER.to_string());
        let password = lookup(PASS_VAR).unwrap_or_else(|| DEFAULT_PASS.to_string());

        let port = match lookup(PORT_VAR) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or(SettingsError::InvalidValue {
                    key: PORT_VAR,
                    value,
                })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(SettingsError::InvalidValue {
                    key: TIMEOUT_VAR,
                    value,
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let security = match lookup(SECURITY_VAR) {
            Some(value) => SecurityLevel::from_name(&value).ok_or(SettingsError::InvalidValue {
                key: SECURITY_VAR,
                value,
            })?,
            None => SecurityLevel::default(),
        };

        let log_file = lookup(LOG_FILE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("net-text.log"));

        Ok(Settings {
            credentials: Credentials::new(username, password),
            port,
            command_timeout: Duration::from_secs(timeout_secs),
            security,
            log_file,
        })
    }

    /// SSH connector configured from these settings.
    pub fn connector(&self) -> SshConnector {
        SshConnector::new(
            self.port,
            self.command_timeout,
            ConnectionSecurityOptions::for_level(self.security),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = Settings::from_lookup(lookup_from(&[])).expect("defaults are valid");

        assert_eq!(settings.credentials, Credentials::new("admin", "admin"));
        assert_eq!(settings.port, 22);
        assert_eq!(settings.command_timeout, Duration::from_secs(60));
        assert_eq!(settings.security, SecurityLevel::Secure);
        assert!(settings.log_file.ends_with("net-text.log"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            (USER_VAR, "netops"),
            (PASS_VAR, "s3cret"),
            (PORT_VAR, "2222"),
            (TIMEOUT_VAR, "15"),
            (SECURITY_VAR, "legacy"),
            (LOG_FILE_VAR, "/var/log/net-text.log"),
        ]))
        .expect("overrides are valid");

        assert_eq!(settings.credentials, Credentials::new("netops", "s3cret"));
        assert_eq!(settings.port, 2222);
        assert_eq!(settings.command_timeout, Duration::from_secs(15));
        assert_eq!(settings.security, SecurityLevel::LegacyCompatible);
        assert_eq!(settings.log_file, PathBuf::from("/var/log/net-text.log"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Settings::from_lookup(lookup_from(&[(PORT_VAR, "0")])).expect_err("port 0");
        assert_eq!(
            err,
            SettingsError::InvalidValue {
                key: PORT_VAR,
                value: "0".to_string()
            }
        );
        assert!(Settings::from_lookup(lookup_from(&[(TIMEOUT_VAR, "soon")])).is_err());
        assert!(Settings::from_lookup(lookup_from(&[(SECURITY_VAR, "none")])).is_err());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let settings =
            Settings::from_lookup(lookup_from(&[(PASS_VAR, "hunter2")])).expect("valid");
        let rendered = format!("{:?}", settings.credentials);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
