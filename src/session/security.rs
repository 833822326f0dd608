use super::*;

/// SSH algorithm policy for new connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityLevel {
    /// Modern algorithms only, known_hosts checked.
    #[default]
    Secure,
    /// Adds SHA-1 and CBC algorithms still found on older switches.
    Balanced,
    /// Everything russh supports and no host key check.
    LegacyCompatible,
}

impl SecurityLevel {
    /// Parses the `NET_TEXT_SECURITY` spelling (`secure`, `balanced`, `legacy`).
    pub fn from_name(name: &str) -> Option<SecurityLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "secure" => Some(SecurityLevel::Secure),
            "balanced" => Some(SecurityLevel::Balanced),
            "legacy" | "legacy_compatible" => Some(SecurityLevel::LegacyCompatible),
            _ => None,
        }
    }
}

/// Connection security options for SSH establishment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSecurityOptions {
    pub level: SecurityLevel,
    /// Server host key verification method.
    pub server_check: ServerCheckMethod,
}

impl Default for ConnectionSecurityOptions {
    fn default() -> Self {
        Self::for_level(SecurityLevel::Secure)
    }
}

impl ConnectionSecurityOptions {
    /// Options for a level; only the legacy profile skips host key checks.
    pub fn for_level(level: SecurityLevel) -> Self {
        let server_check = match level {
            SecurityLevel::Secure | SecurityLevel::Balanced => {
                ServerCheckMethod::DefaultKnownHostsFile
            }
            SecurityLevel::LegacyCompatible => ServerCheckMethod::NoCheck,
        };
        Self {
            level,
            server_check,
        }
    }

    pub(super) fn preferred(&self) -> Preferred {
        match self.level {
            SecurityLevel::Secure => Preferred {
                kex: Cow::Borrowed(config::SECURE_KEX_ORDER),
                key: Cow::Borrowed(config::SECURE_KEY_TYPES),
                cipher: Cow::Borrowed(config::SECURE_CIPHERS),
                mac: Cow::Borrowed(config::SECURE_MAC_ALGORITHMS),
                compression: Cow::Borrowed(config::DEFAULT_COMPRESSION_ALGORITHMS),
            },
            SecurityLevel::Balanced => Preferred {
                kex: Cow::Borrowed(config::BALANCED_KEX_ORDER),
                key: Cow::Borrowed(config::BALANCED_KEY_TYPES),
                cipher: Cow::Borrowed(config::BALANCED_CIPHERS),
                mac: Cow::Borrowed(config::BALANCED_MAC_ALGORITHMS),
                compression: Cow::Borrowed(config::DEFAULT_COMPRESSION_ALGORITHMS),
            },
            SecurityLevel::LegacyCompatible => Preferred {
                kex: Cow::Borrowed(config::LEGACY_KEX_ORDER),
                key: Cow::Borrowed(config::LEGACY_KEY_TYPES),
                cipher: Cow::Borrowed(config::LEGACY_CIPHERS),
                mac: Cow::Borrowed(config::LEGACY_MAC_ALGORITHMS),
                compression: Cow::Borrowed(config::DEFAULT_COMPRESSION_ALGORITHMS),
            },
        }
    }
}
