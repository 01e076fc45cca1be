//! SSH connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use russh::kex;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For testing and lab use only.
    Disabled,
}

/// SSH connection configuration.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for password authentication.
    pub username: String,

    /// Connection timeout.
    pub timeout: Duration,

    /// Key exchange algorithms, most preferred first.
    pub key_exchange: Vec<kex::Name>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file (default: the user's).
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Create a configuration with defaults for everything but host and user.
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            timeout: Duration::from_secs(2),
            key_exchange: default_key_exchange(),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Group 14 with SHA-256, then NIST P-256 ECDH.
///
/// Older IOS images offer little else.
pub fn default_key_exchange() -> Vec<kex::Name> {
    vec![kex::DH_G14_SHA256, kex::ECDH_SHA2_NISTP256]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SshConfig::new("10.0.0.1", "admin");
        assert_eq!(config.port, 22);
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.socket_addr(), "10.0.0.1:22");
        assert_eq!(config.key_exchange.len(), 2);
        assert_eq!(
            config.key_exchange[0].as_ref(),
            "diffie-hellman-group14-sha256"
        );
        assert_eq!(config.key_exchange[1].as_ref(), "ecdh-sha2-nistp256");
    }
}
