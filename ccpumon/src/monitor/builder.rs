//! Builder for creating monitors.

use std::path::PathBuf;
use std::time::Duration;

use russh::kex;
use secrecy::SecretString;

use super::Monitor;
use super::config::{MonitorConfig, default_commands, default_noise, default_pager_commands};
use crate::channel::{PromptPattern, ReaderSettings};
use crate::error::{ConfigError, Result};
use crate::sanitize::{DEFAULT_TRUNCATION_MARKER, Sanitizer};
use crate::transport::config::{HostKeyVerification, SshConfig};

/// Longest host or username accepted.
pub const MAX_NAME_LEN: usize = 255;

/// Builder for constructing a [`Monitor`].
///
/// # Example
///
/// ```rust,no_run
/// use ccpumon::{CancellationToken, MonitorBuilder};
/// use secrecy::SecretString;
///
/// # async fn example() -> Result<(), ccpumon::Error> {
/// let monitor = MonitorBuilder::new("192.168.1.1")
///     .username("admin")
///     .password(SecretString::from("secret"))
///     .build()?;
///
/// monitor.run(CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub struct MonitorBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<SecretString>,
    timeout: Duration,
    terminal_width: u32,
    terminal_height: u32,
    key_exchange: Option<Vec<kex::Name>>,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    commands: Vec<String>,
    pager_commands: Vec<String>,
    noise: Option<Vec<String>>,
    truncation_marker: Option<String>,
    prompt: Option<String>,
    poll_interval: Duration,
    reader: ReaderSettings,
}

impl MonitorBuilder {
    /// Create a new monitor builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            password: None,
            timeout: Duration::from_secs(2),
            terminal_width: 511,
            terminal_height: 24,
            key_exchange: None,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            commands: default_commands(),
            pager_commands: default_pager_commands(),
            noise: None,
            truncation_marker: Some(DEFAULT_TRUNCATION_MARKER.to_string()),
            prompt: None,
            poll_interval: Duration::from_secs(1),
            reader: ReaderSettings::default(),
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password for authentication.
    pub fn password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Set the connection timeout (default: 2 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the key exchange algorithms offered, in preference order.
    pub fn key_exchange(mut self, algorithms: Vec<kex::Name>) -> Self {
        self.key_exchange = Some(algorithms);
        self
    }

    /// Set how the server's host key is checked.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a known_hosts file other than the user's.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Set the commands submitted each cycle.
    pub fn commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Set the commands sent once to disable paging.
    pub fn pager_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pager_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the noise strings removed from transcripts.
    ///
    /// By default these are the echoes of every command sent plus the
    /// configuration-mode banner.
    pub fn noise<I, S>(mut self, noise: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.noise = Some(noise.into_iter().map(Into::into).collect());
        self
    }

    /// Set the line after which a response is cut off (`None` keeps it all).
    pub fn truncation_marker(mut self, marker: Option<String>) -> Self {
        self.truncation_marker = marker;
        self
    }

    /// Set a custom prompt pattern.
    pub fn prompt(mut self, pattern: impl Into<String>) -> Self {
        self.prompt = Some(pattern.into());
        self
    }

    /// Set the pause between cycles (default: 1 second).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set read timing and sizing.
    pub fn reader_settings(mut self, settings: ReaderSettings) -> Self {
        self.reader = settings;
        self
    }

    /// Validate host and username without requiring a password.
    ///
    /// Lets a caller reject bad input before prompting for a credential.
    pub fn check(&self) -> Result<()> {
        validate_host(&self.host)?;
        match self.username.as_deref() {
            Some(username) => validate_username(username)?,
            None => return Err(missing_username().into()),
        }
        Ok(())
    }

    /// Build the monitor.
    ///
    /// This validates the configuration but does not connect. Call
    /// [`Monitor::run`] on the result to start polling.
    pub fn build(self) -> Result<Monitor> {
        self.check()?;
        let host = validate_host(&self.host)?;
        let username = self.username.ok_or_else(missing_username)?;
        let password = self.password.ok_or(ConfigError::MissingPassword)?;

        let mut config = MonitorConfig::new(self.commands, self.pager_commands)?;
        if let Some(pattern) = self.prompt {
            config.prompt = PromptPattern::new(&pattern)?;
        }
        let noise = self
            .noise
            .unwrap_or_else(|| default_noise(&config.commands, &config.pager_commands));
        config.sanitizer = Sanitizer::new(noise).with_truncation_marker(self.truncation_marker);
        config.poll_interval = self.poll_interval;
        config.reader = self.reader;

        let mut ssh_config = SshConfig::new(host, username);
        ssh_config.port = self.port;
        ssh_config.timeout = self.timeout;
        ssh_config.terminal_width = self.terminal_width;
        ssh_config.terminal_height = self.terminal_height;
        ssh_config.host_key_verification = self.host_key_verification;
        ssh_config.known_hosts_path = self.known_hosts_path;
        if let Some(algorithms) = self.key_exchange {
            ssh_config.key_exchange = algorithms;
        }

        Ok(Monitor::new(ssh_config, password, config))
    }
}

/// Trim one trailing line terminator and check the rest is a usable host.
pub fn validate_host(host: &str) -> std::result::Result<String, ConfigError> {
    let trimmed = host
        .strip_suffix('\n')
        .map(|h| h.strip_suffix('\r').unwrap_or(h))
        .unwrap_or(host);

    check_name(trimmed).map_err(|reason| ConfigError::InvalidHost {
        host: host.to_string(),
        reason,
    })?;
    Ok(trimmed.to_string())
}

/// Check a username is usable as given.
pub fn validate_username(username: &str) -> std::result::Result<(), ConfigError> {
    check_name(username).map_err(|reason| ConfigError::InvalidUsername {
        username: username.to_string(),
        reason,
    })
}

fn missing_username() -> ConfigError {
    ConfigError::InvalidUsername {
        username: String::new(),
        reason: "username is required",
    }
}

fn check_name(name: &str) -> std::result::Result<(), &'static str> {
    if name.is_empty() {
        return Err("must not be empty");
    }
    if name.len() > MAX_NAME_LEN {
        return Err("longer than 255 bytes");
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("contains whitespace or control characters");
    }
    Ok(())
}
