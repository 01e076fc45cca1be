//! Error types for ccpumon.

use std::collections::TryReserveError;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ccpumon operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH connection and authentication errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Shell channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Invalid operator input or startup configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A buffer could not grow to hold device output
    #[error("Out of memory while buffering output: {0}")]
    ResourceExhausted(#[from] TryReserveError),

    /// Writing the transcript to the terminal failed
    #[error("Display error: {0}")]
    Display(#[from] io::Error),
}

impl Error {
    /// Whether this error is an operator interrupt rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::Cancelled))
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            _ if self.is_cancelled() => 0,
            Error::Config(_) => 2,
            _ => 1,
        }
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// TCP connect or SSH handshake failed
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: russh::Error,
    },

    /// Connect did not complete in time
    #[error("Connection to {host} timed out after {timeout:?}")]
    Timeout { host: String, timeout: Duration },

    /// SSH protocol error after the handshake
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged {
        host: String,
        port: u16,
        line: usize,
    },

    /// known_hosts could not be read or parsed
    #[error("known_hosts error: {0}")]
    KnownHosts(String),
}

/// Channel layer errors (shell open, reads, writes).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to open a session channel
    #[error("Failed to open shell channel: {0}")]
    OpenFailed(#[source] russh::Error),

    /// Failed to request PTY or shell
    #[error("Failed to request shell: {0}")]
    ShellRequestFailed(#[source] russh::Error),

    /// Writing to the channel failed
    #[error("Write of {command:?} failed: {source}")]
    Write {
        command: String,
        #[source]
        source: russh::Error,
    },

    /// Session went away without closing the channel
    #[error("Channel closed unexpectedly")]
    Closed,

    /// Operator interrupted the run
    #[error("Cancelled")]
    Cancelled,
}

/// Startup configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Host is empty, too long, or contains whitespace/control characters
    #[error("Invalid host '{host}': {reason}")]
    InvalidHost { host: String, reason: &'static str },

    /// Username is empty, too long, or contains whitespace/control characters
    #[error("Invalid username '{username}': {reason}")]
    InvalidUsername {
        username: String,
        reason: &'static str,
    },

    /// No password was supplied to the builder
    #[error("Password is required")]
    MissingPassword,

    /// The password could not be read from the terminal
    #[error("Failed to read password: {0}")]
    Credential(#[source] io::Error),

    /// Prompt pattern failed to compile
    #[error("Invalid prompt pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type alias using ccpumon's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_exits_cleanly() {
        let err: Error = ChannelError::Cancelled.into();
        assert!(err.is_cancelled());
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_failures_exit_non_zero() {
        let err: Error = ChannelError::Closed.into();
        assert!(!err.is_cancelled());
        assert_eq!(err.exit_code(), 1);

        let err: Error = ConfigError::MissingPassword.into();
        assert_eq!(err.exit_code(), 2);

        let err: Error = TransportError::AuthenticationFailed {
            user: "admin".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("admin"));
    }
}
