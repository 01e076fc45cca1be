//! SSH transport layer wrapping russh.
//!
//! This module provides the connection setup, password authentication and
//! shell channel creation that the polling loop runs on.

pub mod config;
mod ssh;

pub use config::{HostKeyVerification, SshConfig, default_key_exchange};
pub use ssh::{SshShell, SshTransport};
