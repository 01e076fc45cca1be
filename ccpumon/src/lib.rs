//! # ccpumon
//!
//! Watch a network device's CPU load over an interactive SSH shell.
//!
//! ccpumon logs in with a password, turns off the device's pager, then
//! repeatedly runs `show process cpu history` and `show clock`, strips
//! echoed commands and prompts from the output, and redraws the terminal
//! with the result until interrupted.
//!
//! ## Features
//!
//! - Async SSH connections via russh
//! - Prompt detection on the trailing line of a growing capture buffer
//! - ANSI escape stripping of captured output
//! - Cancellation through an injected token, checked before every read
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ccpumon::{CancellationToken, MonitorBuilder, spawn_interrupt_listener};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ccpumon::Error> {
//!     let monitor = MonitorBuilder::new("192.168.1.1")
//!         .username("admin")
//!         .password(SecretString::from("secret"))
//!         .build()?;
//!
//!     let cancel = CancellationToken::new();
//!     spawn_interrupt_listener(cancel.clone());
//!
//!     monitor.run(cancel).await
//! }
//! ```

pub mod cancel;
pub mod channel;
pub mod credential;
pub mod display;
pub mod error;
pub mod monitor;
pub mod sanitize;
pub mod transport;

// Re-export main types for convenience
pub use cancel::{CancellationToken, spawn_interrupt_listener};
pub use display::{Renderer, TerminalRenderer};
pub use error::Error;
pub use monitor::{Monitor, MonitorBuilder, MonitorConfig, SessionState};
pub use sanitize::Sanitizer;
pub use transport::{HostKeyVerification, SshConfig};
