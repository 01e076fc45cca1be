//! Channel layer for prompt detection over an interactive shell.
//!
//! This module handles reading an unframed byte stream until the device
//! prompt reappears, including ANSI stripping and idle detection.

mod buffer;
mod patterns;
mod reader;
mod shell;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::{CaptureBuffer, INITIAL_CAPACITY};
pub use patterns::{DEFAULT_PROMPT, PromptMatcher, PromptPattern, trailing_line};
pub use reader::{ReaderSettings, read_until_prompt};
pub use shell::{ReadOutcome, ShellChannel};
