//! Pattern matching utilities for prompt detection.

use regex::bytes::Regex;

use crate::error::ConfigError;

/// Hostname-style prompt with an optional `(config...)` suffix, ending in `>` or `#`.
pub const DEFAULT_PROMPT: &str = r"(?m)^([A-Za-z0-9_.-]+)(\(config[^(]*\))?[>#]\s*$";

/// Trait for prompt matching - regex by default, extensible for custom parsers.
pub trait PromptMatcher: Send + Sync {
    /// Check whether a single line (without its `\n`) is a prompt.
    fn is_prompt_line(&self, line: &[u8]) -> bool;

    /// Check whether the buffer ends with a prompt line.
    ///
    /// Only the trailing line is examined, so the cost does not grow with
    /// the amount of output that came before it.
    fn is_match(&self, data: &[u8]) -> bool {
        trailing_line(data).is_some_and(|line| self.is_prompt_line(line))
    }
}

/// Regex-based prompt matcher.
impl PromptMatcher for Regex {
    fn is_prompt_line(&self, line: &[u8]) -> bool {
        Regex::is_match(self, line)
    }
}

/// The last non-blank line of `data`, ignoring trailing whitespace.
///
/// Returns `None` when the buffer holds nothing but whitespace.
pub fn trailing_line(data: &[u8]) -> Option<&[u8]> {
    let end = data.iter().rposition(|b| !b.is_ascii_whitespace())? + 1;
    let trimmed = &data[..end];
    let start = memchr::memrchr(b'\n', trimmed).map_or(0, |pos| pos + 1);
    Some(&trimmed[start..])
}

/// A compiled device prompt pattern.
#[derive(Debug, Clone)]
pub struct PromptPattern {
    pattern: Regex,
}

impl PromptPattern {
    /// Compile a prompt pattern.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl PromptMatcher for PromptPattern {
    fn is_prompt_line(&self, line: &[u8]) -> bool {
        self.pattern.is_prompt_line(line)
    }
}
