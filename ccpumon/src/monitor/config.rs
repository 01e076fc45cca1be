//! Polling configuration.

use std::time::Duration;

use crate::channel::{DEFAULT_PROMPT, PromptPattern, ReaderSettings};
use crate::error::ConfigError;
use crate::sanitize::{CONFIG_BANNER, Sanitizer};

/// CPU history query.
pub const CPU_HISTORY_COMMAND: &str = "show process cpu history";

/// Clock query, timestamps each cycle.
pub const CLOCK_COMMAND: &str = "show clock";

/// Commands that turn off the `--More--` pager and line wrapping.
pub const PAGER_COMMANDS: [&str; 2] = ["terminal length 0", "terminal width 0"];

/// Everything the polling loop needs once the shell is open.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Commands submitted each cycle, in order, without line terminator.
    pub commands: Vec<String>,

    /// Commands written once after the shell opens.
    pub pager_commands: Vec<String>,

    /// Pause between cycles.
    pub poll_interval: Duration,

    /// Prompt that ends each response.
    pub prompt: PromptPattern,

    /// Transcript cleanup.
    pub sanitizer: Sanitizer,

    /// Read timing and sizing.
    pub reader: ReaderSettings,
}

/// The default cycle: CPU history, then the clock.
pub fn default_commands() -> Vec<String> {
    vec![CPU_HISTORY_COMMAND.to_string(), CLOCK_COMMAND.to_string()]
}

/// The default pager-disable sequence.
pub fn default_pager_commands() -> Vec<String> {
    PAGER_COMMANDS.iter().map(|c| c.to_string()).collect()
}

impl MonitorConfig {
    /// Build a configuration with the device prompt, default reader settings
    /// and a sanitizer that strips the given commands' echoes.
    pub fn new(commands: Vec<String>, pager_commands: Vec<String>) -> Result<Self, ConfigError> {
        let sanitizer = Sanitizer::new(default_noise(&commands, &pager_commands));
        Ok(Self {
            commands,
            pager_commands,
            poll_interval: Duration::from_secs(1),
            prompt: PromptPattern::new(DEFAULT_PROMPT)?,
            sanitizer,
            reader: ReaderSettings::default(),
        })
    }
}

/// Echoes of every command sent, plus the configuration-mode banner.
pub fn default_noise(commands: &[String], pager_commands: &[String]) -> Vec<String> {
    pager_commands
        .iter()
        .map(String::as_str)
        .chain([CONFIG_BANNER])
        .chain(commands.iter().map(String::as_str))
        .map(|s| s.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_noise_covers_echoes() {
        let noise = default_noise(&default_commands(), &default_pager_commands());
        assert_eq!(
            noise,
            [
                "terminal length 0",
                "terminal width 0",
                CONFIG_BANNER,
                "show process cpu history",
                "show clock",
            ]
        );
    }

    #[test]
    fn test_new_defaults() {
        let pager = default_pager_commands();
        let config = MonitorConfig::new(default_commands(), pager).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.reader.max_idle_reads, 120);
        assert_eq!(config.reader.read_size, 1024);
        assert_eq!(
            config.sanitizer.truncation_marker(),
            Some("last 60 seconds")
        );
        assert_eq!(config.prompt.as_str(), DEFAULT_PROMPT);
    }
}
