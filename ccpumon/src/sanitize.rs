//! Cleanup of captured command output.
//!
//! Devices echo the commands they receive, print banners, and end every
//! response with a prompt. These are stripped before the transcript is shown.

use log::trace;

use crate::channel::PromptMatcher;
use crate::error::Result;

/// Line after which rolling CPU history output is cut off.
pub const DEFAULT_TRUNCATION_MARKER: &str = "last 60 seconds";

/// Banner printed on entering configuration mode.
pub const CONFIG_BANNER: &str = "Enter configuration commands, one per line.  End with CNTL/Z.";

/// Removes prompts, echoed commands and banner text from device output.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    /// Lines after the first one containing this are dropped.
    truncation_marker: Option<String>,

    /// Exact substrings removed anywhere in the transcript.
    noise: Vec<String>,
}

impl Sanitizer {
    /// Create a sanitizer that removes the given noise strings.
    pub fn new<I, S>(noise: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            truncation_marker: Some(DEFAULT_TRUNCATION_MARKER.to_string()),
            noise: noise
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// Set the truncation marker (`None` disables truncation).
    pub fn with_truncation_marker(mut self, marker: Option<String>) -> Self {
        self.truncation_marker = marker.filter(|m| !m.is_empty());
        self
    }

    /// The noise strings removed by [`clean_output`](Self::clean_output).
    pub fn noise(&self) -> &[String] {
        &self.noise
    }

    /// The truncation marker, if any.
    pub fn truncation_marker(&self) -> Option<&str> {
        self.truncation_marker.as_deref()
    }

    /// Drop prompt lines, keeping everything else in order.
    ///
    /// Each kept line is terminated with `\n`. A line containing the
    /// truncation marker is kept and ends processing. Returns an empty string
    /// when nothing is kept.
    pub fn remove_prompt<P: PromptMatcher + ?Sized>(
        &self,
        text: &str,
        prompt: &P,
    ) -> Result<String> {
        let mut out = String::new();

        for line in text.split_terminator('\n') {
            let is_marker = self
                .truncation_marker
                .as_deref()
                .is_some_and(|marker| line.contains(marker));

            if is_marker || !prompt.is_prompt_line(line.as_bytes()) {
                out.try_reserve(line.len() + 1)?;
                out.push_str(line);
                out.push('\n');
            } else {
                trace!("dropping prompt line {:?}", line);
            }

            if is_marker {
                break;
            }
        }

        Ok(out)
    }

    /// Remove every occurrence of each noise string, in place.
    ///
    /// Removal repeats until a string no longer occurs, so occurrences formed
    /// by an earlier removal are removed too.
    pub fn clean_output(&self, text: &mut String) {
        for noise in &self.noise {
            while let Some(pos) = text.find(noise.as_str()) {
                text.replace_range(pos..pos + noise.len(), "");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{DEFAULT_PROMPT, PromptPattern};

    fn prompt() -> PromptPattern {
        PromptPattern::new(DEFAULT_PROMPT).unwrap()
    }

    fn sanitizer() -> Sanitizer {
        Sanitizer::new([
            "terminal length 0",
            "terminal width 0",
            CONFIG_BANNER,
            "show process cpu history",
            "show clock",
        ])
    }

    #[test]
    fn test_remove_prompt_lines() {
        let raw = "show clock\r\n*10:15:02.123 UTC Mon Oct 12 2026\r\nrouter#";
        let cleaned = sanitizer().remove_prompt(raw, &prompt()).unwrap();
        assert_eq!(
            cleaned,
            "show clock\r\n*10:15:02.123 UTC Mon Oct 12 2026\r\n"
        );
    }

    #[test]
    fn test_remove_prompt_is_idempotent() {
        let raw = "router>\nline one\n\nrouter(config)#\n  line two  \nrouter#show ver\nrouter#";
        let sanitizer = sanitizer();
        let once = sanitizer.remove_prompt(raw, &prompt()).unwrap();
        let twice = sanitizer.remove_prompt(&once, &prompt()).unwrap();
        assert_eq!(once, "line one\n\n  line two  \nrouter#show ver\n");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_remove_prompt_preserves_content_order() {
        let content = ["  100", "   90 *", "   80 **", "      0    5    0"];
        let prompts = ["r1#", "r1>", "r1(config)#"];

        let mut raw = String::new();
        for (i, line) in content.iter().enumerate() {
            raw.push_str(prompts[i % prompts.len()]);
            raw.push('\n');
            raw.push_str(line);
            raw.push('\n');
        }
        raw.push_str("r1#");

        let cleaned = sanitizer().remove_prompt(&raw, &prompt()).unwrap();
        let lines: Vec<&str> = cleaned.lines().collect();
        assert_eq!(lines, content);
    }

    #[test]
    fn test_remove_prompt_truncates_at_marker() {
        let raw = "\
show process cpu history
    100
          CPU% per second (last 60 seconds)
    100
          CPU% per minute (last 60 minutes)
router#";
        let sanitizer = sanitizer();
        let once = sanitizer.remove_prompt(raw, &prompt()).unwrap();
        assert_eq!(
            once,
            "show process cpu history\n    100\n          CPU% per second (last 60 seconds)\n"
        );
        assert_eq!(sanitizer.remove_prompt(&once, &prompt()).unwrap(), once);
    }

    #[test]
    fn test_remove_prompt_without_marker() {
        let raw = "a (last 60 seconds)\nb\nrouter#";
        let sanitizer = sanitizer().with_truncation_marker(None);
        assert_eq!(
            sanitizer.remove_prompt(raw, &prompt()).unwrap(),
            "a (last 60 seconds)\nb\n"
        );
    }

    #[test]
    fn test_remove_prompt_only_prompts() {
        let cleaned = sanitizer()
            .remove_prompt("router#\nrouter#\r\n", &prompt())
            .unwrap();
        assert!(cleaned.is_empty());
        let empty = sanitizer().remove_prompt("", &prompt()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_clean_output_removes_everywhere() {
        let mut text = format!(
            "terminal length 0\nshow clockx show clock\n{}\nok\n",
            CONFIG_BANNER
        );
        sanitizer().clean_output(&mut text);
        assert_eq!(text, "\nx \n\nok\n");
    }

    #[test]
    fn test_clean_output_repeats_until_gone() {
        let sanitizer = Sanitizer::new(["ab"]);
        let mut text = "aabb".to_string();
        sanitizer.clean_output(&mut text);
        assert_eq!(text, "");
    }

    #[test]
    fn test_clean_output_noop_without_noise() {
        let original = "  100 *****\n   50 **\n*10:15:02 UTC\n";
        let mut text = original.to_string();
        sanitizer().clean_output(&mut text);
        assert_eq!(text, original);
    }

    #[test]
    fn test_empty_noise_is_ignored() {
        let sanitizer = Sanitizer::new(["", "x"]);
        assert_eq!(sanitizer.noise(), ["x".to_string()]);
        let mut text = "axb".to_string();
        sanitizer.clean_output(&mut text);
        assert_eq!(text, "ab");
    }

    #[test]
    fn test_echo_and_prompt_removed_end_to_end() {
        let raw = "terminal length 0\nshow process cpu history\n...\nrouter#";
        let sanitizer = sanitizer();
        let mut transcript = sanitizer.remove_prompt(raw, &prompt()).unwrap();
        sanitizer.clean_output(&mut transcript);

        assert!(transcript.contains("..."));
        assert!(!transcript.contains("show process cpu history"));
        assert!(!transcript.contains("router#"));
        assert_eq!(transcript, "\n\n...\n");
    }
}
