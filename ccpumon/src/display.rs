//! Terminal rendering of a poll cycle's transcript.

use std::io::{self, Write};

/// Clear screen, then move the cursor home.
pub const CLEAR_AND_HOME: &str = "\x1b[2J\x1b[H";

/// Destination for finished transcripts.
pub trait Renderer: Send {
    /// Show one cycle's transcript for `host`.
    fn render(&mut self, transcript: &str, host: &str) -> io::Result<()>;
}

/// Redraws the whole terminal on every cycle.
#[derive(Debug)]
pub struct TerminalRenderer<W> {
    out: W,
}

impl TerminalRenderer<io::Stdout> {
    /// Render to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the renderer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&mut self, transcript: &str, host: &str) -> io::Result<()> {
        self.out.write_all(CLEAR_AND_HOME.as_bytes())?;
        self.out.flush()?;
        write!(self.out, "{}\nhost: {}\n", transcript, host)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer
            .render("  100 *\n*10:15:02 UTC\n", "10.0.0.1")
            .unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            out,
            "\x1b[2J\x1b[H  100 *\n*10:15:02 UTC\n\nhost: 10.0.0.1\n"
        );
    }

    #[test]
    fn test_each_render_starts_with_clear() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render("first", "r1").unwrap();
        renderer.render("second", "r1").unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(out.matches(CLEAR_AND_HOME).count(), 2);
        assert!(out.ends_with("\x1b[2J\x1b[Hsecond\nhost: r1\n"));
    }
}
