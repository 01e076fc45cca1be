//! The polling loop over an open shell channel.

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use super::config::MonitorConfig;
use super::state::SessionState;
use crate::channel::{ShellChannel, read_until_prompt};
use crate::display::Renderer;
use crate::error::{ChannelError, Result};

/// Drives one shell channel from `ChannelOpen` to `Closed` or `Failed`.
///
/// After disabling the pager, each cycle submits every configured command,
/// collects the sanitized responses into one transcript, hands it to the
/// renderer, and sleeps. Cancellation is checked before every command and
/// every read, and interrupts the sleep.
pub struct ShellSession<'a, S, R> {
    shell: S,
    renderer: R,
    config: &'a MonitorConfig,
    host: &'a str,
    state: SessionState,
    cycles: u64,
}

impl<'a, S: ShellChannel, R: Renderer> ShellSession<'a, S, R> {
    /// Wrap a freshly opened shell.
    pub fn new(shell: S, renderer: R, config: &'a MonitorConfig, host: &'a str) -> Self {
        debug!("{}: {}", host, SessionState::ChannelOpen);
        Self {
            shell,
            renderer,
            config,
            host,
            state: SessionState::ChannelOpen,
            cycles: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of transcripts rendered so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Release the shell and renderer.
    pub fn into_parts(self) -> (S, R) {
        (self.shell, self.renderer)
    }

    /// Run until cancelled or until the channel fails.
    ///
    /// The shell channel is closed on every exit path. Cancellation is a
    /// clean `Ok(())`; any other failure leaves the session `Failed` and is
    /// returned. A session that has already finished does nothing.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<()> {
        if self.state.is_terminal() {
            debug!("{}: session already {}", self.host, self.state);
            return Ok(());
        }

        let outcome = self.drive(cancel).await;

        if let Err(e) = self.shell.close().await {
            warn!("{}: failed to close shell channel: {}", self.host, e);
        }

        match outcome {
            Ok(()) => {
                self.transition(SessionState::Closed);
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                debug!("{}: cancelled", self.host);
                self.transition(SessionState::Closed);
                Ok(())
            }
            Err(e) => {
                self.transition(SessionState::Failed);
                Err(e)
            }
        }
    }

    async fn drive(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.disable_paging(cancel).await?;

        while !cancel.is_cancelled() {
            let Some(transcript) = self.poll_cycle(cancel).await? else {
                break;
            };

            self.renderer.render(&transcript, self.host)?;
            self.cycles += 1;

            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        Ok(())
    }

    async fn disable_paging(&mut self, cancel: &CancellationToken) -> Result<()> {
        let config = self.config;
        for command in &config.pager_commands {
            self.exchange(command, cancel).await?;
        }
        self.transition(SessionState::PagingDisabled);
        Ok(())
    }

    /// One cycle's transcript, or `None` if cancelled part way through.
    async fn poll_cycle(&mut self, cancel: &CancellationToken) -> Result<Option<String>> {
        let config = self.config;
        self.transition(SessionState::Polling);

        let mut transcript = String::new();
        for command in &config.commands {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            let raw = self.exchange(command, cancel).await?;
            self.append(&mut transcript, &raw)?;
        }

        if cancel.is_cancelled() {
            return Ok(None);
        }

        // A bare newline flushes out whatever prompt text is still pending
        self.transition(SessionState::Draining);
        let raw = self.exchange("", cancel).await?;
        self.append(&mut transcript, &raw)?;

        config.sanitizer.clean_output(&mut transcript);
        Ok(Some(transcript))
    }

    /// Send one line and read its response.
    async fn exchange(&mut self, line: &str, cancel: &CancellationToken) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(ChannelError::Cancelled.into());
        }
        debug!("{}: sending {:?}", self.host, line);

        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.shell.write_all(&data).await?;

        read_until_prompt(
            &mut self.shell,
            &self.config.prompt,
            cancel,
            &self.config.reader,
        )
        .await
    }

    fn append(&self, transcript: &mut String, raw: &str) -> Result<()> {
        let cleaned = self
            .config
            .sanitizer
            .remove_prompt(raw, &self.config.prompt)?;
        transcript.try_reserve(cleaned.len())?;
        transcript.push_str(&cleaned);
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!("{}: {} -> {}", self.host, self.state, next);
            self.state = next;
        }
    }
}
