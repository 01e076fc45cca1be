//! Monitoring a device's CPU over an interactive shell.
//!
//! [`Monitor`] owns one connection for one run: it connects, authenticates,
//! opens a shell and hands it to a [`ShellSession`], which polls until the
//! cancellation token fires or the channel fails.

mod builder;
mod config;
mod session;
mod state;

pub use builder::{MAX_NAME_LEN, MonitorBuilder, validate_host, validate_username};
pub use config::{
    CLOCK_COMMAND, CPU_HISTORY_COMMAND, MonitorConfig, PAGER_COMMANDS, default_commands,
    default_noise, default_pager_commands,
};
pub use session::ShellSession;
pub use state::SessionState;

use log::{debug, warn};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use crate::display::{Renderer, TerminalRenderer};
use crate::error::{Error, Result};
use crate::transport::{SshConfig, SshTransport};

/// A configured, not yet connected, monitoring run against one host.
pub struct Monitor {
    ssh_config: SshConfig,
    password: SecretString,
    config: MonitorConfig,
}

impl Monitor {
    pub(crate) fn new(
        ssh_config: SshConfig,
        password: SecretString,
        config: MonitorConfig,
    ) -> Self {
        Self {
            ssh_config,
            password,
            config,
        }
    }

    /// The target host, as shown under each transcript.
    pub fn host(&self) -> &str {
        &self.ssh_config.host
    }

    /// Transport settings.
    pub fn ssh_config(&self) -> &SshConfig {
        &self.ssh_config
    }

    /// Polling settings.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Poll the device, redrawing standard output, until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        self.run_with(TerminalRenderer::stdout(), cancel).await
    }

    /// Poll the device, handing each transcript to `renderer`.
    ///
    /// Cancellation returns `Ok(())` once the channel and connection are
    /// torn down. The password is consumed by the single authentication
    /// attempt.
    pub async fn run_with<R: Renderer>(self, renderer: R, cancel: CancellationToken) -> Result<()> {
        let Monitor {
            ssh_config,
            password,
            config,
        } = self;
        let host = ssh_config.host.clone();

        debug!("{}: {}", host, SessionState::Connecting);
        let connecting = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            result = SshTransport::connect(ssh_config) => result,
        };
        let mut transport = match connecting {
            Ok(transport) => transport,
            Err(e) => return Err(failed(&host, SessionState::Connecting, e)),
        };

        debug!(
            "{}: {} -> {}",
            host,
            SessionState::Connecting,
            SessionState::Authenticating
        );
        if let Err(e) = transport.authenticate(password).await {
            close_transport(transport, &host).await;
            return Err(failed(&host, SessionState::Authenticating, e));
        }

        let shell = match transport.open_shell().await {
            Ok(shell) => shell,
            Err(e) => {
                close_transport(transport, &host).await;
                return Err(failed(&host, SessionState::Authenticating, e));
            }
        };

        let mut session = ShellSession::new(shell, renderer, &config, &host);
        let result = session.run(&cancel).await;
        debug!(
            "{}: session {} after {} cycles",
            host,
            session.state(),
            session.cycles()
        );
        drop(session);

        close_transport(transport, &host).await;
        result
    }
}

/// Log the move to `Failed` and hand the error back.
fn failed(host: &str, from: SessionState, error: Error) -> Error {
    debug!("{}: {} -> {}: {}", host, from, SessionState::Failed, error);
    error
}

async fn close_transport(transport: SshTransport, host: &str) {
    if let Err(e) = transport.close().await {
        warn!("{}: failed to disconnect: {}", host, e);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;

    fn monitor(port: u16) -> Monitor {
        MonitorBuilder::new("127.0.0.1")
            .port(port)
            .username("admin")
            .password(SecretString::from("secret"))
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_cancelled_before_connect() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let renderer = TerminalRenderer::new(Vec::new());
        monitor(9).run_with(renderer, cancel).await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_failure_is_reported() {
        // Accepts TCP connections and hangs up before the SSH banner
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        let renderer = TerminalRenderer::new(Vec::new());
        let err = monitor(port)
            .run_with(renderer, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)), "{:?}", err);
        assert_eq!(err.exit_code(), 1);
    }
}
