//! SSH transport implementation using russh.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use log::{debug, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg, Preferred, kex};
use secrecy::{ExposeSecret, SecretString};

use super::config::{HostKeyVerification, SshConfig};
use crate::channel::{ReadOutcome, ShellChannel};
use crate::error::{ChannelError, Result, TransportError};

/// SSH transport wrapping russh client.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Configuration used for this connection.
    config: SshConfig,
}

impl SshTransport {
    /// Connect to the SSH server (handshake only, not yet authenticated).
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let mut kex_preference = config.key_exchange.clone();
        kex_preference.extend([
            kex::EXTENSION_SUPPORT_AS_CLIENT,
            kex::EXTENSION_OPENSSH_STRICT_KEX_AS_CLIENT,
        ]);

        let ssh_config = Arc::new(client::Config {
            preferred: Preferred {
                kex: Cow::Owned(kex_preference),
                ..Default::default()
            },
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("connecting to {}", config.socket_addr());

        let session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout {
            host: config.socket_addr(),
            timeout: config.timeout,
        })?
        .map_err(|e| {
            // Prefer the detailed host key error over russh's generic one
            let stored = host_key_error.lock().ok().and_then(|mut slot| slot.take());
            stored.unwrap_or_else(|| TransportError::ConnectionFailed {
                host: config.host.clone(),
                port: config.port,
                source: e,
            })
        })?;

        Ok(Self { session, config })
    }

    /// Make a single password authentication attempt.
    ///
    /// The password is dropped, and therefore zeroized, before this returns
    /// on every path.
    pub async fn authenticate(&mut self, password: SecretString) -> Result<()> {
        let user = self.config.username.clone();
        debug!("authenticating as {}", user);

        let outcome = self
            .session
            .authenticate_password(user.as_str(), password.expose_secret())
            .await;
        drop(password);

        let success = outcome.map_err(TransportError::Ssh)?.success();
        if !success {
            return Err(TransportError::AuthenticationFailed { user }.into());
        }

        Ok(())
    }

    /// Open a PTY shell channel on this connection.
    pub async fn open_shell(&self) -> Result<SshShell> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(ChannelError::OpenFailed)?;

        channel
            .request_pty(
                true,
                "xterm",
                self.config.terminal_width,
                self.config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(ChannelError::ShellRequestFailed)?;

        channel
            .request_shell(true)
            .await
            .map_err(ChannelError::ShellRequestFailed)?;

        Ok(SshShell::new(channel))
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// An open interactive shell over an SSH channel.
pub struct SshShell {
    channel: Channel<Msg>,
    inbox: Inbox,
}

impl SshShell {
    fn new(channel: Channel<Msg>) -> Self {
        Self {
            channel,
            inbox: Inbox::default(),
        }
    }
}

impl ShellChannel for SshShell {
    async fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ReadOutcome> {
        if let Some(outcome) = self.inbox.next(buf) {
            return Ok(outcome);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let msg = match tokio::time::timeout_at(deadline, self.channel.wait()).await {
                Err(_) => return Ok(ReadOutcome::Idle),
                Ok(msg) => msg,
            };

            match msg {
                Some(ChannelMsg::Data { data }) | Some(ChannelMsg::ExtendedData { data, .. }) => {
                    self.inbox.push(&data);
                    return Ok(ReadOutcome::Data(self.inbox.drain(buf)));
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) => {
                    debug!("shell channel closed by remote");
                    self.inbox.mark_eof();
                    return Ok(ReadOutcome::Eof);
                }
                None => {
                    self.inbox.mark_eof();
                    return Err(ChannelError::Closed.into());
                }
                Some(other) => {
                    debug!("ignoring channel message {:?}", other);
                }
            }
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if let Err(source) = self.channel.data(data).await {
            let command = String::from_utf8_lossy(data);
            return Err(ChannelError::Write {
                command: command.trim_end().to_string(),
                source,
            }
            .into());
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.inbox.is_eof() {
            self.channel.eof().await.map_err(TransportError::Ssh)?;
        }
        self.channel.close().await.map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Channel data not yet handed to a reader, plus a sticky end-of-stream flag.
///
/// A channel message can be larger than the caller's read buffer; the excess
/// is served by later reads before the channel is waited on again.
#[derive(Debug, Default)]
struct Inbox {
    pending: BytesMut,
    eof: bool,
}

impl Inbox {
    fn push(&mut self, data: &[u8]) {
        self.pending.extend_from_slice(data);
    }

    /// Copy as much pending data as fits into `buf`.
    fn drain(&mut self, buf: &mut [u8]) -> usize {
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        n
    }

    /// The outcome answerable without touching the channel, if any.
    ///
    /// Pending data comes first; once it is gone an ended stream keeps
    /// reporting `Eof`.
    fn next(&mut self, buf: &mut [u8]) -> Option<ReadOutcome> {
        if !self.pending.is_empty() {
            return Some(ReadOutcome::Data(self.drain(buf)));
        }
        self.eof.then_some(ReadOutcome::Eof)
    }

    fn mark_eof(&mut self) {
        self.eof = true;
    }

    fn is_eof(&self) -> bool {
        self.eof
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Stores a detailed host-key error so connect() can surface it
    /// instead of the generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found,
    /// `Err(TransportError::HostKeyChanged)` if key changed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = match self.known_hosts_path {
            Some(ref path) => {
                russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
            }
            None => russh::keys::check_known_hosts(&self.host, self.port, pubkey),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = match self.known_hosts_path {
            Some(ref path) => russh::keys::known_hosts::learn_known_hosts_path(
                &self.host, self.port, pubkey, path,
            ),
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey),
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    Ok(true)
                }
                Err(e) => {
                    self.reject(e);
                    Ok(false)
                }
            },
        }
    }
}
