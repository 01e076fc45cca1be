//! Password entry from the terminal.

use std::io::{self, BufRead, IsTerminal, Write};
use std::thread;

use secrecy::SecretString;
use secrecy::zeroize::Zeroize;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::ConfigError;

/// Longest password accepted; longer input is silently truncated.
pub const MAX_PASSWORD_LEN: usize = 127;

/// Read one password line from stdin, or `None` if `cancel` fires first.
///
/// When stdin is a terminal the prompt is shown and echo is suppressed until
/// the read completes or is cancelled. Otherwise the line is read as-is.
pub async fn read_password(
    prompt: &str,
    max_len: usize,
    cancel: &CancellationToken,
) -> Result<Option<SecretString>, ConfigError> {
    let read_stdin = move || read_secret_line(&mut io::stdin().lock(), max_len);

    if !io::stdin().is_terminal() {
        let result = read_guarded((), read_stdin, cancel).await;
        return result.map_err(ConfigError::Credential);
    }

    let mut stdout = io::stdout();
    write!(stdout, "{}", prompt)
        .and_then(|_| stdout.flush())
        .map_err(ConfigError::Credential)?;

    let result = read_guarded(EchoGuard::disable(), read_stdin, cancel).await;

    // The operator's Enter was not echoed.
    let _ = writeln!(stdout);
    result.map_err(ConfigError::Credential)
}

/// Run a blocking `read` on its own thread while holding `guard`.
///
/// `guard` is dropped once the read finishes or `cancel` fires, whichever
/// comes first. A cancelled read is abandoned; its thread stays blocked until
/// input arrives or the process exits.
async fn read_guarded<G, F>(
    guard: G,
    read: F,
    cancel: &CancellationToken,
) -> io::Result<Option<SecretString>>
where
    F: FnOnce() -> io::Result<SecretString> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    thread::Builder::new()
        .name("password-reader".to_string())
        .spawn(move || {
            let _ = tx.send(read());
        })?;

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Ok(None),
        result = rx => match result {
            Ok(line) => line.map(Some),
            Err(_) => Err(io::Error::other("password reader exited without a result")),
        },
    };

    drop(guard);
    outcome
}

/// Read one line, strip its terminator and truncate to `max_len` bytes.
///
/// The intermediate buffer is zeroized before returning.
pub fn read_secret_line<R: BufRead>(reader: &mut R, max_len: usize) -> io::Result<SecretString> {
    let mut line = String::new();
    let read = reader.read_line(&mut line);

    let result = match read {
        Ok(0) => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no password on standard input",
        )),
        Ok(_) => {
            let end = line.find(['\r', '\n']).unwrap_or(line.len());
            let mut end = end.min(max_len);
            while !line.is_char_boundary(end) {
                end -= 1;
            }
            Ok(SecretString::from(&line[..end]))
        }
        Err(e) => Err(e),
    };

    line.zeroize();
    result
}

/// Turns terminal echo off, restoring the previous settings on drop.
#[cfg(unix)]
struct EchoGuard {
    original: Option<nix::sys::termios::Termios>,
}

#[cfg(unix)]
impl EchoGuard {
    fn disable() -> Self {
        use nix::sys::termios::{self, LocalFlags, SetArg};

        let stdin = io::stdin();
        let original = termios::tcgetattr(&stdin).ok();
        if let Some(ref original) = original {
            let mut quiet = original.clone();
            quiet.local_flags.remove(LocalFlags::ECHO);
            let _ = termios::tcsetattr(&stdin, SetArg::TCSANOW, &quiet);
        }
        Self { original }
    }
}

#[cfg(unix)]
impl Drop for EchoGuard {
    fn drop(&mut self) {
        if let Some(ref original) = self.original {
            use nix::sys::termios;
            let stdin = io::stdin();
            let _ = termios::tcsetattr(&stdin, termios::SetArg::TCSANOW, original);
        }
    }
}

#[cfg(not(unix))]
struct EchoGuard;

#[cfg(not(unix))]
impl EchoGuard {
    fn disable() -> Self {
        EchoGuard
    }
}
