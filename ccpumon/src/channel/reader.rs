//! Reading a command's response up to the next prompt.

use std::time::Duration;

use log::{debug, trace};
use tokio_util::sync::CancellationToken;

use super::buffer::{CaptureBuffer, INITIAL_CAPACITY};
use super::patterns::PromptMatcher;
use super::shell::{ReadOutcome, ShellChannel};
use crate::error::{ChannelError, Result};

/// Timing and sizing for prompt-delimited reads.
#[derive(Debug, Clone)]
pub struct ReaderSettings {
    /// Upper bound on a single read call.
    pub read_timeout: Duration,

    /// Maximum bytes requested per read.
    pub read_size: usize,

    /// Consecutive idle reads after which the response is considered done.
    pub max_idle_reads: usize,

    /// Starting capacity of the capture buffer.
    pub initial_capacity: usize,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(1000),
            read_size: 1024,
            max_idle_reads: 120,
            initial_capacity: INITIAL_CAPACITY,
        }
    }
}

/// Read from `shell` until the output ends with a prompt.
///
/// Also returns successfully, with whatever has accumulated, when the remote
/// closes the stream or stays silent for `max_idle_reads` consecutive reads.
/// Cancellation is checked before every read.
pub async fn read_until_prompt<S, P>(
    shell: &mut S,
    prompt: &P,
    cancel: &CancellationToken,
    settings: &ReaderSettings,
) -> Result<String>
where
    S: ShellChannel + ?Sized,
    P: PromptMatcher + ?Sized,
{
    let mut buffer = CaptureBuffer::new(settings.initial_capacity);
    let mut chunk = vec![0u8; settings.read_size.max(1)];
    let mut idle = 0usize;

    loop {
        if cancel.is_cancelled() {
            return Err(ChannelError::Cancelled.into());
        }

        buffer.reserve_for(chunk.len())?;

        match shell.read_chunk(&mut chunk, settings.read_timeout).await? {
            ReadOutcome::Eof => {
                debug!("channel EOF after {} bytes", buffer.len());
                break;
            }
            ReadOutcome::Idle | ReadOutcome::Data(0) => {
                idle += 1;
                if idle >= settings.max_idle_reads {
                    debug!(
                        "no prompt after {} idle reads, returning {} bytes",
                        idle,
                        buffer.len()
                    );
                    break;
                }
            }
            ReadOutcome::Data(n) => {
                idle = 0;
                trace!("read {} bytes", n);
                buffer.extend(&chunk[..n])?;
                if buffer.ends_with_prompt(prompt) {
                    break;
                }
            }
        }
    }

    Ok(buffer.into_string())
}
