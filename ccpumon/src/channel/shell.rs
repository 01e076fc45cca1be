//! Interactive shell channel abstraction.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Outcome of a single bounded read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were written into the caller's buffer.
    Data(usize),

    /// Nothing arrived before the timeout.
    Idle,

    /// The remote side closed the stream.
    Eof,
}

/// Byte-level access to an open interactive shell.
///
/// The device does not frame its responses, so this exposes only raw
/// reads and writes; prompt detection happens above it.
pub trait ShellChannel: Send {
    /// Read at most `buf.len()` bytes, waiting no longer than `timeout`.
    fn read_chunk(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> impl Future<Output = Result<ReadOutcome>> + Send;

    /// Write all of `data` to the shell.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Send EOF and close the channel.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
