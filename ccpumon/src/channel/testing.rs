//! Scripted in-memory shell for tests.

use std::collections::VecDeque;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::shell::{ReadOutcome, ShellChannel};
use crate::error::{ChannelError, Result};

/// One scripted read result.
#[derive(Debug, Clone)]
pub enum Step {
    Data(Vec<u8>),
    Idle(usize),
    Eof,
    Fail,
}

/// A shell that replays a fixed script of reads and records writes.
///
/// Once the script runs out every read is idle.
#[derive(Debug, Default)]
pub struct ScriptedShell {
    script: VecDeque<Step>,
    pub writes: Vec<String>,
    pub reads: usize,
    pub closed: bool,
    pub fail_writes: bool,
    cancel_on_write: Option<(usize, CancellationToken)>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, data: impl AsRef<[u8]>) -> Self {
        self.script.push_back(Step::Data(data.as_ref().to_vec()));
        self
    }

    pub fn idle(mut self, count: usize) -> Self {
        self.script.push_back(Step::Idle(count));
        self
    }

    pub fn eof(mut self) -> Self {
        self.script.push_back(Step::Eof);
        self
    }

    pub fn fail(mut self) -> Self {
        self.script.push_back(Step::Fail);
        self
    }

    /// Cancel `token` once the `nth` write (1-based) has been accepted.
    pub fn cancel_on_write(mut self, nth: usize, token: CancellationToken) -> Self {
        self.cancel_on_write = Some((nth, token));
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl ShellChannel for ScriptedShell {
    async fn read_chunk(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<ReadOutcome> {
        self.reads += 1;
        match self.script.pop_front() {
            None => Ok(ReadOutcome::Idle),
            Some(Step::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.script.push_front(Step::Data(data.split_off(n)));
                }
                Ok(ReadOutcome::Data(n))
            }
            Some(Step::Idle(count)) => {
                if count > 1 {
                    self.script.push_front(Step::Idle(count - 1));
                }
                Ok(ReadOutcome::Idle)
            }
            Some(Step::Eof) => Ok(ReadOutcome::Eof),
            Some(Step::Fail) => Err(ChannelError::Closed.into()),
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(ChannelError::Closed.into());
        }
        self.writes.push(String::from_utf8_lossy(data).into_owned());
        if let Some((nth, token)) = &self.cancel_on_write {
            if self.writes.len() == *nth {
                token.cancel();
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
