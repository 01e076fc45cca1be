//! Lifecycle states of a monitoring session.

use std::fmt;

/// Where a monitoring session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    ChannelOpen,
    PagingDisabled,
    Polling,
    /// Reading the output that follows the sentinel newline.
    Draining,
    Closed,
    Failed,
}

impl SessionState {
    /// `Closed` and `Failed` are final.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Authenticating => "authenticating",
            SessionState::ChannelOpen => "channel open",
            SessionState::PagingDisabled => "paging disabled",
            SessionState::Polling => "polling",
            SessionState::Draining => "draining",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}
