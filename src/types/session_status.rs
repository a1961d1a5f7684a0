use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the chat session is in its request/response lifecycle.
///
/// Exactly one value holds at any time.  Anything other than `Idle` disables
/// input and shows a loading indicator.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Ready for a new submission.
    #[default]
    Idle,
    /// A query is in flight.
    AwaitingResponse,
    /// The answer arrived and is being revealed.
    Revealing,
}

impl SessionStatus {
    /// Returns true if the session accepts submissions.
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionStatus::Idle)
    }

    /// Returns true if input should be disabled.
    pub fn is_busy(&self) -> bool {
        !self.is_idle()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::AwaitingResponse => "awaiting_response",
            SessionStatus::Revealing => "revealing",
        };
        write!(f, "{s}")
    }
}
