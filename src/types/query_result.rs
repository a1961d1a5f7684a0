use serde_json::Value;

use crate::error::Error;

/// The normalized outcome of one dispatched query.
///
/// Both arms carry the payload shown in the debug view: the full decoded
/// response on success, an error description on failure.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// The endpoint produced an answer, possibly empty.
    Success {
        /// Text to reveal to the user.
        answer_text: String,
        /// The full decoded response.
        raw_payload: Value,
    },
    /// The exchange failed.
    Failure {
        /// Human-readable description of what went wrong.
        error_message: String,
        /// Error kind, message, and whatever was received.
        raw_payload: Value,
    },
}

impl QueryResult {
    /// Build a success result.
    pub fn success(answer_text: impl Into<String>, raw_payload: Value) -> Self {
        QueryResult::Success {
            answer_text: answer_text.into(),
            raw_payload,
        }
    }

    /// Build a failure result.
    pub fn failure(error_message: impl Into<String>, raw_payload: Value) -> Self {
        QueryResult::Failure {
            error_message: error_message.into(),
            raw_payload,
        }
    }

    /// Returns true for the success arm.
    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success { .. })
    }

    /// The payload retained for the debug view.
    pub fn raw_payload(&self) -> &Value {
        match self {
            QueryResult::Success { raw_payload, .. } => raw_payload,
            QueryResult::Failure { raw_payload, .. } => raw_payload,
        }
    }
}

impl From<Error> for QueryResult {
    fn from(err: Error) -> Self {
        QueryResult::failure(err.to_string(), err.debug_payload())
    }
}
