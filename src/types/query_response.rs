use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::RetrievedDocument;

/// The decoded reply from the query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The answer text to show the user.  May be empty.
    pub generated_answer: String,

    /// Pipeline timings and intermediate data, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Value>,

    /// Documents the answer was grounded on.
    #[serde(default)]
    pub results: Vec<RetrievedDocument>,
}

impl QueryResponse {
    /// Decode a response from its raw JSON.
    ///
    /// Only `generated_answer` is load-bearing: a missing or non-string answer
    /// is a [`Error::MalformedResponse`] that keeps the received value.  If the
    /// answer is present but the auxiliary fields have an unexpected shape they
    /// are dropped rather than failing the exchange.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(answer) = value.get("generated_answer").and_then(Value::as_str) else {
            return Err(Error::malformed_response(
                "response has no string `generated_answer` field",
                value.clone(),
            ));
        };
        match serde_json::from_value::<QueryResponse>(value.clone()) {
            Ok(response) => Ok(response),
            Err(err) => {
                warn!(error = %err, "ignoring unexpected auxiliary fields in query response");
                Ok(QueryResponse {
                    generated_answer: answer.to_string(),
                    report: value.get("report").cloned(),
                    results: Vec::new(),
                })
            }
        }
    }
}
