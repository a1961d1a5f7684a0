use serde::{Deserialize, Serialize};

use crate::params::QueryParameters;

/// The JSON body posted to the query endpoint.
///
/// The endpoint falls back to its own defaults for any tuning field that is
/// absent, so those are skipped rather than sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's question.
    pub query: String,

    /// How many reformulated queries to fan out to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_n: Option<u32>,

    /// How many reranked results to keep.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Weight between keyword (0.0) and vector (1.0) search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,

    /// Stable identifier of the chat session.
    pub user_id: String,
}

impl QueryRequest {
    /// Create a request carrying only the query and session identifier.
    pub fn new(query: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            multi_n: None,
            top_k: None,
            alpha: None,
            user_id: user_id.into(),
        }
    }

    /// Attach every tuning parameter from a snapshot.
    pub fn with_parameters(mut self, params: &QueryParameters) -> Self {
        self.multi_n = Some(params.fan_out);
        self.top_k = Some(params.result_count);
        self.alpha = Some(params.hybrid_weight);
        self
    }
}
