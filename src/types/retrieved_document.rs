use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document the retrieval pipeline used to ground its answer.
///
/// Every field is optional; the chat only ever displays these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        rename = "abstract",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Value>,

    /// Score from hybrid search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_score: Option<f64>,

    /// Score from the reranker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reranker_score: Option<f64>,

    /// Leading excerpt of the document body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}
