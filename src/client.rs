use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, header};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS};
use crate::types::{QueryRequest, QueryResponse};

/// Where the retrieval service listens by default.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/query";

/// Answers are generated by a multi-stage pipeline, so this is generous.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the query endpoint.
#[derive(Debug, Clone)]
pub struct QueryClient {
    client: ReqwestClient,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl QueryClient {
    /// Create a new client for `endpoint` with the default timeout.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_options(endpoint, Some(DEFAULT_TIMEOUT))
    }

    /// Create a new client with custom settings.
    ///
    /// A `timeout` of `None` lets a request wait indefinitely.
    pub fn with_options(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::validation(
                format!("unsupported scheme `{}`", endpoint.scheme()),
                Some("endpoint".to_string()),
            ));
        }

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// The URL queries are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Create and return default headers for query requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Post a query and decode the answer.
    ///
    /// On success returns the typed response together with the full decoded
    /// JSON, which the caller keeps for inspection.
    pub async fn query(&self, request: &QueryRequest) -> Result<(QueryResponse, Value)> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.send(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match &result {
            Ok((response, _)) => debug!(
                endpoint = %self.endpoint,
                answer_len = response.generated_answer.len(),
                results = response.results.len(),
                "query answered"
            ),
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                warn!(endpoint = %self.endpoint, kind = err.kind(), error = %err, "query failed");
            }
        }
        result
    }

    async fn send(&self, request: &QueryRequest) -> Result<(QueryResponse, Value)> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.default_headers())
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(process_error_response(status.as_u16(), body));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(body.clone()),
                Some(Box::new(e)),
            )
        })?;
        let response = QueryResponse::from_value(&value)?;
        Ok((response, value))
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }
}

/// Convert a non-success response into an [`Error::Api`].
///
/// The retrieval service reports problems as `{"error": "..."}`; anything
/// else is passed through verbatim.
fn process_error_response(status_code: u16, body: String) -> Error {
    let parsed = serde_json::from_str::<Value>(&body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
        })
        .map(String::from)
        .unwrap_or_else(|| body.clone());
    let received = parsed.unwrap_or(Value::String(body));
    Error::api(status_code, message, Some(received))
}
