//! Error types for querychat.
//!
//! Every failure the query pipeline can hit is described by [`Error`].  Errors
//! never escape the chat session: the dispatcher folds them into a
//! [`QueryResult::Failure`](crate::types::QueryResult) carrying the
//! [`Error::debug_payload`] so there is always something to inspect.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

use serde_json::{Value, json};

/// The main error type for querychat.
#[derive(Clone, Debug)]
pub enum Error {
    /// The endpoint answered with a non-success HTTP status.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Human-readable error message.
        message: String,
        /// The body the endpoint sent back, decoded as JSON when possible.
        body: Option<Value>,
    },

    /// The request did not complete in time.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// The request was abandoned before it completed.
    Abort {
        /// Human-readable error message.
        message: String,
    },

    /// The endpoint could not be reached.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// HTTP client error not covered by `Timeout` or `Connection`.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// The response body was not valid JSON.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The raw body, when it was read.
        body: Option<String>,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// The response was JSON but lacked a usable answer.
    MalformedResponse {
        /// Human-readable error message.
        message: String,
        /// What the endpoint actually sent.
        received: Value,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// A URL parsing error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },

    /// A configuration value failed validation.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },
}

impl Error {
    /// Creates a new API error.
    pub fn api(status_code: u16, message: impl Into<String>, body: Option<Value>) -> Self {
        Error::Api {
            status_code,
            message: message.into(),
            body,
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new abort error.
    pub fn abort(message: impl Into<String>) -> Self {
        Error::Abort {
            message: message.into(),
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        body: Option<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            body,
            source: source.map(Arc::from),
        }
    }

    /// Creates a new malformed response error.
    pub fn malformed_response(message: impl Into<String>, received: Value) -> Self {
        Error::MalformedResponse {
            message: message.into(),
            received,
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if this error is an abort.
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Abort { .. })
    }

    /// Returns true if this error is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Returns true if the endpoint answered but not with a usable reply.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::MalformedResponse { .. } | Error::Serialization { .. }
        )
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// A stable snake_case tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Api { .. } => "api",
            Error::Timeout { .. } => "timeout",
            Error::Abort { .. } => "abort",
            Error::Connection { .. } => "connection",
            Error::HttpClient { .. } => "http_client",
            Error::Serialization { .. } => "serialization",
            Error::MalformedResponse { .. } => "malformed_response",
            Error::Io { .. } => "io",
            Error::Url { .. } => "url",
            Error::Validation { .. } => "validation",
        }
    }

    /// Describes the error as JSON for the debug view.
    ///
    /// The object always has `error` (the [`kind`](Self::kind)) and `message`;
    /// `status` and `received` are added when the endpoint sent something back.
    pub fn debug_payload(&self) -> Value {
        let mut payload = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        match self {
            Error::Api {
                status_code, body, ..
            } => {
                payload["status"] = json!(status_code);
                if let Some(body) = body {
                    payload["received"] = body.clone();
                }
            }
            Error::Serialization {
                body: Some(body), ..
            } => {
                payload["received"] = Value::String(body.clone());
            }
            Error::MalformedResponse { received, .. } => {
                payload["received"] = received.clone();
            }
            _ => {}
        }
        payload
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                status_code,
                message,
                ..
            } => {
                write!(f, "API error ({status_code}): {message}")
            }
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Abort { message } => {
                write!(f, "Request aborted: {message}")
            }
            Error::Connection { message, .. } => {
                write!(f, "Connection error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::MalformedResponse { message, .. } => {
                write!(f, "Malformed response: {message}")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), None, Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

/// A specialized Result type for querychat operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_payload_has_kind_and_message() {
        let err = Error::connection("connection refused", None);
        let payload = err.debug_payload();
        assert_eq!(payload["error"], "connection");
        assert_eq!(payload["message"], "Connection error: connection refused");
        assert!(payload.get("received").is_none());
    }

    #[test]
    fn malformed_payload_keeps_received_shape() {
        let received = json!({"answer": "wrong field"});
        let err = Error::malformed_response("missing generated_answer", received.clone());
        assert!(err.is_malformed());
        let payload = err.debug_payload();
        assert_eq!(payload["error"], "malformed_response");
        assert_eq!(payload["received"], received);
    }

    #[test]
    fn api_payload_carries_status() {
        let err = Error::api(400, "Missing 'query'", Some(json!({"error": "Missing 'query'"})));
        assert_eq!(err.status_code(), Some(400));
        let payload = err.debug_payload();
        assert_eq!(payload["status"], 400);
        assert_eq!(payload["received"]["error"], "Missing 'query'");
    }

    #[test]
    fn serialization_payload_keeps_raw_body() {
        let err = Error::serialization("expected value", Some("<html>".to_string()), None);
        assert_eq!(err.debug_payload()["received"], "<html>");
    }

    #[test]
    fn abort_payload_has_kind() {
        let err = Error::abort("interrupted");
        assert!(err.is_abort());
        assert_eq!(err.debug_payload()["error"], "abort");
        assert_eq!(err.to_string(), "Request aborted: interrupted");
    }

    #[test]
    fn timeout_display_includes_duration() {
        let err = Error::timeout("request timed out", Some(30.0));
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Timeout error: request timed out (30 seconds)"
        );
    }
}
