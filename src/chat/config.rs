//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML
//! settings file, and the resolved [`ChatConfig`] a session is built from.
//! Command-line values override file values, which override the defaults.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;
use url::Url;

use crate::client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::error::{Error, Result};
use crate::params::QueryParameters;
use crate::reveal::{DEFAULT_CHUNK_CHARS, DEFAULT_TICK_INTERVAL};

/// Identifier sent with each query when none is configured.
pub const DEFAULT_USER_ID: &str = "guest";

/// Command-line arguments for the querychat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Endpoint queries are posted to.
    #[arrrg(optional, "Query endpoint URL (default: http://localhost:5000/query)", "URL")]
    pub endpoint: Option<String>,

    /// Stable identifier sent with every query.
    #[arrrg(optional, "Session identifier sent with each query (default: guest)", "ID")]
    pub user_id: Option<String>,

    #[arrrg(optional, "Reranked results to use, 1-20 (default: 5)", "N")]
    pub top_k: Option<u32>,

    #[arrrg(optional, "Reformulated queries to fan out to, 1-10 (default: 5)", "N")]
    pub multi_n: Option<u32>,

    /// Hybrid search weight.  Kept as text so the arguments stay `Eq`.
    #[arrrg(optional, "Hybrid search weight 0.0-1.0 (default: 0.6)", "ALPHA")]
    pub alpha: Option<String>,

    #[arrrg(optional, "Milliseconds between reveal ticks (default: 8)", "MS")]
    pub reveal_interval_ms: Option<u64>,

    #[arrrg(optional, "Characters revealed per tick (default: 1)", "N")]
    pub reveal_chunk: Option<usize>,

    #[arrrg(optional, "Request timeout in seconds, 0 waits forever (default: 120)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// YAML file supplying defaults for the options above.
    #[arrrg(optional, "YAML settings file", "FILE")]
    pub config: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Why [`ChatArgs`] could not be turned into a [`ChatConfig`].
#[derive(Debug, Clone)]
pub enum ChatArgsError {
    /// `--alpha` was not a finite number.
    InvalidAlpha(String),
    /// The settings file or endpoint was rejected.
    Config(Error),
}

impl fmt::Display for ChatArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatArgsError::InvalidAlpha(value) => {
                write!(f, "--alpha expects a number between 0.0 and 1.0, got `{value}`")
            }
            ChatArgsError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ChatArgsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatArgsError::Config(err) => Some(err),
            ChatArgsError::InvalidAlpha(_) => None,
        }
    }
}

impl From<Error> for ChatArgsError {
    fn from(err: Error) -> Self {
        ChatArgsError::Config(err)
    }
}

/// Settings as they appear in a YAML file.  Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChatConfigFile {
    endpoint: Option<String>,
    user_id: Option<String>,
    top_k: Option<u32>,
    multi_n: Option<u32>,
    alpha: Option<f64>,
    reveal_interval_ms: Option<u64>,
    reveal_chunk: Option<usize>,
    timeout_secs: Option<u64>,
    color: Option<bool>,
}

/// Configuration for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// URL queries are posted to.
    pub endpoint: String,

    /// Identifier sent as `user_id` with each query.
    pub user_id: String,

    /// Initial parameter values; clamped when the session is created.
    pub parameters: QueryParameters,

    /// Time between reveal ticks.
    pub reveal_interval: Duration,

    /// Characters added per reveal tick.
    pub reveal_chunk_chars: usize,

    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: http://localhost:5000/query
    /// - User id: guest
    /// - Parameters: top_k 5, multi_n 5, alpha 0.6
    /// - Reveal: one character every 8ms
    /// - Timeout: 120s
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            parameters: QueryParameters::default(),
            reveal_interval: DEFAULT_TICK_INTERVAL,
            reveal_chunk_chars: DEFAULT_CHUNK_CHARS,
            timeout: Some(DEFAULT_TIMEOUT),
            use_color: true,
        }
    }

    /// Loads a YAML settings file on top of the defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read {}", path.display()), err)
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parses YAML settings on top of the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ChatConfigFile = serde_yaml::from_str(content).map_err(|err| {
            Error::validation(format!("invalid settings file: {err}"), None)
        })?;
        Ok(Self::new().merge_file(file))
    }

    fn merge_file(mut self, file: ChatConfigFile) -> Self {
        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(user_id) = file.user_id {
            self.user_id = user_id;
        }
        if let Some(top_k) = file.top_k {
            self.parameters.result_count = top_k;
        }
        if let Some(multi_n) = file.multi_n {
            self.parameters.fan_out = multi_n;
        }
        if let Some(alpha) = file.alpha {
            self.parameters.hybrid_weight = alpha;
        }
        if let Some(ms) = file.reveal_interval_ms {
            self.reveal_interval = Duration::from_millis(ms);
        }
        if let Some(chunk) = file.reveal_chunk {
            self.reveal_chunk_chars = chunk;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = timeout_from_secs(secs);
        }
        if let Some(color) = file.color {
            self.use_color = color;
        }
        self
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the session identifier.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Sets the initial parameters.
    pub fn with_parameters(mut self, parameters: QueryParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Sets the time between reveal ticks.
    pub fn with_reveal_interval(mut self, interval: Duration) -> Self {
        self.reveal_interval = interval;
        self
    }

    /// Sets the characters added per reveal tick.
    pub fn with_reveal_chunk_chars(mut self, chunk: usize) -> Self {
        self.reveal_chunk_chars = chunk;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = ChatArgsError;

    fn try_from(args: ChatArgs) -> std::result::Result<Self, Self::Error> {
        let mut config = match &args.config {
            Some(path) => ChatConfig::from_yaml_file(path)?,
            None => ChatConfig::new(),
        };

        if let Some(endpoint) = args.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(user_id) = args.user_id {
            config.user_id = user_id;
        }
        if let Some(top_k) = args.top_k {
            config.parameters.result_count = top_k;
        }
        if let Some(multi_n) = args.multi_n {
            config.parameters.fan_out = multi_n;
        }
        if let Some(alpha) = args.alpha {
            match alpha.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => config.parameters.hybrid_weight = value,
                _ => return Err(ChatArgsError::InvalidAlpha(alpha)),
            }
        }
        if let Some(ms) = args.reveal_interval_ms {
            config.reveal_interval = Duration::from_millis(ms);
        }
        if let Some(chunk) = args.reveal_chunk {
            config.reveal_chunk_chars = chunk;
        }
        if let Some(secs) = args.timeout_secs {
            config.timeout = timeout_from_secs(secs);
        }
        if args.no_color {
            config.use_color = false;
        }

        Url::parse(&config.endpoint).map_err(Error::from)?;
        config.parameters = config.parameters.clamped();
        Ok(config)
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}
