use crate::endpoint::EndpointError;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum CloudcraftError {
    /// Invalid client configuration, detected before any request is sent.
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    /// The caller's cancellation token fired before the call completed.
    #[error("request canceled")]
    Canceled,
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// Every attempt failed at the transport level.
    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Number of physical sends performed.
        attempts: usize,
        /// Transport error of the last attempt.
        #[source]
        source: reqwest::Error,
    },
    /// Non-success HTTP status code.
    #[error("request failed with status code {status}")]
    RequestFailed { status: u16 },
    /// Failure while reading the body of the final response.
    #[error("cannot read response body: {0}")]
    Body(#[source] reqwest::Error),
    /// Response decoding error.
    #[error("decode error: {0}")]
    Decode(String),
    /// A list response did not carry the expected envelope key.
    #[error("key '{key}' not found in response")]
    MissingKey { key: &'static str },
    /// A required argument was empty.
    #[error("{field} cannot be empty")]
    InvalidArgument { field: &'static str },
}

impl CloudcraftError {
    /// Returns the HTTP status carried by [`CloudcraftError::RequestFailed`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` when the call ended because of cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Configuration errors surfaced at client construction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing endpoint scheme")]
    MissingScheme,
    #[error("missing endpoint host")]
    MissingHost,
    #[error("missing API key")]
    MissingKey,
    #[error("invalid API key; length must be {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
    #[error("API key contains characters not allowed in a header")]
    InvalidKeyFormat,
    #[error("min retry delay must not exceed max retry delay")]
    InvalidRetryDelays,
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    /// The underlying HTTP client could not be built.
    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
