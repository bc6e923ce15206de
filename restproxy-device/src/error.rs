//! Error type shared by the transport, the streams and the reservation call.

use std::time::Duration;

/// Coarse classification of a [`ProxyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// URL, body or request could not be constructed (misconfiguration)
    RequestBuild,
    /// Network failure, cancellation or timeout
    Transport,
    /// Backend answered with a status >= 400
    Remote,
    /// Response body was not the expected JSON
    Decode,
    /// Plugin configuration could not be parsed
    Config,
}

/// Errors raised while talking to the REST backend
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to build request to {endpoint}: {reason}")]
    RequestBuild { endpoint: String, reason: String },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {endpoint} was cancelled")]
    Cancelled { endpoint: String },
    #[error("request to {endpoint} timed out after {timeout:?}")]
    TimedOut { endpoint: String, timeout: Duration },
    #[error("request to {endpoint} failed: got status {status}")]
    Remote {
        endpoint: String,
        status: u16,
        /// Response body, when the backend sent JSON along with the failure
        body: Option<serde_json::Value>,
    },
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::RequestBuild { .. } => ErrorKind::RequestBuild,
            ProxyError::Transport { .. }
            | ProxyError::Cancelled { .. }
            | ProxyError::TimedOut { .. } => ErrorKind::Transport,
            ProxyError::Remote { .. } => ErrorKind::Remote,
            ProxyError::Decode { .. } => ErrorKind::Decode,
            ProxyError::Config(_) => ErrorKind::Config,
        }
    }

    /// True when the error comes from the caller's cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProxyError::Cancelled { .. })
    }

    /// JSON body the backend sent with a failing status, if any
    pub fn remote_body(&self) -> Option<&serde_json::Value> {
        match self {
            ProxyError::Remote { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
