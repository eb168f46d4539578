//! Error types for the request core.
//!
//! # Design
//! Failures fall into two families. [`ConfigError`] is raised while a
//! builder chain is being assembled; it is stored on the snapshot and only
//! surfaced by `execute`. [`RequestError`] is what `execute` returns: a
//! stored configuration error, the timeout sentinel, or a transport failure
//! passed through untouched. A non-2xx status is never an error.

use std::io;

use thiserror::Error;

/// Result alias for execution.
pub type Result<T> = std::result::Result<T, RequestError>;

/// Boxed source error carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure recorded while configuring a builder.
///
/// Only the first one recorded on a chain is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported http method {0:?}")]
    InvalidMethod(String),

    /// `execute` was called on a builder that never had a method set.
    #[error("http method not set")]
    MissingMethod,

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The body encoder rejected the value. No body was set.
    #[error("{format} serialization failed: {message}")]
    Serialization {
        format: &'static str,
        message: String,
    },

    #[error("invalid proxy: {0}")]
    InvalidProxy(String),

    /// The transport has no proxy hook.
    #[error("request: no transport support")]
    NoTransportSupport,
}

/// Errors returned by `RequestBuilder::execute`.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A configuration error recorded earlier on the chain.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured time budget elapsed before the round trip finished.
    #[error("request: request timeout")]
    Timeout,

    /// DNS, connect, TLS and other transport failures, unchanged.
    #[error(transparent)]
    Transport(BoxError),

    /// Reading the response body failed.
    #[error("reading response body: {0}")]
    Body(#[source] io::Error),
}

impl RequestError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout)
    }

    /// The stored configuration error, if this is one.
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            RequestError::Config(e) => Some(e),
            _ => None,
        }
    }
}
