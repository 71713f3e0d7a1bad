//! Structured error types for Plan My Trip
//!
//! `SkillError` is what a single invocation can fail with; `ProviderError`
//! covers the outbound calls made by the handlers.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Error code constants surfaced to the host alongside a failed invocation
pub mod code {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const INVALID: &str = "INVALID";
    pub const NOTFOUND: &str = "NOTFOUND";
    pub const DEPENDENCY: &str = "DEPENDENCY";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Failure of an outbound provider call
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Connection refused, DNS failure, reset, ...
    #[error("connection failed: {message}")]
    Network { message: String },

    /// Client-level timeout elapsed
    #[error("request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Provider answered with a non-success status
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be interpreted at all
    #[error("malformed response body: {reason}")]
    MalformedBody { reason: String },

    /// Call succeeded but carried nothing usable
    #[error("provider returned no usable result")]
    EmptyResult,

    /// Provider credentials are absent from configuration
    #[error("provider not configured: {provider}")]
    NotConfigured { provider: String },
}

impl ProviderError {
    /// Whether the handler should answer with the spoken apology rather than
    /// surfacing the error to the host.
    pub fn is_apologizable(&self) -> bool {
        !matches!(self, Self::MalformedBody { .. })
    }

    /// Build from a transport-level reqwest failure
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout { duration: timeout }
        } else {
            Self::Network {
                message: err.without_url().to_string(),
            }
        }
    }
}

/// Primary error type for one skill invocation
#[derive(Error, Debug)]
pub enum SkillError {
    /// Event was addressed to a different skill
    #[error("application id mismatch: expected {expected}, received {}", received.as_deref().unwrap_or("<none>"))]
    ApplicationIdMismatch {
        expected: String,
        received: Option<String>,
    },

    /// Request type outside launch/intent/session lifecycle
    #[error("unsupported request type")]
    UnsupportedRequest,

    /// No dispatch entry for this intent name
    #[error("unrecognized intent: {name}")]
    UnrecognizedIntent { name: String },

    /// Inbound event JSON did not match the expected shape
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SkillError {
    /// Returns the protocol error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ApplicationIdMismatch { .. } => code::UNAUTHORIZED,
            Self::UnsupportedRequest | Self::MalformedEvent(_) => code::INVALID,
            Self::UnrecognizedIntent { .. } => code::NOTFOUND,
            Self::Provider(ProviderError::Timeout { .. }) => code::TIMEOUT,
            Self::Provider(_) => code::DEPENDENCY,
            Self::Config(_) => code::INTERNAL,
        }
    }

    /// Whether the skill answers this with speech instead of failing the turn
    pub fn is_user_recoverable(&self) -> bool {
        match self {
            Self::UnrecognizedIntent { .. } => true,
            Self::Provider(err) => err.is_apologizable(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for SkillError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedEvent(err.to_string())
    }
}

/// Result type alias using SkillError
pub type Result<T> = std::result::Result<T, SkillError>;
