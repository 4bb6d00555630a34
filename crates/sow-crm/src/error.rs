//! Error types for the CRM client.

use thiserror::Error;

/// Result type for CRM operations.
pub type CrmResult<T> = Result<T, CrmError>;

/// Errors produced by the CRM client layer.
///
/// Expected failure modes of the remote API are normalized into dedicated
/// variants so callers can match on them instead of parsing strings. The
/// `Api` variant carries everything else the CRM returned, including the
/// structured `propertyName` hint some endpoints attach to their error body.
#[derive(Debug, Error)]
pub enum CrmError {
    /// Client-side configuration problem (missing token, bad base URL).
    #[error("invalid CRM client configuration: {0}")]
    InvalidConfig(String),

    /// Transport-level failure (connection refused, TLS, request timeout).
    #[error("CRM transport error: {0}")]
    Network(#[from] reqwest::Error),

    /// An operation exceeded its explicit timeout ceiling.
    #[error("{label} timed out after {seconds}s")]
    Timeout { label: String, seconds: u64 },

    /// The requested resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The resource already exists (HTTP 409). During provisioning this is
    /// the expected "already present" outcome, not a failure.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authentication failed (HTTP 401).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The CRM rate-limited the request (HTTP 429).
    #[error("rate limited by CRM (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// A 2xx response carried a body that could not be deserialized.
    #[error("failed to parse CRM response: {0}")]
    Parse(String),

    /// Any other non-2xx API error.
    #[error("CRM API error (HTTP {status}): {detail}")]
    Api {
        status: u16,
        detail: String,
        /// `propertyName` attribute from the error body, when present.
        property_hint: Option<String>,
    },
}
