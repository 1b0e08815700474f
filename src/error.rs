//! Error types for the Uni-Supply client framework.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EnrichmentError>;

/// Unified error type covering configuration, transport, and enrichment
/// failures.
///
/// Variants are intentionally coarse-grained so that callers can match on error
/// *category* (e.g. retryable vs permanent) rather than on supplier-specific
/// details.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// Invalid or missing client configuration (bad base URL, zero timeout,
    /// missing credentials, etc.). The only class allowed to fail fast at
    /// construction time.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested supplier name is not present in the registry.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    /// An enrichment capability was requested that the supplier does not
    /// declare as supported.
    #[error("Capability not supported: {0}")]
    Unsupported(String),

    /// An unclassified HTTP error from a supplier API (4xx other than
    /// 401/429). Not retried.
    #[error("API error: {0}")]
    ApiError(String),

    /// The supplier returned a payload that could not be parsed or was
    /// missing required fields. Not retried.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The supplier returned HTTP 429. Carries the `Retry-After` hint in
    /// seconds when the server provided one.
    #[error("Rate limited")]
    RateLimited {
        /// Server-provided wait hint from the `Retry-After` header.
        retry_after_secs: Option<u64>,
    },

    /// The supplier returned HTTP 401/403 (bad, missing, or expired
    /// credentials). Triggers one re-authentication attempt, then fatal.
    #[error("Unauthorized")]
    Unauthorized,

    /// The request exceeded its configured timeout.
    #[error("Timeout")]
    Timeout,

    /// A connection-level failure (DNS, refused, reset) before any HTTP
    /// status was received.
    #[error("Network error: {0}")]
    Network(String),

    /// The supplier is currently unavailable (HTTP 5xx).
    #[error("Unavailable")]
    Unavailable,
}

impl EnrichmentError {
    /// Returns `true` for transient errors that may succeed on retry:
    /// [`RateLimited`](Self::RateLimited), [`Timeout`](Self::Timeout),
    /// [`Network`](Self::Network), and [`Unavailable`](Self::Unavailable).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout | Self::Network(_) | Self::Unavailable
        )
    }
}
