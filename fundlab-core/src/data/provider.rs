//! Page fetcher trait and structured fetch errors.

use thiserror::Error;

/// Structured errors for a single page fetch.
///
/// Fetch failures are per-entity: the caller records them and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out fetching {address}")]
    Timeout { address: String },

    #[error("unreachable: {address}: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("HTTP {status} for {address}")]
    HttpStatus { address: String, status: u16 },
}

impl FetchError {
    /// Short stable identifier used in logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "fetch_timeout",
            Self::Unreachable { .. } => "fetch_unreachable",
            Self::HttpStatus { .. } => "fetch_http_status",
        }
    }
}

/// Retrieves the raw content behind an address.
///
/// Implementations carry their own bounded wait; there is no retry policy.
pub trait PageFetcher: Send + Sync {
    /// Human-readable name of this fetcher.
    fn name(&self) -> &str;

    /// Fetch the raw body at `address`.
    fn fetch(&self, address: &str) -> Result<String, FetchError>;
}
