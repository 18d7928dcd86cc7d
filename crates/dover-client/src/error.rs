//! Transport errors.

use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint URL could not be used.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl {
        /// URL as given.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// HTTP client could not be built.
    #[error("http client setup failed: {0}")]
    Setup(#[from] reqwest::Error),

    /// Channel task is gone.
    #[error("channel closed")]
    Closed,
}
