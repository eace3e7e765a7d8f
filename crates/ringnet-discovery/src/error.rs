//! Error types for ringnet-discovery.

use thiserror::Error;

/// Errors produced while processing the discovery queue.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A candidate address could not be parsed.
    #[error("invalid candidate address: {0}")]
    InvalidAddress(String),
}

/// Result type for ringnet-discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
