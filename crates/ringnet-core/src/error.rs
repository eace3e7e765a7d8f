//! Error types for the peer runtime.
//!
//! Configuration errors are fatal at startup, admission/session failures
//! drop the offending connection or frame without escalating, and
//! transport failures drive reconnect.

use std::borrow::Cow;
use thiserror::Error;

/// Errors that can occur in peer operations.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Missing or invalid identity material; terminates startup.
    #[error("configuration error: {0}")]
    Config(Cow<'static, str>),

    /// A HELO failed ring verification, parsed badly, or was self-origin.
    /// The connection is closed; no event is emitted.
    #[error("admission rejected: {0}")]
    Admission(Cow<'static, str>),

    /// Decryption or signature verification failed on a data frame. The
    /// frame is dropped; the connection stays open.
    #[error("session error: {0}")]
    Session(Cow<'static, str>),

    /// Abnormal connection close or a dial/accept failure.
    #[error("transport error: {0}")]
    Transport(Cow<'static, str>),

    /// Cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Message (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Peer not present in the peer table.
    #[error("peer not found")]
    PeerNotFound,
}

impl PeerError {
    /// Configuration errors are always fatal at startup.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, PeerError::Config(_))
    }

    /// Transport failures are the only category that should drive a
    /// reconnect attempt; everything else is either fatal or already
    /// contained to a single frame/connection.
    #[must_use]
    pub fn should_retry(&self) -> bool {
        matches!(self, PeerError::Transport(_))
    }

    /// Build a configuration error with static context.
    #[must_use]
    pub const fn config(context: &'static str) -> Self {
        PeerError::Config(Cow::Borrowed(context))
    }

    /// Build an admission error with static context.
    #[must_use]
    pub const fn admission(context: &'static str) -> Self {
        PeerError::Admission(Cow::Borrowed(context))
    }

    /// Build a session error with static context.
    #[must_use]
    pub const fn session(context: &'static str) -> Self {
        PeerError::Session(Cow::Borrowed(context))
    }

    /// Build a transport error with static context.
    #[must_use]
    pub const fn transport(context: &'static str) -> Self {
        PeerError::Transport(Cow::Borrowed(context))
    }
}

impl From<ringnet_crypto::CryptoError> for PeerError {
    fn from(err: ringnet_crypto::CryptoError) -> Self {
        PeerError::Crypto(err.to_string())
    }
}

impl From<ringnet_transport::TransportError> for PeerError {
    fn from(err: ringnet_transport::TransportError) -> Self {
        PeerError::Transport(Cow::Owned(err.to_string()))
    }
}

impl From<serde_json::Error> for PeerError {
    fn from(err: serde_json::Error) -> Self {
        PeerError::Serialization(err.to_string())
    }
}

/// Result type for peer runtime operations.
pub type Result<T> = std::result::Result<T, PeerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_fatal() {
        assert!(PeerError::config("missing ring signature").is_fatal());
        assert!(!PeerError::transport("closed").is_fatal());
    }

    #[test]
    fn only_transport_errors_retry() {
        assert!(PeerError::transport("abnormal close").should_retry());
        assert!(!PeerError::admission("bad signature").should_retry());
        assert!(!PeerError::session("decrypt failed").should_retry());
        assert!(!PeerError::config("bad key").should_retry());
    }
}
