//! Error types for ringnet-crypto

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key generation failed.
    #[error("key generation failed: {0}")]
    KeyGen(String),

    /// A PEM or DER key failed to parse.
    #[error("invalid key encoding: {0}")]
    InvalidKey(String),

    /// A signature did not verify.
    #[error("signature verification failed")]
    InvalidSignature,

    /// Asymmetric (RSA) encryption or decryption failed.
    #[error("asymmetric cipher error: {0}")]
    Asymmetric(String),

    /// Symmetric (AES-CBC) encryption or decryption failed.
    #[error("symmetric cipher error: {0}")]
    Symmetric(String),

    /// A base64 payload failed to decode.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type for ringnet-crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
