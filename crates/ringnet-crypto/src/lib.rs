//! # ringnet-crypto
//!
//! Cryptographic primitives for the ringnet overlay.
//!
//! This crate provides:
//! - RSA keypairs and PEM encoding for long-term peer identity
//! - Ring-signature admission tickets and verification
//! - RSA-OAEP envelope encryption for delivering symmetric session material
//! - AES-256-CBC for the per-connection data channel
//! - Deterministic message hashing
//!
//! ## Cryptographic Suite
//!
//! | Function               | Algorithm              |
//! |-------------------------|------------------------|
//! | Long-term identity      | RSA-2048               |
//! | Ring admission           | RSA PKCS#1v1.5-SHA256  |
//! | Session key delivery     | RSA-OAEP-SHA256        |
//! | Data channel              | AES-256-CBC + PKCS#7   |
//! | Message hash              | SHA-256                |

pub mod asymmetric;
pub mod error;
pub mod hash;
pub mod identity;
pub mod symmetric;

pub use error::CryptoError;
pub use identity::Identity;
pub use rsa::{RsaPrivateKey, RsaPublicKey};
pub use symmetric::SessionKey;
