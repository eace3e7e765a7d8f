//! Loads (or, for the private key, generates) the identity files named in
//! [`crate::config::IdentityPaths`] and builds a verified
//! [`ringnet_crypto::Identity`].

use crate::config::IdentityPaths;
use crate::error::{PeerError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ringnet_crypto::asymmetric;
use ringnet_crypto::Identity;
use std::path::Path;
use tracing::{info, warn};

/// Load the identity described by `paths`, generating a fresh 2048-bit
/// keypair and writing it to `paths.private_key`/`paths.public_key` if the
/// private key file is absent.
///
/// A missing `ring_public_key` or `signature` file is fatal: the ring
/// authority's collaborators are assumed already provisioned.
pub fn load_or_generate(paths: &IdentityPaths) -> Result<Identity> {
    let (private_key, public_key) = if paths.private_key.exists() {
        let private_key = read_private_key(&paths.private_key)?;
        let public_key = if paths.public_key.exists() {
            read_public_key(&paths.public_key)?
        } else {
            private_key.to_public_key()
        };
        (private_key, public_key)
    } else {
        info!(path = %paths.private_key.display(), "no private key found, generating a fresh identity");
        let (private_key, public_key) = asymmetric::generate_keypair()?;
        write_private_key(&paths.private_key, &private_key)?;
        write_public_key(&paths.public_key, &public_key)?;
        (private_key, public_key)
    };

    if !paths.ring_public_key.exists() {
        return Err(PeerError::config("missing ring authority public key file"));
    }
    if !paths.signature.exists() {
        return Err(PeerError::config("missing ring admission signature file"));
    }

    let ring_public_key = read_public_key(&paths.ring_public_key)?;
    let ring_signature = read_signature(&paths.signature)?;

    Identity::new(private_key, public_key, ring_signature, ring_public_key).map_err(|e| {
        warn!("own ring signature failed to verify; refusing to start");
        PeerError::Config(format!("ring signature does not verify own public key: {e}").into())
    })
}

fn read_private_key(path: &Path) -> Result<rsa::RsaPrivateKey> {
    let pem = std::fs::read_to_string(path)
        .map_err(|e| PeerError::Config(format!("reading {}: {e}", path.display()).into()))?;
    Ok(asymmetric::private_key_from_pem(&pem)?)
}

fn read_public_key(path: &Path) -> Result<rsa::RsaPublicKey> {
    let pem = std::fs::read_to_string(path)
        .map_err(|e| PeerError::Config(format!("reading {}: {e}", path.display()).into()))?;
    Ok(asymmetric::public_key_from_pem(&pem)?)
}

fn read_signature(path: &Path) -> Result<Vec<u8>> {
    let encoded = std::fs::read_to_string(path)
        .map_err(|e| PeerError::Config(format!("reading {}: {e}", path.display()).into()))?;
    BASE64
        .decode(encoded.trim())
        .map_err(|e| PeerError::Config(format!("invalid base64 signature in {}: {e}", path.display()).into()))
}

fn write_private_key(path: &Path, key: &rsa::RsaPrivateKey) -> Result<()> {
    let pem = asymmetric::private_key_to_pem(key)?;
    std::fs::write(path, pem)
        .map_err(|e| PeerError::Config(format!("writing {}: {e}", path.display()).into()))
}

fn write_public_key(path: &Path, key: &rsa::RsaPublicKey) -> Result<()> {
    let pem = asymmetric::public_key_to_pem(key)?;
    std::fs::write(path, pem)
        .map_err(|e| PeerError::Config(format!("writing {}: {e}", path.display()).into()))
}
