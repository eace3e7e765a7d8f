//! RSA primitives: PEM encoding, envelope encryption, and signing.
//!
//! The wire protocol hands symmetric session material and message bodies
//! across the network as RSA-encrypted/signed blobs. This module is the
//! thin layer over the `rsa` crate that produces exactly those shapes:
//! OAEP-SHA256 for encryption, PKCS#1v1.5-SHA256 for signing.

use crate::error::{CryptoError, Result};
use rand_core::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::sha2::Sha256;
use rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

/// Default modulus size for freshly generated keypairs.
pub const KEY_BITS: usize = 2048;

/// Generate a fresh RSA keypair.
pub fn generate_keypair() -> Result<(RsaPrivateKey, RsaPublicKey)> {
    let private_key =
        RsaPrivateKey::new(&mut OsRng, KEY_BITS).map_err(|e| CryptoError::KeyGen(e.to_string()))?;
    let public_key = RsaPublicKey::from(&private_key);
    Ok((private_key, public_key))
}

/// Encode a public key as PEM, the shape carried in a HELO `publicKey` field.
pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String> {
    key.to_pkcs1_pem(rsa::pkcs8::LineEnding::LF)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Decode a PEM-encoded public key.
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Encode a private key as PEM, for persisting a generated identity.
pub fn private_key_to_pem(key: &RsaPrivateKey) -> Result<String> {
    key.to_pkcs1_pem(rsa::pkcs8::LineEnding::LF)
        .map(|p| p.to_string())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Decode a PEM-encoded private key.
pub fn private_key_from_pem(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Encrypt `plaintext` for the holder of `public_key` (OAEP-SHA256).
///
/// Used to deliver the fresh `tx_key`/`tx_iv` session material in a TRUSTED
/// message body, encrypted so only the receiving peer can recover it.
pub fn encrypt_for(public_key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| CryptoError::Asymmetric(e.to_string()))
}

/// Decrypt a blob produced by [`encrypt_for`] using our own private key.
pub fn decrypt_own(private_key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    private_key
        .decrypt(Oaep::new::<Sha256>(), ciphertext)
        .map_err(|e| CryptoError::Asymmetric(e.to_string()))
}

/// Sign `message` with `private_key` (PKCS#1v1.5-SHA256).
///
/// Used both by the ring authority to issue a peer's admission ticket and
/// by a peer to sign outgoing message bodies.
pub fn sign(private_key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>> {
    let digest = <Sha256 as sha2::Digest>::digest(message);
    private_key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|e| CryptoError::Asymmetric(e.to_string()))
}

/// Verify a signature produced by [`sign`].
pub fn verify(public_key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let digest = <Sha256 as sha2::Digest>::digest(message);
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        .map_err(|_| CryptoError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let (sk, pk) = generate_keypair().unwrap();
        let msg = b"session key material";
        let ct = encrypt_for(&pk, msg).unwrap();
        assert_ne!(ct, msg);
        let pt = decrypt_own(&sk, &ct).unwrap();
        assert_eq!(pt, msg);
    }

    #[test]
    fn sign_verify_roundtrip() {
        let (sk, pk) = generate_keypair().unwrap();
        let msg = b"a message body";
        let sig = sign(&sk, msg).unwrap();
        assert!(verify(&pk, msg, &sig).is_ok());
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let (sk, _pk) = generate_keypair().unwrap();
        let (_sk2, pk2) = generate_keypair().unwrap();
        let msg = b"a message body";
        let sig = sign(&sk, msg).unwrap();
        assert!(verify(&pk2, msg, &sig).is_err());
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let (sk, pk) = generate_keypair().unwrap();
        let sig = sign(&sk, b"original").unwrap();
        assert!(verify(&pk, b"tampered", &sig).is_err());
    }

    #[test]
    fn pem_roundtrip_public_key() {
        let (_sk, pk) = generate_keypair().unwrap();
        let pem = public_key_to_pem(&pk).unwrap();
        let parsed = public_key_from_pem(&pem).unwrap();
        assert_eq!(pk, parsed);
    }

    #[test]
    fn pem_roundtrip_private_key() {
        let (sk, _pk) = generate_keypair().unwrap();
        let pem = private_key_to_pem(&sk).unwrap();
        let parsed = private_key_from_pem(&pem).unwrap();
        assert_eq!(sk, parsed);
    }
}
