//! Peer identity: a long-term RSA keypair plus the ring authority's
//! signature admitting that keypair into the ring.

use crate::asymmetric::{self};
use crate::error::{CryptoError, Result};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// A peer's long-term keypair, its ring-signed admission ticket, and the
/// ring authority's public key used to verify other peers' tickets.
///
/// Invariant (checked by [`Identity::new`]): `ring_public_key.verify(public_key,
/// ring_signature)` holds. A peer whose own ticket does not verify refuses
/// to start.
#[derive(Clone)]
pub struct Identity {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    ring_signature: Vec<u8>,
    ring_public_key: RsaPublicKey,
}

impl Identity {
    /// Build an identity, enforcing the admission invariant up front.
    pub fn new(
        private_key: RsaPrivateKey,
        public_key: RsaPublicKey,
        ring_signature: Vec<u8>,
        ring_public_key: RsaPublicKey,
    ) -> Result<Self> {
        let encoded = asymmetric::public_key_to_pem(&public_key)?;
        asymmetric::verify(&ring_public_key, encoded.as_bytes(), &ring_signature)
            .map_err(|_| CryptoError::InvalidSignature)?;
        Ok(Self {
            private_key,
            public_key,
            ring_signature,
            ring_public_key,
        })
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn ring_signature(&self) -> &[u8] {
        &self.ring_signature
    }

    pub fn ring_public_key(&self) -> &RsaPublicKey {
        &self.ring_public_key
    }

    /// Verify a *peer's* claimed public key and ring signature, as received
    /// in a HELO frame.
    pub fn verify_peer(&self, peer_public_key: &RsaPublicKey, peer_signature: &[u8]) -> Result<()> {
        let encoded = asymmetric::public_key_to_pem(peer_public_key)?;
        asymmetric::verify(&self.ring_public_key, encoded.as_bytes(), peer_signature)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("ring_signature_len", &self.ring_signature.len())
            .finish()
    }
}

/// Stand-in for the out-of-scope ring-authority tool: issues an admission
/// ticket for a peer's public key. Production deployments run this as a
/// separate, offline keygen/signing utility; it lives here only so tests
/// and local development can mint a working ring without that tool.
pub fn issue_ring_signature(
    ring_private_key: &RsaPrivateKey,
    peer_public_key: &RsaPublicKey,
) -> Result<Vec<u8>> {
    let encoded = asymmetric::public_key_to_pem(peer_public_key)?;
    asymmetric::sign(ring_private_key, encoded.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asymmetric::generate_keypair;

    fn build_ring_identity() -> (Identity, RsaPrivateKey) {
        let (ring_sk, ring_pk) = generate_keypair().unwrap();
        let (sk, pk) = generate_keypair().unwrap();
        let sig = issue_ring_signature(&ring_sk, &pk).unwrap();
        let identity = Identity::new(sk, pk, sig, ring_pk).unwrap();
        (identity, ring_sk)
    }

    #[test]
    fn admits_correctly_signed_identity() {
        let (_identity, _ring_sk) = build_ring_identity();
    }

    #[test]
    fn rejects_identity_with_wrong_ring_signature() {
        let (_ring_sk, ring_pk) = generate_keypair().unwrap();
        let (other_ring_sk, _other_ring_pk) = generate_keypair().unwrap();
        let (sk, pk) = generate_keypair().unwrap();
        // Signed by the wrong authority.
        let bad_sig = issue_ring_signature(&other_ring_sk, &pk).unwrap();
        assert!(Identity::new(sk, pk, bad_sig, ring_pk).is_err());
    }

    #[test]
    fn verify_peer_accepts_valid_ticket() {
        let (identity, ring_sk) = build_ring_identity();
        let (peer_sk, peer_pk) = generate_keypair().unwrap();
        let peer_sig = issue_ring_signature(&ring_sk, &peer_pk).unwrap();
        drop(peer_sk);
        assert!(identity.verify_peer(&peer_pk, &peer_sig).is_ok());
    }

    #[test]
    fn verify_peer_rejects_foreign_ring() {
        let (identity, _ring_sk) = build_ring_identity();
        let (foreign_ring_sk, _foreign_ring_pk) = generate_keypair().unwrap();
        let (_peer_sk, peer_pk) = generate_keypair().unwrap();
        let peer_sig = issue_ring_signature(&foreign_ring_sk, &peer_pk).unwrap();
        assert!(identity.verify_peer(&peer_pk, &peer_sig).is_err());
    }
}
