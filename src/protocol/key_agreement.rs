//! Key agreement collaborator.
//!
//! The packet core only consumes a 32-byte session key. This module defines the
//! seam through which that key is produced and ships an ephemeral X25519
//! implementation of it. Nonce exchange, replay protection and version
//! negotiation belong to whatever handshake drives these calls.

use crate::config::KEY_LEN;
use crate::error::{constants, ProtocolError, Result};
use crate::utils::crypto::KeyMaterial;
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};
use x25519_dalek::{EphemeralSecret, PublicKey};
use zeroize::Zeroize;

/// Domain separation label mixed into the derived session key
const SESSION_KEY_LABEL: &[u8] = b"tranquility-session-key";

/// Produces a shared symmetric key from a local secret and a peer's public key.
pub trait KeyAgreement {
    /// Public key to send to the peer
    fn public_key(&self) -> [u8; 32];

    /// Consume the local secret and derive the shared session key.
    fn derive_shared_key(self, peer_public: &[u8; 32]) -> Result<KeyMaterial>;
}

/// One-shot X25519 agreement; the secret is consumed by derivation.
pub struct X25519KeyAgreement {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl X25519KeyAgreement {
    /// Generate a fresh ephemeral key pair from the OS RNG.
    #[instrument]
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        debug!("Generated ephemeral X25519 key pair");
        Self { secret, public }
    }
}

impl Default for X25519KeyAgreement {
    fn default() -> Self {
        Self::generate()
    }
}

impl KeyAgreement for X25519KeyAgreement {
    fn public_key(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    #[instrument(skip(self, peer_public))]
    fn derive_shared_key(self, peer_public: &[u8; 32]) -> Result<KeyMaterial> {
        let shared = self.secret.diffie_hellman(&PublicKey::from(*peer_public));
        if !shared.was_contributory() {
            warn!("Rejected low-order peer public key");
            return Err(ProtocolError::SecurityError(
                constants::ERR_LOW_ORDER_POINT.into(),
            ));
        }

        let key = session_key(shared.as_bytes());
        debug!("Derived session key");
        Ok(key)
    }
}

/// `SHA-256(shared || label)`; the intermediate digest is wiped before returning.
fn session_key(shared: &[u8; 32]) -> KeyMaterial {
    let mut hasher = Sha256::new();
    hasher.update(shared);
    hasher.update(SESSION_KEY_LABEL);
    let mut digest: [u8; KEY_LEN] = hasher.finalize().into();
    let key = KeyMaterial::new(digest);
    digest.zeroize();
    key
}
