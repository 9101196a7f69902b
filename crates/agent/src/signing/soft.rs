use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use sha2::{Digest, Sha256};

use super::backend::{KeySlot, PivBackend};
use crate::error::AuthError;

/// In-memory stand-in for a hardware PIV token.
///
/// Created from a seed string — the SHA-256 hash of the seed becomes the
/// P-256 scalar — so tests get stable keys without a device. `lock()`
/// simulates a module that is present but refuses to sign.
pub struct SoftToken {
    signing_key: SigningKey,
    locked: bool,
}

impl SoftToken {
    pub fn from_seed(seed: &str) -> Result<Self, AuthError> {
        let hash = Sha256::digest(seed.as_bytes());
        let signing_key = SigningKey::from_bytes((&hash).into())
            .map_err(|e| AuthError::SigningUnavailable(format!("invalid seed: {e}")))?;
        Ok(Self {
            signing_key,
            locked: false,
        })
    }

    /// Lock the token: every subsequent sign or key read fails.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    fn check_unlocked(&self) -> Result<(), AuthError> {
        if self.locked {
            return Err(AuthError::SigningUnavailable("token is locked".into()));
        }
        Ok(())
    }
}

impl PivBackend for SoftToken {
    fn sign(&self, _slot: KeySlot, data: &[u8]) -> Result<Vec<u8>, AuthError> {
        self.check_unlocked()?;
        let signature: Signature = self.signing_key.sign(data);
        Ok(signature.to_bytes().to_vec())
    }

    fn public_key(&self, _slot: KeySlot) -> Result<Vec<u8>, AuthError> {
        self.check_unlocked()?;
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        Ok(ssh_wire_ecdsa_p256(point.as_bytes()))
    }
}

/// SSH wire encoding of a P-256 public key (`ecdsa-sha2-nistp256`), the
/// same blob `pivy-tool pubkey` reports, so fingerprints agree across
/// backends.
fn ssh_wire_ecdsa_p256(sec1_point: &[u8]) -> Vec<u8> {
    let mut blob = Vec::new();
    for field in [
        b"ecdsa-sha2-nistp256".as_slice(),
        b"nistp256".as_slice(),
        sec1_point,
    ] {
        blob.extend_from_slice(&(field.len() as u32).to_be_bytes());
        blob.extend_from_slice(field);
    }
    blob
}
