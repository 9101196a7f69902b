use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use md5::{Digest, Md5};

use super::SignableString;
use super::backend::{KeySlot, PivBackend};
use crate::error::AuthError;

/// Signs the canonical string with the hardware-held private key.
pub struct AsymmetricSigner {
    backend: Arc<dyn PivBackend>,
    slot: KeySlot,
}

impl AsymmetricSigner {
    pub fn new(backend: Arc<dyn PivBackend>, slot: KeySlot) -> Self {
        Self { backend, slot }
    }

    /// Raw device signature, re-encoded as one-line base64.
    pub fn sign(&self, signable: &SignableString) -> Result<String, AuthError> {
        let raw = self.backend.sign(self.slot, signable.as_bytes())?;
        Ok(BASE64.encode(raw))
    }
}

/// Derives the `keyId` for the asymmetric scheme: the MD5 fingerprint of
/// the slot's public key, rendered as colon-free lowercase hex.
///
/// The digest is computed from the key blob itself, not parsed out of a
/// rendered `MD5:aa:bb:...` fingerprint, so there is no algorithm-name
/// prefix to strip and no text format to break. Recomputed per request
/// rather than cached, so a replaced token is picked up on the next call.
pub struct KeyIdentityResolver {
    backend: Arc<dyn PivBackend>,
    slot: KeySlot,
}

impl KeyIdentityResolver {
    pub fn new(backend: Arc<dyn PivBackend>, slot: KeySlot) -> Self {
        Self { backend, slot }
    }

    pub fn resolve(&self) -> Result<String, AuthError> {
        let blob = self.backend.public_key(self.slot)?;
        Ok(hex::encode(Md5::digest(&blob)))
    }
}
