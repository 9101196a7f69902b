use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::SignableString;
use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Signs the canonical string with a shared-secret recovery token.
///
/// The token arrives as base64 text and is decoded exactly once here; the
/// decoded bytes key an HMAC-SHA256 over the signable bytes. Deterministic:
/// the same (token, timestamp) pair always yields the same tag.
#[derive(Debug)]
pub struct RecoveryTokenSigner {
    key: Zeroizing<Vec<u8>>,
}

impl RecoveryTokenSigner {
    /// Fails with [`AuthError::InvalidToken`] on an empty or undecodable
    /// token, before any signing is attempted.
    pub fn new(token_b64: &str) -> Result<Self, AuthError> {
        let trimmed = token_b64.trim();
        if trimmed.is_empty() {
            return Err(AuthError::InvalidToken("token is empty".into()));
        }
        let key = BASE64
            .decode(trimmed)
            .map_err(|e| AuthError::InvalidToken(format!("not valid base64: {e}")))?;
        Ok(Self {
            key: Zeroizing::new(key),
        })
    }

    /// One-line base64 HMAC-SHA256 tag over the signable bytes.
    pub fn sign(&self, signable: &SignableString) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(signable.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }
}
