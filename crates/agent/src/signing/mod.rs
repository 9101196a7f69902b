mod asymmetric;
mod backend;
mod pivy;
mod soft;
mod symmetric;

pub use asymmetric::{AsymmetricSigner, KeyIdentityResolver};
pub use backend::{KeySlot, PivBackend};
pub use pivy::PivyTool;
pub use soft::SoftToken;
pub use symmetric::RecoveryTokenSigner;

/// Which key material authenticates a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningScheme {
    /// Hardware-held private key, `ecdsa-sha256`.
    Asymmetric,
    /// Shared-secret recovery token, `hmac-sha256`.
    Symmetric,
}

/// The canonical byte sequence that gets signed: `date: <timestamp>`.
///
/// The timestamp is the exact value sent in the request's `Date` header, so
/// the verifier can rebuild this string from the request alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignableString(String);

impl SignableString {
    pub fn new(timestamp: &str) -> Self {
        Self(format!("date: {timestamp}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}
