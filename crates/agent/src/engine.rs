use std::sync::Arc;

use crate::clock::Clock;
use crate::error::AuthError;
use crate::header::{AuthorizationHeader, SignatureAlgorithm};
use crate::signing::{
    AsymmetricSigner, KeyIdentityResolver, KeySlot, PivBackend, RecoveryTokenSigner,
    SignableString, SigningScheme,
};

/// A KBMAPI operation the agent can authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetPin,
    RegisterPivtoken,
    ReplacePivtoken,
    NewRtoken,
}

impl Operation {
    /// Which key material authenticates this operation. Replacement is the
    /// one case where the hardware key being rotated out cannot vouch for
    /// itself, so the recovery token does instead.
    pub fn scheme(self) -> SigningScheme {
        match self {
            Operation::ReplacePivtoken => SigningScheme::Symmetric,
            Operation::GetPin | Operation::RegisterPivtoken | Operation::NewRtoken => {
                SigningScheme::Asymmetric
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::GetPin => "get-pin",
            Operation::RegisterPivtoken => "register-pivtoken",
            Operation::ReplacePivtoken => "replace-pivtoken",
            Operation::NewRtoken => "new-rtoken",
        }
    }
}

/// Material for the symmetric scheme: the GUID of the token being replaced
/// (the header's `keyId`) and the recovery token issued for it.
#[derive(Debug, Clone)]
pub struct RecoveryCredentials {
    pub guid: String,
    pub token: String,
}

/// The header pair attached to a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    pub date: String,
    pub authorization: String,
}

/// Composition root of the signing core.
///
/// Stateless across invocations; each call:
/// 1. captures one timestamp,
/// 2. builds the signable string from it,
/// 3. signs under the scheme the operation demands,
/// 4. returns the `(Date, Authorization)` pair.
///
/// Errors propagate unchanged; no retry, no suppression.
pub struct SigningEngine {
    clock: Box<dyn Clock>,
    backend: Arc<dyn PivBackend>,
    slot: KeySlot,
}

impl SigningEngine {
    pub fn new(clock: Box<dyn Clock>, backend: Arc<dyn PivBackend>, slot: KeySlot) -> Self {
        Self {
            clock,
            backend,
            slot,
        }
    }

    /// Produce the signed header pair for `operation`. The symmetric scheme
    /// requires `recovery`; a missing, empty, or undecodable token fails
    /// with [`AuthError::InvalidToken`] before anything is signed.
    pub fn request_headers(
        &self,
        operation: Operation,
        recovery: Option<&RecoveryCredentials>,
    ) -> Result<RequestHeaders, AuthError> {
        let timestamp = self.clock.rfc1123_now();
        let signable = SignableString::new(&timestamp);
        tracing::debug!(operation = operation.as_str(), %timestamp, "signing request");

        let header = match operation.scheme() {
            SigningScheme::Asymmetric => {
                let signature =
                    AsymmetricSigner::new(self.backend.clone(), self.slot).sign(&signable)?;
                let key_id =
                    KeyIdentityResolver::new(self.backend.clone(), self.slot).resolve()?;
                AuthorizationHeader::new(key_id, SignatureAlgorithm::EcdsaSha256, signature)
            }
            SigningScheme::Symmetric => {
                let credentials = recovery.ok_or_else(|| {
                    AuthError::InvalidToken("recovery token required for replace-pivtoken".into())
                })?;
                let signature = RecoveryTokenSigner::new(&credentials.token)?.sign(&signable);
                AuthorizationHeader::new(
                    credentials.guid.clone(),
                    SignatureAlgorithm::HmacSha256,
                    signature,
                )
            }
        };

        Ok(RequestHeaders {
            date: timestamp,
            authorization: header.render(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::SoftToken;

    #[test]
    fn replace_is_symmetric_everything_else_asymmetric() {
        assert_eq!(Operation::ReplacePivtoken.scheme(), SigningScheme::Symmetric);
        for op in [
            Operation::GetPin,
            Operation::RegisterPivtoken,
            Operation::NewRtoken,
        ] {
            assert_eq!(op.scheme(), SigningScheme::Asymmetric);
        }
    }

    #[test]
    fn symmetric_without_credentials_is_invalid_token() {
        let engine = SigningEngine::new(
            Box::new(crate::clock::FixedClock(
                "Tue, 01 Jan 2019 00:00:00 GMT".into(),
            )),
            Arc::new(SoftToken::from_seed("test-seed").unwrap()),
            KeySlot::KEY_MANAGEMENT,
        );
        let err = engine
            .request_headers(Operation::ReplacePivtoken, None)
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
