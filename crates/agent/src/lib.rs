pub mod clock;
pub mod engine;
pub mod error;
pub mod header;
pub mod kbmapi;
pub mod signing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{Operation, RecoveryCredentials, RequestHeaders, SigningEngine};
pub use error::AuthError;
pub use header::{AuthorizationHeader, SignatureAlgorithm};
pub use kbmapi::{KbmapiClient, PivtokenRegistration, TokenGrant};
pub use signing::{
    AsymmetricSigner, KeyIdentityResolver, KeySlot, PivBackend, PivyTool, RecoveryTokenSigner,
    SignableString, SigningScheme, SoftToken,
};
