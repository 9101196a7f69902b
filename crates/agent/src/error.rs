/// Failures of the request-signing core.
///
/// The CLI and HTTP layers wrap these in `anyhow` with context; nothing
/// here is retried or downgraded, and a signing failure aborts the
/// operation before any request is dispatched.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The hardware module is absent, locked, or rejected the slot.
    #[error("signing hardware unavailable: {0}")]
    SigningUnavailable(String),
    /// The recovery token is missing, empty, or not valid base64.
    #[error("invalid recovery token: {0}")]
    InvalidToken(String),
}
