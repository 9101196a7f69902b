use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// A one-byte PIV slot identifier, written as two hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySlot(u8);

impl KeySlot {
    /// Slot `9e`, where a node's key-management key lives.
    pub const KEY_MANAGEMENT: KeySlot = KeySlot(0x9e);
}

impl fmt::Display for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

impl FromStr for KeySlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u8::from_str_radix(s, 16)
            .map(KeySlot)
            .map_err(|_| format!("invalid PIV slot {s:?} (expected two hex digits, e.g. 9e)"))
    }
}

/// The hardware signing module boundary.
///
/// Implementations are sync — a sign is one short blocking call into the
/// device or its driver, and the driver owns serialization of concurrent
/// access. The slot is passed explicitly so the same backend serves any
/// slot and the core stays testable against [`SoftToken`](super::SoftToken).
pub trait PivBackend: Send + Sync {
    /// Sign `data` with the private key in `slot`. Returns raw signature
    /// bytes.
    fn sign(&self, slot: KeySlot, data: &[u8]) -> Result<Vec<u8>, AuthError>;

    /// The SSH wire-format public-key blob for `slot`.
    fn public_key(&self, slot: KeySlot) -> Result<Vec<u8>, AuthError>;
}
