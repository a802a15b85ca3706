//! # Account Identities
//!
//! Accounts are opaque 32-byte identities supplied by the host ledger. The
//! engine only ever compares them for equality; it never authenticates them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{EngineError, Result};

/// Domain tag hashed to obtain the escrow account identity.
const ESCROW_DOMAIN_TAG: &str = "updown/escrow/v1";

/// A 32-byte ledger account identity, written as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; 32]);

impl AccountId {
    /// Derive a deterministic identity as the SHA256 of `label`.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(label.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    /// The engine's own escrow account, where all stakes are held.
    pub fn escrow() -> Self {
        Self::from_label(ESCROW_DOMAIN_TAG)
    }

    pub fn is_escrow(&self) -> bool {
        *self == Self::escrow()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse an identity from its 64-character hex form.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| {
            EngineError::InvalidParameter(format!("Account id is not valid hex: {e}"))
        })?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            EngineError::InvalidParameter(format!(
                "Account id must be 32 bytes, got {}",
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix keeps log lines readable
        write!(f, "AccountId({}..)", &self.to_hex()[..8])
    }
}

impl FromStr for AccountId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_is_deterministic() {
        let a = AccountId::from_label("alice");
        let b = AccountId::from_label("alice");
        assert_eq!(a, b);
        assert_ne!(a, AccountId::from_label("bob"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let id = AccountId::from_label("alice");
        let hex = id.to_string();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hex.parse::<AccountId>().unwrap(), id);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(
            AccountId::from_hex("not hex"),
            Err(EngineError::InvalidParameter(_))
        ));
        assert!(matches!(
            AccountId::from_hex("abcd"),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_escrow_identity() {
        let escrow = AccountId::escrow();
        assert!(escrow.is_escrow());
        assert!(!AccountId::from_label("alice").is_escrow());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let id = AccountId::from_label("oracle");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
