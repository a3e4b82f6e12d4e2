//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the Tollgate stack.
//! UUID-based identifiers ([`AccountId`], [`AssetId`]) are always valid by
//! construction; [`ChainId`] is a plain network ordinal.
//!
//! The native currency of the host network is represented by the sentinel
//! [`AssetId::NATIVE`] (the nil UUID), so the fee ledger and the asset bank
//! key native holdings exactly like any other asset.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Account identifier
// ---------------------------------------------------------------------------

/// A unique identifier for any party the engine interacts with: callers,
/// integrators, provider routers and gateways, fee recipients, and the
/// engine's own custody account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Create a new random account identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an account identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AccountId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "account:{}", self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// Asset identifier
// ---------------------------------------------------------------------------

/// A unique identifier for a fungible asset managed by the asset bank.
///
/// The host network's native currency is [`AssetId::NATIVE`]; every other
/// asset gets a random identifier at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(Uuid);

impl AssetId {
    /// The sentinel identifier for the network's native currency.
    pub const NATIVE: AssetId = AssetId(Uuid::nil());

    /// Create a new random asset identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an asset identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Whether this identifier is the native-currency sentinel.
    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AssetId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_native() {
            write!(f, "asset:native")
        } else {
            write!(f, "asset:{}", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Chain identifier
// ---------------------------------------------------------------------------

/// Ordinal of a destination network for cross-network dispatches.
///
/// Opaque to the engine — it is recorded on dispatch receipts and forwarded
/// to providers, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chain:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_ids_are_unique() {
        assert_ne!(AccountId::new(), AccountId::new());
    }

    #[test]
    fn native_sentinel_is_nil_uuid() {
        assert!(AssetId::NATIVE.is_native());
        assert!(AssetId::NATIVE.as_uuid().is_nil());
        assert!(!AssetId::new().is_native());
    }

    #[test]
    fn display_prefixes() {
        let account = AccountId::new();
        assert!(account.to_string().starts_with("account:"));
        assert_eq!(AssetId::NATIVE.to_string(), "asset:native");
        assert_eq!(ChainId(228).to_string(), "chain:228");
    }

    #[test]
    fn account_id_serde_round_trip() {
        let id = AccountId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        let back: AccountId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, back);
    }
}
