//! # Fee Ledger
//!
//! Pure accounting: accrued-but-unwithdrawn fee balances keyed by asset
//! and beneficiary. The ledger never moves funds — the dispatcher credits
//! it after a verified dispatch and pays out what collection operations
//! drain.
//!
//! ## Invariants
//!
//! - Entries are non-negative by construction (`u128`).
//! - [`FeeLedger::drain`] empties an entry to exactly zero and returns the
//!   prior value; draining an absent entry is a no-op returning zero, so
//!   collection is idempotent and never fails.
//! - Solvency — per asset, the sum of all entries never exceeds the
//!   engine's custodied balance — is maintained by the dispatcher, which
//!   only credits amounts it has just taken into custody.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use toll_core::{AccountId, AssetId};

/// Who an accrued fee belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Beneficiary {
    /// The platform operator.
    Platform,
    /// A revenue-sharing integrator.
    Integrator(AccountId),
}

impl std::fmt::Display for Beneficiary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Platform => write!(f, "platform"),
            Self::Integrator(id) => write!(f, "integrator:{}", id.as_uuid()),
        }
    }
}

/// Accrued fee balances per `(asset, beneficiary)`.
#[derive(Debug, Default)]
pub struct FeeLedger {
    entries: DashMap<(AssetId, Beneficiary), u128>,
}

impl FeeLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accrue `amount` to a beneficiary. Crediting zero is a no-op and
    /// creates no entry.
    pub fn credit(&self, asset: AssetId, beneficiary: Beneficiary, amount: u128) {
        if amount == 0 {
            return;
        }
        let mut entry = self.entries.entry((asset, beneficiary)).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// The accrued balance for a beneficiary.
    pub fn balance_of(&self, asset: AssetId, beneficiary: Beneficiary) -> u128 {
        self.entries
            .get(&(asset, beneficiary))
            .map(|e| *e)
            .unwrap_or(0)
    }

    /// Zero an entry and return its prior value. Returns zero (and never
    /// fails) when the entry is absent.
    pub fn drain(&self, asset: AssetId, beneficiary: Beneficiary) -> u128 {
        self.entries
            .remove(&(asset, beneficiary))
            .map(|(_, v)| v)
            .unwrap_or(0)
    }

    /// Sum of all accrued entries for an asset, across beneficiaries.
    pub fn total_accrued(&self, asset: AssetId) -> u128 {
        self.entries
            .iter()
            .filter(|e| e.key().0 == asset)
            .fold(0u128, |acc, e| acc.saturating_add(*e.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_accumulates() {
        let ledger = FeeLedger::new();
        let asset = AssetId::new();
        ledger.credit(asset, Beneficiary::Platform, 100);
        ledger.credit(asset, Beneficiary::Platform, 50);
        assert_eq!(ledger.balance_of(asset, Beneficiary::Platform), 150);
    }

    #[test]
    fn credit_zero_creates_no_entry() {
        let ledger = FeeLedger::new();
        let asset = AssetId::new();
        ledger.credit(asset, Beneficiary::Platform, 0);
        assert_eq!(ledger.total_accrued(asset), 0);
    }

    #[test]
    fn drain_returns_prior_value_and_zeroes() {
        let ledger = FeeLedger::new();
        let asset = AssetId::new();
        let integrator = Beneficiary::Integrator(AccountId::new());
        ledger.credit(asset, integrator, 777);

        assert_eq!(ledger.drain(asset, integrator), 777);
        assert_eq!(ledger.balance_of(asset, integrator), 0);
    }

    #[test]
    fn drain_on_empty_is_zero_not_error() {
        let ledger = FeeLedger::new();
        assert_eq!(ledger.drain(AssetId::new(), Beneficiary::Platform), 0);
    }

    #[test]
    fn beneficiaries_are_independent() {
        let ledger = FeeLedger::new();
        let asset = AssetId::new();
        let a = Beneficiary::Integrator(AccountId::new());
        let b = Beneficiary::Integrator(AccountId::new());
        ledger.credit(asset, a, 10);
        ledger.credit(asset, b, 20);
        ledger.credit(asset, Beneficiary::Platform, 30);

        assert_eq!(ledger.balance_of(asset, a), 10);
        assert_eq!(ledger.balance_of(asset, b), 20);
        assert_eq!(ledger.total_accrued(asset), 60);

        ledger.drain(asset, a);
        assert_eq!(ledger.total_accrued(asset), 50);
    }
}
