//! # Asset Bank
//!
//! Thread-safe via a single `parking_lot::RwLock` over the whole bank
//! state. Every mutating operation runs read-validate-update under one
//! write lock, so concurrent callers never observe a partially applied
//! movement.
//!
//! ## Invariants
//!
//! - A transfer never creates or destroys value beyond the registered
//!   transfer tax (the taxed portion is burned, not redistributed).
//! - Capacity never goes negative: [`AssetBank::transfer_from`] fails
//!   before touching balances when the spender's capacity is short.
//! - [`AssetBank::restore`] reinstates exactly the state captured by the
//!   matching [`AssetBank::snapshot`].

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use toll_core::{AccountId, AssetId, Rate};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from asset bank operations.
#[derive(Error, Debug)]
pub enum BankError {
    /// The asset has not been registered with the bank.
    #[error("unknown asset {0}")]
    UnknownAsset(AssetId),

    /// An asset was registered twice.
    #[error("asset {0} is already registered")]
    DuplicateAsset(AssetId),

    /// The sender's balance does not cover the transfer.
    #[error("insufficient balance of {asset} for {account}: required {required}, available {available}")]
    InsufficientBalance {
        /// The asset being moved.
        asset: AssetId,
        /// The account whose balance is short.
        account: AccountId,
        /// The amount the operation required.
        required: u128,
        /// The amount actually available.
        available: u128,
    },

    /// The spender's granted capacity does not cover the pull.
    #[error("insufficient capacity over {asset} granted by {owner} to {spender}: required {required}, available {available}")]
    InsufficientCapacity {
        /// The asset being pulled.
        asset: AssetId,
        /// The account whose balance the capacity draws on.
        owner: AccountId,
        /// The spender holding the capacity.
        spender: AccountId,
        /// The amount the pull required.
        required: u128,
        /// The capacity actually granted.
        available: u128,
    },
}

// ---------------------------------------------------------------------------
// Asset metadata
// ---------------------------------------------------------------------------

/// Registration metadata for an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Human-readable symbol, for diagnostics only.
    pub symbol: String,
    /// Fraction of every transfer burned in transit. [`Rate::ZERO`] for
    /// well-behaved assets.
    pub transfer_tax: Rate,
}

impl AssetInfo {
    /// Metadata for an ordinary, untaxed asset.
    pub fn plain(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            transfer_tax: Rate::ZERO,
        }
    }

    /// Metadata for a deflationary asset burning `tax` of every transfer.
    pub fn taxed(symbol: impl Into<String>, tax: Rate) -> Self {
        Self {
            symbol: symbol.into(),
            transfer_tax: tax,
        }
    }
}

// ---------------------------------------------------------------------------
// Bank state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct BankState {
    assets: HashMap<AssetId, AssetInfo>,
    balances: HashMap<(AssetId, AccountId), u128>,
    capacities: HashMap<(AssetId, AccountId, AccountId), u128>,
}

/// An opaque capture of the entire bank state, used to roll back a
/// sequence of movements as one unit.
#[derive(Debug, Clone)]
pub struct BankSnapshot(BankState);

/// The in-process settlement substrate.
///
/// The native currency is pre-registered at construction under
/// [`AssetId::NATIVE`]; all other assets must be registered before use.
#[derive(Debug)]
pub struct AssetBank {
    state: RwLock<BankState>,
}

impl AssetBank {
    /// Create a bank with only the native currency registered.
    pub fn new() -> Self {
        let mut state = BankState::default();
        state
            .assets
            .insert(AssetId::NATIVE, AssetInfo::plain("NATIVE"));
        Self {
            state: RwLock::new(state),
        }
    }

    /// Register a new asset. Fails on duplicates.
    pub fn register_asset(&self, asset: AssetId, info: AssetInfo) -> Result<(), BankError> {
        let mut state = self.state.write();
        if state.assets.contains_key(&asset) {
            return Err(BankError::DuplicateAsset(asset));
        }
        state.assets.insert(asset, info);
        Ok(())
    }

    /// Registration metadata for an asset, if registered.
    pub fn asset_info(&self, asset: AssetId) -> Option<AssetInfo> {
        self.state.read().assets.get(&asset).cloned()
    }

    /// Credit newly issued units of `asset` to `account`.
    pub fn mint(&self, asset: AssetId, account: AccountId, amount: u128) -> Result<(), BankError> {
        let mut state = self.state.write();
        if !state.assets.contains_key(&asset) {
            return Err(BankError::UnknownAsset(asset));
        }
        let balance = state.balances.entry((asset, account)).or_insert(0);
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    /// Balance of `account` in `asset`.
    pub fn balance_of(&self, asset: AssetId, account: AccountId) -> u128 {
        self.state
            .read()
            .balances
            .get(&(asset, account))
            .copied()
            .unwrap_or(0)
    }

    /// Move `amount` of `asset` from `from` to `to`.
    ///
    /// The sender is debited the full amount; the recipient is credited the
    /// amount minus the asset's transfer tax, which is burned.
    pub fn transfer(
        &self,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), BankError> {
        let mut state = self.state.write();
        Self::transfer_locked(&mut state, asset, from, to, amount)
    }

    /// Grant `spender` a bounded capacity of `amount` over `owner`'s
    /// balance of `asset`. Overwrites any prior grant; zero revokes.
    pub fn approve(
        &self,
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        amount: u128,
    ) -> Result<(), BankError> {
        let mut state = self.state.write();
        if !state.assets.contains_key(&asset) {
            return Err(BankError::UnknownAsset(asset));
        }
        if amount == 0 {
            state.capacities.remove(&(asset, owner, spender));
        } else {
            state.capacities.insert((asset, owner, spender), amount);
        }
        Ok(())
    }

    /// Remaining capacity granted by `owner` to `spender` over `asset`.
    pub fn capacity(&self, asset: AssetId, owner: AccountId, spender: AccountId) -> u128 {
        self.state
            .read()
            .capacities
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or(0)
    }

    /// Pull `amount` of `asset` from `from` to `to`, consuming `spender`'s
    /// granted capacity.
    ///
    /// Capacity burns down by the full pulled amount regardless of any
    /// transfer tax applied to the balance movement.
    pub fn transfer_from(
        &self,
        asset: AssetId,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), BankError> {
        let mut state = self.state.write();
        let available = state
            .capacities
            .get(&(asset, from, spender))
            .copied()
            .unwrap_or(0);
        if available < amount {
            return Err(BankError::InsufficientCapacity {
                asset,
                owner: from,
                spender,
                required: amount,
                available,
            });
        }
        Self::transfer_locked(&mut state, asset, from, to, amount)?;
        let remaining = available - amount;
        if remaining == 0 {
            state.capacities.remove(&(asset, from, spender));
        } else {
            state.capacities.insert((asset, from, spender), remaining);
        }
        Ok(())
    }

    /// Capture the entire bank state.
    pub fn snapshot(&self) -> BankSnapshot {
        BankSnapshot(self.state.read().clone())
    }

    /// Reinstate a previously captured state, discarding every movement
    /// since the snapshot.
    pub fn restore(&self, snapshot: BankSnapshot) {
        *self.state.write() = snapshot.0;
    }

    fn transfer_locked(
        state: &mut BankState,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), BankError> {
        let info = state
            .assets
            .get(&asset)
            .cloned()
            .ok_or(BankError::UnknownAsset(asset))?;
        let available = state.balances.get(&(asset, from)).copied().unwrap_or(0);
        if available < amount {
            return Err(BankError::InsufficientBalance {
                asset,
                account: from,
                required: amount,
                available,
            });
        }
        let burned = info.transfer_tax.apply(amount);
        let delivered = amount - burned;
        state.balances.insert((asset, from), available - amount);
        let credit = state.balances.entry((asset, to)).or_insert(0);
        *credit = credit.saturating_add(delivered);
        Ok(())
    }
}

impl Default for AssetBank {
    fn default() -> Self {
        Self::new()
    }
}
