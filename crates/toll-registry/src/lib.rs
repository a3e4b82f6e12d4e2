//! # toll-registry — Provider Allow-Listing
//!
//! The dispatch engine only ever asks one question of the whitelist:
//! *is this call target approved?* That question is the
//! [`ProviderDirectory`] trait; the storage strategy behind it is
//! interchangeable at construction time:
//!
//! - **Embedded**: each dispatcher owns a private [`EmbeddedWhitelist`].
//! - **Shared**: several dispatcher instances hold the same
//!   `Arc<EmbeddedWhitelist>` (or any other [`ProviderDirectory`]
//!   implementation hosted elsewhere), so one registry mutation is visible
//!   to all of them.
//!
//! Mutations are role-gated at the dispatcher surface, not here — the
//! directory itself is pure storage.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use toll_core::AccountId;

/// Errors from whitelist mutations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The address is already an active entry.
    #[error("provider {0} is already whitelisted")]
    DuplicateProvider(AccountId),

    /// The address is not an active entry.
    #[error("provider {0} is not whitelisted")]
    UnknownProvider(AccountId),
}

/// The single capability the dispatcher relies on, plus the mutations a
/// Manager drives through it.
pub trait ProviderDirectory: Send + Sync {
    /// Whether `target` is an approved external call target.
    fn is_available(&self, target: AccountId) -> bool;

    /// Add an active entry. Fails on duplicates.
    fn add(&self, target: AccountId) -> Result<(), RegistryError>;

    /// Remove an active entry. Fails if absent.
    fn remove(&self, target: AccountId) -> Result<(), RegistryError>;

    /// Enumerate the active entries, in no particular order.
    fn list(&self) -> Vec<AccountId>;
}

/// In-memory whitelist backed by `DashMap`.
#[derive(Debug, Default)]
pub struct EmbeddedWhitelist {
    entries: DashMap<AccountId, ()>,
}

impl EmbeddedWhitelist {
    /// Create an empty whitelist.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProviderDirectory for EmbeddedWhitelist {
    fn is_available(&self, target: AccountId) -> bool {
        self.entries.contains_key(&target)
    }

    fn add(&self, target: AccountId) -> Result<(), RegistryError> {
        if self.entries.insert(target, ()).is_some() {
            return Err(RegistryError::DuplicateProvider(target));
        }
        Ok(())
    }

    fn remove(&self, target: AccountId) -> Result<(), RegistryError> {
        self.entries
            .remove(&target)
            .map(|_| ())
            .ok_or(RegistryError::UnknownProvider(target))
    }

    fn list(&self) -> Vec<AccountId> {
        self.entries.iter().map(|e| *e.key()).collect()
    }
}

// A shared registry handle is just the same directory behind an `Arc`.
impl<T: ProviderDirectory + ?Sized> ProviderDirectory for Arc<T> {
    fn is_available(&self, target: AccountId) -> bool {
        (**self).is_available(target)
    }

    fn add(&self, target: AccountId) -> Result<(), RegistryError> {
        (**self).add(target)
    }

    fn remove(&self, target: AccountId) -> Result<(), RegistryError> {
        (**self).remove(target)
    }

    fn list(&self) -> Vec<AccountId> {
        (**self).list()
    }
}
