//! # toll-access — Capability Registry
//!
//! Flat capability sets, not a hierarchy: the Admin identity and the
//! Manager set are independent tables checked per operation. Holding Admin
//! does not satisfy a Manager check (and vice versa) — operations that need
//! both must pass both. The constructor seeds the initial Admin into the
//! Manager set so a freshly constructed engine is fully operable by its
//! deployer; a later [`AccessController::transfer_admin`] moves only the
//! Admin identity.
//!
//! There is exactly one Admin at all times. Admin handoff is atomic — the
//! old identity loses the capability in the same operation that the new
//! one gains it.

use std::collections::HashSet;

use parking_lot::RwLock;
use thiserror::Error;

use toll_core::AccountId;

/// Errors from capability checks.
#[derive(Error, Debug)]
pub enum AccessError {
    /// The caller does not hold the Admin capability.
    #[error("{0} is not an admin")]
    NotAnAdmin(AccountId),

    /// The caller does not hold the Manager capability.
    #[error("{0} is not a manager")]
    NotAManager(AccountId),
}

#[derive(Debug)]
struct RoleState {
    admin: AccountId,
    managers: HashSet<AccountId>,
}

/// Holds the single Admin identity and the Manager set.
#[derive(Debug)]
pub struct AccessController {
    state: RwLock<RoleState>,
}

impl AccessController {
    /// Create a registry with `admin` holding Admin and, initially, also
    /// Manager.
    pub fn new(admin: AccountId) -> Self {
        let mut managers = HashSet::new();
        managers.insert(admin);
        Self {
            state: RwLock::new(RoleState { admin, managers }),
        }
    }

    /// Whether `id` is the current Admin.
    pub fn is_admin(&self, id: AccountId) -> bool {
        self.state.read().admin == id
    }

    /// Whether `id` is in the Manager set.
    pub fn is_manager(&self, id: AccountId) -> bool {
        self.state.read().managers.contains(&id)
    }

    /// Fail with [`AccessError::NotAnAdmin`] unless `caller` is the Admin.
    pub fn require_admin(&self, caller: AccountId) -> Result<(), AccessError> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(AccessError::NotAnAdmin(caller))
        }
    }

    /// Fail with [`AccessError::NotAManager`] unless `caller` is a Manager.
    pub fn require_manager(&self, caller: AccountId) -> Result<(), AccessError> {
        if self.is_manager(caller) {
            Ok(())
        } else {
            Err(AccessError::NotAManager(caller))
        }
    }

    /// Fail unless `caller` holds at least one of the two capabilities.
    pub fn require_admin_or_manager(&self, caller: AccountId) -> Result<(), AccessError> {
        if self.is_admin(caller) || self.is_manager(caller) {
            Ok(())
        } else {
            Err(AccessError::NotAManager(caller))
        }
    }

    /// Add `id` to the Manager set. Admin only. Idempotent.
    pub fn grant_manager(&self, caller: AccountId, id: AccountId) -> Result<(), AccessError> {
        self.require_admin(caller)?;
        self.state.write().managers.insert(id);
        Ok(())
    }

    /// Remove `id` from the Manager set. Admin only. Idempotent.
    pub fn revoke_manager(&self, caller: AccountId, id: AccountId) -> Result<(), AccessError> {
        self.require_admin(caller)?;
        self.state.write().managers.remove(&id);
        Ok(())
    }

    /// Atomically replace the Admin identity. Admin only.
    pub fn transfer_admin(&self, caller: AccountId, new_admin: AccountId) -> Result<(), AccessError> {
        let mut state = self.state.write();
        if state.admin != caller {
            return Err(AccessError::NotAnAdmin(caller));
        }
        state.admin = new_admin;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_seeds_admin_as_manager() {
        let admin = AccountId::new();
        let access = AccessController::new(admin);
        assert!(access.is_admin(admin));
        assert!(access.is_manager(admin));
    }

    #[test]
    fn grant_and_revoke_manager() {
        let admin = AccountId::new();
        let manager = AccountId::new();
        let access = AccessController::new(admin);

        access.grant_manager(admin, manager).expect("grant");
        assert!(access.is_manager(manager));

        access.revoke_manager(admin, manager).expect("revoke");
        assert!(!access.is_manager(manager));
    }

    #[test]
    fn only_admin_mutates_managers() {
        let admin = AccountId::new();
        let outsider = AccountId::new();
        let access = AccessController::new(admin);

        let err = access.grant_manager(outsider, outsider).unwrap_err();
        assert!(matches!(err, AccessError::NotAnAdmin(_)));
        assert!(!access.is_manager(outsider));
    }

    #[test]
    fn admin_transfer_is_atomic_handoff() {
        let admin = AccountId::new();
        let next = AccountId::new();
        let access = AccessController::new(admin);

        access.transfer_admin(admin, next).expect("transfer");
        assert!(!access.is_admin(admin));
        assert!(access.is_admin(next));

        // The old admin cannot transfer it back.
        let err = access.transfer_admin(admin, admin).unwrap_err();
        assert!(matches!(err, AccessError::NotAnAdmin(_)));
    }

    #[test]
    fn roles_are_flat_not_tiered() {
        let admin = AccountId::new();
        let next = AccountId::new();
        let access = AccessController::new(admin);

        // The new admin never received Manager; Admin does not imply it.
        access.transfer_admin(admin, next).expect("transfer");
        assert!(access.is_admin(next));
        assert!(!access.is_manager(next));
        assert!(access.require_manager(next).is_err());

        // The old admin keeps Manager from construction seeding.
        assert!(access.is_manager(admin));
    }
}
