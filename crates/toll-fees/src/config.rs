//! # Fee Configuration Store
//!
//! Global defaults live under one `RwLock`; integrator profiles and asset
//! bounds are keyed `DashMap` entries. Every setter validates against the
//! stored invariants before writing:
//!
//! - every rate ≤ [`DENOMINATOR`] ([`FeeConfigError::FeeTooHigh`] /
//!   [`FeeConfigError::ShareTooHigh`]),
//! - `min ≤ max` per asset, checked against the *current* opposite bound
//!   ([`FeeConfigError::MinMustBeLowerThanMax`] /
//!   [`FeeConfigError::MaxMustBeBiggerThanMin`]).
//!
//! Integrator profiles are never physically deleted. Deactivation sets
//! `is_integrator = false`, after which [`FeeConfigStore::resolve`] falls
//! back to the global defaults for that caller.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use toll_core::{AccountId, AssetId, Rate, DENOMINATOR};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from fee configuration mutations.
#[derive(Error, Debug)]
pub enum FeeConfigError {
    /// A token-fee rate exceeds the fixed scale.
    #[error("token fee rate {numerator} exceeds the denominator {DENOMINATOR}")]
    FeeTooHigh {
        /// The offending numerator.
        numerator: u32,
    },

    /// A platform share rate exceeds the fixed scale.
    #[error("share rate {numerator} exceeds the denominator {DENOMINATOR}")]
    ShareTooHigh {
        /// The offending numerator.
        numerator: u32,
    },

    /// The new minimum would exceed the current maximum.
    #[error("min {min} for {asset} must be lower than the current max {max}")]
    MinMustBeLowerThanMax {
        /// The asset whose bounds were being updated.
        asset: AssetId,
        /// The rejected minimum.
        min: u128,
        /// The current maximum.
        max: u128,
    },

    /// The new maximum would fall below the current minimum.
    #[error("max {max} for {asset} must be bigger than the current min {min}")]
    MaxMustBeBiggerThanMin {
        /// The asset whose bounds were being updated.
        asset: AssetId,
        /// The current minimum.
        min: u128,
        /// The rejected maximum.
        max: u128,
    },
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// Per-integrator fee profile, upserted as one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratorFeeProfile {
    /// Whether the profile is active. Inactive profiles are ignored by
    /// [`FeeConfigStore::resolve`].
    pub is_integrator: bool,
    /// Percentage-of-amount fee charged on the transferred asset.
    pub token_fee_rate: Rate,
    /// Fraction of the token fee kept by the platform; the remainder goes
    /// to the integrator.
    pub platform_token_share: Rate,
    /// Fraction of the fixed crypto fee kept by the platform.
    pub platform_crypto_share: Rate,
    /// Flat native-currency fee replacing the global default while the
    /// profile is active.
    pub fixed_crypto_fee: u128,
}

/// Transfer bounds for one asset. Both default to zero, so an asset admits
/// no dispatches until a Manager widens its bounds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AssetBounds {
    /// Smallest dispatchable input amount.
    pub min: u128,
    /// Largest dispatchable input amount.
    pub max: u128,
}

/// Global fee defaults applied to callers without an active integrator
/// profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GlobalFeeConfig {
    /// Default percentage-of-amount fee on the transferred asset.
    pub platform_fee_rate: Rate,
    /// Default flat fee in the native currency, charged per dispatch.
    pub fixed_crypto_fee: u128,
}

/// The effective rates resolved for one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedFees {
    /// Effective percentage-of-amount fee rate.
    pub token_fee_rate: Rate,
    /// Platform's share of the token fee.
    pub platform_token_share: Rate,
    /// Platform's share of the crypto fee.
    pub platform_crypto_share: Rate,
    /// Effective flat native-currency fee.
    pub total_crypto_fee: u128,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Fee-rate configuration: global defaults, integrator profiles, asset
/// bounds.
#[derive(Debug)]
pub struct FeeConfigStore {
    global: RwLock<GlobalFeeConfig>,
    profiles: DashMap<AccountId, IntegratorFeeProfile>,
    bounds: DashMap<AssetId, AssetBounds>,
}

impl FeeConfigStore {
    /// Create a store with the given global defaults and no per-asset
    /// bounds.
    pub fn new(global: GlobalFeeConfig) -> Self {
        Self {
            global: RwLock::new(global),
            profiles: DashMap::new(),
            bounds: DashMap::new(),
        }
    }

    /// Seed bounds for an asset, bypassing the setter ordering dance.
    /// Construction-time only; still refuses `min > max`.
    pub fn seed_bounds(&self, asset: AssetId, bounds: AssetBounds) -> Result<(), FeeConfigError> {
        if bounds.min > bounds.max {
            return Err(FeeConfigError::MinMustBeLowerThanMax {
                asset,
                min: bounds.min,
                max: bounds.max,
            });
        }
        self.bounds.insert(asset, bounds);
        Ok(())
    }

    /// Upsert an integrator's fee profile as one unit.
    pub fn set_integrator_info(
        &self,
        integrator: AccountId,
        profile: IntegratorFeeProfile,
    ) -> Result<(), FeeConfigError> {
        if !profile.token_fee_rate.is_within_scale() {
            return Err(FeeConfigError::FeeTooHigh {
                numerator: profile.token_fee_rate.numerator(),
            });
        }
        for share in [profile.platform_token_share, profile.platform_crypto_share] {
            if !share.is_within_scale() {
                return Err(FeeConfigError::ShareTooHigh {
                    numerator: share.numerator(),
                });
            }
        }
        self.profiles.insert(integrator, profile);
        Ok(())
    }

    /// The stored profile for an integrator, active or not.
    pub fn integrator_info(&self, integrator: AccountId) -> Option<IntegratorFeeProfile> {
        self.profiles.get(&integrator).map(|p| p.clone())
    }

    /// Update the minimum dispatchable amount for an asset.
    pub fn set_min_token_amount(&self, asset: AssetId, value: u128) -> Result<(), FeeConfigError> {
        let mut entry = self.bounds.entry(asset).or_default();
        if value > entry.max {
            return Err(FeeConfigError::MinMustBeLowerThanMax {
                asset,
                min: value,
                max: entry.max,
            });
        }
        entry.min = value;
        Ok(())
    }

    /// Update the maximum dispatchable amount for an asset.
    pub fn set_max_token_amount(&self, asset: AssetId, value: u128) -> Result<(), FeeConfigError> {
        let mut entry = self.bounds.entry(asset).or_default();
        if value < entry.min {
            return Err(FeeConfigError::MaxMustBeBiggerThanMin {
                asset,
                min: entry.min,
                max: value,
            });
        }
        entry.max = value;
        Ok(())
    }

    /// The stored bounds for an asset (zeroes when never configured).
    pub fn token_bounds(&self, asset: AssetId) -> AssetBounds {
        self.bounds.get(&asset).map(|b| *b).unwrap_or_default()
    }

    /// Update the global flat native-currency fee.
    pub fn set_fixed_crypto_fee(&self, value: u128) {
        self.global.write().fixed_crypto_fee = value;
    }

    /// Update the global default token-fee rate.
    pub fn set_platform_fee_rate(&self, rate: Rate) -> Result<(), FeeConfigError> {
        if !rate.is_within_scale() {
            return Err(FeeConfigError::FeeTooHigh {
                numerator: rate.numerator(),
            });
        }
        self.global.write().platform_fee_rate = rate;
        Ok(())
    }

    /// The current global defaults.
    pub fn global_config(&self) -> GlobalFeeConfig {
        *self.global.read()
    }

    /// Resolve the effective rates for a request.
    ///
    /// A caller with an *active* integrator profile gets the profile's
    /// rates, including its flat-fee override (which replaces, not adds to,
    /// the global default). Everyone else gets the global defaults with the
    /// platform taking the entire fee.
    pub fn resolve(&self, integrator: Option<AccountId>) -> ResolvedFees {
        if let Some(id) = integrator {
            if let Some(profile) = self.profiles.get(&id) {
                if profile.is_integrator {
                    return ResolvedFees {
                        token_fee_rate: profile.token_fee_rate,
                        platform_token_share: profile.platform_token_share,
                        platform_crypto_share: profile.platform_crypto_share,
                        total_crypto_fee: profile.fixed_crypto_fee,
                    };
                }
            }
        }
        let global = self.global.read();
        ResolvedFees {
            token_fee_rate: global.platform_fee_rate,
            platform_token_share: Rate::ONE,
            platform_crypto_share: Rate::ONE,
            total_crypto_fee: global.fixed_crypto_fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FeeConfigStore {
        FeeConfigStore::new(GlobalFeeConfig {
            platform_fee_rate: Rate::ZERO,
            fixed_crypto_fee: 0,
        })
    }

    fn profile(token_fee: u32, token_share: u32, crypto_share: u32) -> IntegratorFeeProfile {
        IntegratorFeeProfile {
            is_integrator: true,
            token_fee_rate: Rate::from_raw(token_fee),
            platform_token_share: Rate::from_raw(token_share),
            platform_crypto_share: Rate::from_raw(crypto_share),
            fixed_crypto_fee: 0,
        }
    }

    #[test]
    fn profile_upsert_round_trip() {
        let store = store();
        let integrator = AccountId::new();
        store
            .set_integrator_info(integrator, profile(60_000, 400_000, 0))
            .expect("upsert");

        let stored = store.integrator_info(integrator).expect("stored");
        assert!(stored.is_integrator);
        assert_eq!(stored.token_fee_rate, Rate::from_raw(60_000));
        assert_eq!(stored.platform_token_share, Rate::from_raw(400_000));
    }

    #[test]
    fn fee_above_denominator_rejected() {
        let store = store();
        let err = store
            .set_integrator_info(AccountId::new(), profile(DENOMINATOR + 1, 0, 0))
            .unwrap_err();
        assert!(matches!(err, FeeConfigError::FeeTooHigh { .. }));
    }

    #[test]
    fn either_share_above_denominator_rejected() {
        let store = store();
        let err = store
            .set_integrator_info(AccountId::new(), profile(DENOMINATOR, DENOMINATOR + 1, 0))
            .unwrap_err();
        assert!(matches!(err, FeeConfigError::ShareTooHigh { .. }));

        let err = store
            .set_integrator_info(AccountId::new(), profile(DENOMINATOR, 0, DENOMINATOR + 1))
            .unwrap_err();
        assert!(matches!(err, FeeConfigError::ShareTooHigh { .. }));
    }

    #[test]
    fn bounds_round_trip() {
        let store = store();
        let asset = AssetId::new();
        store.set_max_token_amount(asset, 200).expect("max");
        store.set_min_token_amount(asset, 100).expect("min");

        let bounds = store.token_bounds(asset);
        assert_eq!(bounds.min, 100);
        assert_eq!(bounds.max, 200);
    }

    #[test]
    fn min_above_current_max_rejected() {
        let store = store();
        let asset = AssetId::new();
        store.set_max_token_amount(asset, 200).expect("max");
        let err = store.set_min_token_amount(asset, 201).unwrap_err();
        assert!(matches!(err, FeeConfigError::MinMustBeLowerThanMax { .. }));
    }

    #[test]
    fn max_below_current_min_rejected() {
        let store = store();
        let asset = AssetId::new();
        store.set_max_token_amount(asset, 200).expect("max");
        store.set_min_token_amount(asset, 100).expect("min");
        let err = store.set_max_token_amount(asset, 99).unwrap_err();
        assert!(matches!(err, FeeConfigError::MaxMustBeBiggerThanMin { .. }));
    }

    #[test]
    fn resolve_uses_active_profile() {
        let store = store();
        let integrator = AccountId::new();
        let mut p = profile(60_000, 400_000, 800_000);
        p.fixed_crypto_fee = 228;
        store.set_integrator_info(integrator, p).expect("upsert");

        let fees = store.resolve(Some(integrator));
        assert_eq!(fees.token_fee_rate, Rate::from_raw(60_000));
        assert_eq!(fees.platform_token_share, Rate::from_raw(400_000));
        assert_eq!(fees.platform_crypto_share, Rate::from_raw(800_000));
        assert_eq!(fees.total_crypto_fee, 228);
    }

    #[test]
    fn resolve_falls_back_when_profile_inactive() {
        let store = FeeConfigStore::new(GlobalFeeConfig {
            platform_fee_rate: Rate::from_raw(10_000),
            fixed_crypto_fee: 500,
        });
        let integrator = AccountId::new();
        let mut p = profile(60_000, 400_000, 0);
        p.is_integrator = false;
        store.set_integrator_info(integrator, p).expect("upsert");

        let fees = store.resolve(Some(integrator));
        assert_eq!(fees.token_fee_rate, Rate::from_raw(10_000));
        assert_eq!(fees.platform_token_share, Rate::ONE);
        assert_eq!(fees.total_crypto_fee, 500);
    }

    #[test]
    fn resolve_without_integrator_gives_platform_everything() {
        let store = FeeConfigStore::new(GlobalFeeConfig {
            platform_fee_rate: Rate::from_raw(10_000),
            fixed_crypto_fee: 500,
        });
        let fees = store.resolve(None);
        assert_eq!(fees.platform_token_share, Rate::ONE);
        assert_eq!(fees.platform_crypto_share, Rate::ONE);
    }
}
