//! # toll-fees — Fee Policy & Accrual
//!
//! Two stores with sharply different mutation disciplines:
//!
//! - **Config** ([`config`]): global default fee rates, per-integrator fee
//!   profiles, and per-asset transfer bounds. Mutated by Managers (gated at
//!   the dispatcher surface), read on every dispatch to resolve the
//!   effective rates for a request.
//!
//! - **Ledger** ([`ledger`]): accrued-but-unwithdrawn fee balances per
//!   asset and beneficiary. Credited only as a side effect of a committed
//!   dispatch; drained to exactly zero by collection operations.
//!
//! The split arithmetic itself lives in [`split`] — exact under integer
//! rounding, with remainders always falling to the integrator side.

pub mod config;
pub mod ledger;
pub mod split;

pub use config::{
    AssetBounds, FeeConfigError, FeeConfigStore, GlobalFeeConfig, IntegratorFeeProfile,
    ResolvedFees,
};
pub use ledger::{Beneficiary, FeeLedger};
pub use split::FeeSplit;
