//! # toll-asset — Settlement Substrate
//!
//! The asset bank is the in-process stand-in for the host network's token
//! and native-currency substrate. It tracks, per asset:
//!
//! - **Balances** per holding account.
//! - **Spending capacities**: the bounded amount a spender may pull from an
//!   owner's balance via [`AssetBank::transfer_from`]. Capacity is granted
//!   with [`AssetBank::approve`] and burns down as it is consumed — the
//!   dispatch engine measures the residual after a provider call to verify
//!   exact consumption.
//! - **Transfer taxes**: an asset may be registered with a tax rate that is
//!   burned in transit on every transfer, modeling deflationary
//!   (fee-on-transfer) tokens. Capacity consumption is unaffected by the
//!   tax, which is what makes capacity-residual accounting robust for
//!   taxed assets.
//!
//! [`AssetBank::snapshot`] / [`AssetBank::restore`] capture and reinstate
//! the entire bank state, giving callers whole-operation atomicity around
//! sequences that include untrusted callees.

pub mod bank;

pub use bank::{AssetBank, AssetInfo, BankError, BankSnapshot};
