//! # toll-core — Domain Primitives
//!
//! Foundation types shared across the Tollgate stack:
//!
//! - **Identity** ([`identity`]): Newtype identifiers for accounts, assets,
//!   and destination networks. Each identifier is a distinct type — you
//!   cannot pass an [`AccountId`] where an [`AssetId`] is expected.
//!
//! - **Rate** ([`rate`]): Fixed-point fee fractions scored out of
//!   [`DENOMINATOR`], with exact (overflow-free) application to `u128`
//!   amounts.
//!
//! Amounts throughout the stack are plain `u128` in the asset's smallest
//! unit; fractions of an amount are always expressed as a [`Rate`].

pub mod identity;
pub mod rate;

pub use identity::{AccountId, AssetId, ChainId};
pub use rate::{Rate, DENOMINATOR};
