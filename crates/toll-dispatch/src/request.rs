//! # Dispatch Requests & Receipts
//!
//! The request shape is shared by the token and native entry points; the
//! native path treats the input asset as [`AssetId::NATIVE`] regardless of
//! the hint carried in the request. Receipts are the engine's observable
//! record of every committed dispatch, kept for off-process indexing —
//! nothing inside the engine reads them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use toll_core::{AccountId, AssetId, ChainId};

/// A swap/bridge dispatch request.
///
/// `output_asset_hint` and `min_output_amount` describe the leg executed by
/// the downstream provider; the engine records them but never interprets
/// them — price discovery belongs to the off-process quoting service that
/// assembled the call data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Asset the caller is putting in.
    pub input_asset: AssetId,
    /// Amount of the input asset, fees included.
    pub input_amount: u128,
    /// Asset the provider is expected to deliver on the destination.
    pub output_asset_hint: AssetId,
    /// Minimum acceptable delivery, enforced by the provider leg.
    pub min_output_amount: u128,
    /// Destination network.
    pub destination_chain: ChainId,
    /// Recipient of the provider's output.
    pub recipient: AccountId,
    /// Referring integrator, if any. `None` applies the global fee
    /// defaults.
    pub integrator: Option<AccountId>,
    /// The provider router granted spending capacity over the custodied
    /// input.
    pub router: AccountId,
}

/// Observable record of one committed dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// Unique receipt identifier.
    pub receipt_id: Uuid,
    /// The account that initiated the dispatch.
    pub caller: AccountId,
    /// Input asset (the native sentinel on the native path).
    pub input_asset: AssetId,
    /// Amount taken into custody, fees included.
    pub input_amount: u128,
    /// Percentage fee withheld from the input amount.
    pub token_fee_amount: u128,
    /// Amount forwarded to the provider.
    pub post_fee_amount: u128,
    /// Flat native-currency fee charged for the dispatch.
    pub total_crypto_fee: u128,
    /// Destination network of the provider leg.
    pub destination_chain: ChainId,
    /// Recipient of the provider's output.
    pub recipient: AccountId,
    /// Referring integrator, if any.
    pub integrator: Option<AccountId>,
    /// The router that consumed the granted capacity.
    pub router: AccountId,
    /// When the dispatch committed.
    pub executed_at: DateTime<Utc>,
}
