//! # toll-dispatch — Provider Dispatch Engine
//!
//! The orchestrator of the Tollgate stack. A dispatch runs a single atomic
//! sequence: validate the request (pause gate, provider whitelist, asset
//! bounds), resolve and compute fees, take custody of the input asset,
//! grant the provider router a bounded spending capacity of exactly the
//! fee-adjusted amount, invoke the provider gateway with opaque call data,
//! verify the capacity was consumed exactly, and only then credit the fee
//! ledger and emit a receipt.
//!
//! - **Dispatcher** ([`dispatcher`]): the [`SwapDispatcher`] orchestrator,
//!   its builder, collection operations, and the emergency sweep.
//!
//! - **Gateway** ([`gateway`]): the [`ProviderGateway`] trait external
//!   providers implement, plus [`StubBridgeGateway`] — an in-process
//!   provider for tests and wiring checks.
//!
//! - **Request** ([`request`]): the dispatch request and the receipt
//!   emitted for every committed dispatch.
//!
//! ## Atomicity
//!
//! Every operation either fully commits or has no effect. The custody /
//! external-call leg runs against a whole-bank snapshot that is reinstated
//! on any failure, and ledger credits happen strictly after the provider
//! call has returned and been verified. A busy flag spanning the entire
//! sequence rejects reentrant dispatches from inside a provider callee.

pub mod dispatcher;
pub mod gateway;
pub mod request;

pub use dispatcher::{DispatcherBuilder, SwapDispatcher};
pub use gateway::{GatewayCall, GatewayError, ProviderGateway, StubBridgeGateway, StubCallData};
pub use request::{DispatchReceipt, SwapRequest};

use thiserror::Error;

use toll_access::AccessError;
use toll_asset::BankError;
use toll_core::{AccountId, AssetId};
use toll_fees::FeeConfigError;
use toll_registry::RegistryError;

/// Top-level error type for dispatch-engine operations.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The caller lacks the required capability.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A configuration setter would violate a stored invariant.
    #[error(transparent)]
    Config(#[from] FeeConfigError),

    /// A whitelist mutation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A custody movement failed (overdraft, missing spending
    /// authorization, unknown asset).
    #[error(transparent)]
    Bank(#[from] BankError),

    /// Dispatch attempted (or pause requested) while execution is paused.
    #[error("execution is paused")]
    ExecutionPaused,

    /// Unpause requested while execution is active.
    #[error("execution is not paused")]
    NotPaused,

    /// Token-path dispatch target(s) not whitelisted. Each populated slot
    /// names an unavailable target.
    #[error("provider not available (router: {router:?}, gateway: {gateway:?})")]
    ProviderNotAvailable {
        /// The router, when it is the unavailable target.
        router: Option<AccountId>,
        /// The gateway, when it is the unavailable target.
        gateway: Option<AccountId>,
    },

    /// Native-path dispatch router not whitelisted.
    #[error("router {0} not available")]
    RouterNotAvailable(AccountId),

    /// Input amount outside the asset's configured bounds.
    #[error("amount {amount} of {asset} outside bounds [{min}, {max}]")]
    AmountOutOfBounds {
        /// The input asset.
        asset: AssetId,
        /// The rejected amount.
        amount: u128,
        /// The configured minimum.
        min: u128,
        /// The configured maximum.
        max: u128,
    },

    /// The native value supplied with the call does not match what the fee
    /// schedule requires.
    #[error("wrong attached value: expected {expected}, got {attached}")]
    WrongAttachedValue {
        /// The exact value the dispatch required.
        expected: u128,
        /// The value actually supplied.
        attached: u128,
    },

    /// The provider call itself failed; carries the underlying reason.
    #[error("external call failed: {0}")]
    GatewayFailure(#[from] gateway::GatewayError),

    /// The provider consumed an amount other than the granted capacity.
    #[error("provider spent {spent}, granted {granted}")]
    DifferentAmountSpent {
        /// The capacity granted for the call.
        granted: u128,
        /// The amount actually consumed.
        spent: u128,
    },

    /// A provider callee attempted to re-enter the dispatcher while a
    /// dispatch was in flight.
    #[error("reentrant dispatch rejected")]
    ReentrantDispatch,

    /// An emergency sweep would dip into balances the ledger has promised
    /// to beneficiaries.
    #[error("sweep of {requested} exceeds unaccounted surplus {surplus}")]
    SweepExceedsSurplus {
        /// The requested sweep amount.
        requested: u128,
        /// The balance not promised to any beneficiary.
        surplus: u128,
    },
}
