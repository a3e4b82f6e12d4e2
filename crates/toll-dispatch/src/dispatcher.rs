//! # Swap Dispatcher
//!
//! One dispatch is one atomic pass through:
//!
//! ```text
//! pause gate ─▶ whitelist ─▶ bounds ─▶ fee resolution ─▶ fee split
//!     ─▶ attached-value check ─▶ custody pull ─▶ capacity grant
//!     ─▶ provider call ─▶ consumption verification ─▶ ledger credit
//!     ─▶ receipt
//! ```
//!
//! The custody / provider-call leg runs against a bank snapshot taken just
//! before the first movement; any failure in that leg reinstates the
//! snapshot, so a failed dispatch leaves no trace. Ledger credits happen
//! strictly after consumption verification — the ledger never needs
//! rolling back.
//!
//! Consumption is verified by capacity residual, not balance delta: the
//! router is granted exactly the fee-adjusted amount, and after the call
//! the residual grant must be zero. Capacity burns down by the pulled
//! amount regardless of transfer taxes, so deflationary assets pass as
//! long as their call data names the tax-adjusted amount. Whatever
//! residual remains is revoked before the verdict either way.
//!
//! Reentrancy: the provider call executes untrusted code that may try to
//! re-invoke the dispatcher. A busy flag held for the whole sequence
//! rejects that with `ReentrantDispatch`. Collection and sweep operations
//! hold the same flag — ledger mutation is never interleaved with an
//! unresolved external call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use toll_access::AccessController;
use toll_asset::AssetBank;
use toll_core::{AccountId, AssetId, Rate};
use toll_fees::{
    AssetBounds, Beneficiary, FeeConfigStore, FeeLedger, FeeSplit, GlobalFeeConfig,
    IntegratorFeeProfile,
};
use toll_registry::{EmbeddedWhitelist, ProviderDirectory};

use crate::gateway::{GatewayCall, ProviderGateway};
use crate::request::{DispatchReceipt, SwapRequest};
use crate::DispatchError;

// ---------------------------------------------------------------------------
// Reentrancy guard
// ---------------------------------------------------------------------------

/// RAII hold on the dispatcher's busy flag.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, DispatchError> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .map_err(|_| DispatchError::ReentrantDispatch)?;
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// The orchestrator: validates requests, custodies funds, drives provider
/// calls, and keeps the fee ledger exact.
pub struct SwapDispatcher {
    bank: Arc<AssetBank>,
    engine: AccountId,
    access: AccessController,
    directory: Arc<dyn ProviderDirectory>,
    config: FeeConfigStore,
    ledger: FeeLedger,
    paused: AtomicBool,
    busy: AtomicBool,
    receipts: RwLock<Vec<DispatchReceipt>>,
}

impl SwapDispatcher {
    /// Start building a dispatcher over `bank` administered by `admin`.
    pub fn builder(bank: Arc<AssetBank>, admin: AccountId) -> DispatcherBuilder {
        DispatcherBuilder {
            bank,
            admin,
            global: GlobalFeeConfig {
                platform_fee_rate: Rate::ZERO,
                fixed_crypto_fee: 0,
            },
            providers: Vec::new(),
            bounds: Vec::new(),
            directory: None,
        }
    }

    // -- dispatch entry points ---------------------------------------------

    /// Dispatch with a fungible input asset.
    ///
    /// Requires a prior spending authorization from `caller` to the engine
    /// account covering at least `input_amount`, and an attached value of
    /// exactly the resolved flat crypto fee.
    pub fn dispatch_token(
        &self,
        caller: AccountId,
        request: &SwapRequest,
        gateway: &dyn ProviderGateway,
        call_data: &[u8],
        attached_value: u128,
    ) -> Result<DispatchReceipt, DispatchError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.ensure_active()?;

        let router_ok = self.directory.is_available(request.router);
        let gateway_ok = self.directory.is_available(gateway.id());
        if !(router_ok && gateway_ok) {
            return Err(DispatchError::ProviderNotAvailable {
                router: (!router_ok).then_some(request.router),
                gateway: (!gateway_ok).then_some(gateway.id()),
            });
        }
        self.check_bounds(request.input_asset, request.input_amount)?;

        let fees = self.config.resolve(request.integrator);
        if attached_value != fees.total_crypto_fee {
            return Err(DispatchError::WrongAttachedValue {
                expected: fees.total_crypto_fee,
                attached: attached_value,
            });
        }

        let snapshot = self.bank.snapshot();
        let split = match self.token_leg(caller, request, gateway, call_data, attached_value, &fees)
        {
            Ok(split) => split,
            Err(err) => {
                self.bank.restore(snapshot);
                warn!(
                    caller = %caller,
                    asset = %request.input_asset,
                    amount = request.input_amount,
                    error = %err,
                    "token dispatch aborted, custody rolled back"
                );
                return Err(err);
            }
        };

        self.credit_fees(request.input_asset, request.integrator, &split);
        Ok(self.commit_receipt(caller, request, request.input_asset, &split))
    }

    /// Dispatch with the native currency as input.
    ///
    /// The attached value must equal exactly `input_amount` plus the
    /// resolved flat crypto fee. The router is the callee on this path and
    /// receives the fee-adjusted amount as delivered value.
    pub fn dispatch_native(
        &self,
        caller: AccountId,
        request: &SwapRequest,
        gateway: &dyn ProviderGateway,
        call_data: &[u8],
        attached_value: u128,
    ) -> Result<DispatchReceipt, DispatchError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.ensure_active()?;

        if !self.directory.is_available(request.router) {
            return Err(DispatchError::RouterNotAvailable(request.router));
        }
        self.check_bounds(AssetId::NATIVE, request.input_amount)?;

        let fees = self.config.resolve(request.integrator);
        let split = FeeSplit::compute(request.input_amount, &fees);
        let expected = request.input_amount.saturating_add(split.total_crypto_fee);
        if attached_value != expected {
            return Err(DispatchError::WrongAttachedValue {
                expected,
                attached: attached_value,
            });
        }

        let snapshot = self.bank.snapshot();
        if let Err(err) = self.native_leg(caller, request, gateway, call_data, attached_value, &split)
        {
            self.bank.restore(snapshot);
            warn!(
                caller = %caller,
                amount = request.input_amount,
                error = %err,
                "native dispatch aborted, custody rolled back"
            );
            return Err(err);
        }

        self.credit_fees(AssetId::NATIVE, request.integrator, &split);
        Ok(self.commit_receipt(caller, request, AssetId::NATIVE, &split))
    }

    // -- collection --------------------------------------------------------

    /// Drain the caller's own integrator entry for `asset` into the
    /// caller's account. Returns the collected amount; zero on an empty
    /// entry.
    pub fn collect_integrator_fee(
        &self,
        caller: AccountId,
        asset: AssetId,
    ) -> Result<u128, DispatchError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.pay_out(asset, Beneficiary::Integrator(caller), caller)
    }

    /// Manager-driven collection on behalf of an integrator; the proceeds
    /// still go to the integrator.
    pub fn collect_integrator_fee_for(
        &self,
        caller: AccountId,
        integrator: AccountId,
        asset: AssetId,
    ) -> Result<u128, DispatchError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.access.require_manager(caller)?;
        self.pay_out(asset, Beneficiary::Integrator(integrator), integrator)
    }

    /// Drain the platform's entry for `asset` to `recipient`. Admin or
    /// Manager.
    pub fn collect_platform_fee(
        &self,
        caller: AccountId,
        asset: AssetId,
        recipient: AccountId,
    ) -> Result<u128, DispatchError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.access.require_admin_or_manager(caller)?;
        self.pay_out(asset, Beneficiary::Platform, recipient)
    }

    // -- emergency recovery ------------------------------------------------

    /// Sweep stray balances the ledger does not track. Admin only; refuses
    /// to dip into amounts promised to beneficiaries.
    pub fn sweep_tokens(
        &self,
        caller: AccountId,
        asset: AssetId,
        amount: u128,
        recipient: AccountId,
    ) -> Result<(), DispatchError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.access.require_admin(caller)?;
        let held = self.bank.balance_of(asset, self.engine);
        let surplus = held.saturating_sub(self.ledger.total_accrued(asset));
        if amount > surplus {
            return Err(DispatchError::SweepExceedsSurplus {
                requested: amount,
                surplus,
            });
        }
        self.bank.transfer(asset, self.engine, recipient, amount)?;
        warn!(asset = %asset, amount, recipient = %recipient, "emergency sweep executed");
        Ok(())
    }

    // -- pause -------------------------------------------------------------

    /// Halt dispatching. Manager or Admin. Fails if already paused.
    pub fn pause_execution(&self, caller: AccountId) -> Result<(), DispatchError> {
        self.access.require_admin_or_manager(caller)?;
        if self.paused.swap(true, Ordering::SeqCst) {
            return Err(DispatchError::ExecutionPaused);
        }
        info!(caller = %caller, "execution paused");
        Ok(())
    }

    /// Resume dispatching. Manager or Admin. Fails if not paused.
    pub fn unpause_execution(&self, caller: AccountId) -> Result<(), DispatchError> {
        self.access.require_admin_or_manager(caller)?;
        if !self.paused.swap(false, Ordering::SeqCst) {
            return Err(DispatchError::NotPaused);
        }
        info!(caller = %caller, "execution resumed");
        Ok(())
    }

    /// Whether dispatching is currently halted.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    // -- configuration surface (Manager-gated) -----------------------------

    /// Upsert an integrator fee profile.
    pub fn set_integrator_info(
        &self,
        caller: AccountId,
        integrator: AccountId,
        profile: IntegratorFeeProfile,
    ) -> Result<(), DispatchError> {
        self.access.require_manager(caller)?;
        self.config.set_integrator_info(integrator, profile)?;
        info!(integrator = %integrator, "integrator fee profile updated");
        Ok(())
    }

    /// Update an asset's minimum dispatchable amount.
    pub fn set_min_token_amount(
        &self,
        caller: AccountId,
        asset: AssetId,
        value: u128,
    ) -> Result<(), DispatchError> {
        self.access.require_manager(caller)?;
        self.config.set_min_token_amount(asset, value)?;
        Ok(())
    }

    /// Update an asset's maximum dispatchable amount.
    pub fn set_max_token_amount(
        &self,
        caller: AccountId,
        asset: AssetId,
        value: u128,
    ) -> Result<(), DispatchError> {
        self.access.require_manager(caller)?;
        self.config.set_max_token_amount(asset, value)?;
        Ok(())
    }

    /// Update the global flat crypto fee.
    pub fn set_fixed_crypto_fee(&self, caller: AccountId, value: u128) -> Result<(), DispatchError> {
        self.access.require_manager(caller)?;
        self.config.set_fixed_crypto_fee(value);
        info!(value, "global fixed crypto fee updated");
        Ok(())
    }

    /// Update the global default token-fee rate.
    pub fn set_platform_fee_rate(&self, caller: AccountId, rate: Rate) -> Result<(), DispatchError> {
        self.access.require_manager(caller)?;
        self.config.set_platform_fee_rate(rate)?;
        info!(rate = %rate, "global platform fee rate updated");
        Ok(())
    }

    /// Whitelist a provider target.
    pub fn add_provider(&self, caller: AccountId, target: AccountId) -> Result<(), DispatchError> {
        self.access.require_manager(caller)?;
        self.directory.add(target)?;
        info!(provider = %target, "provider whitelisted");
        Ok(())
    }

    /// Remove a provider target from the whitelist.
    pub fn remove_provider(&self, caller: AccountId, target: AccountId) -> Result<(), DispatchError> {
        self.access.require_manager(caller)?;
        self.directory.remove(target)?;
        info!(provider = %target, "provider removed from whitelist");
        Ok(())
    }

    // -- role surface ------------------------------------------------------

    /// Whether `id` holds the Admin capability.
    pub fn is_admin(&self, id: AccountId) -> bool {
        self.access.is_admin(id)
    }

    /// Whether `id` holds the Manager capability.
    pub fn is_manager(&self, id: AccountId) -> bool {
        self.access.is_manager(id)
    }

    /// Grant the Manager capability. Admin only.
    pub fn grant_manager(&self, caller: AccountId, id: AccountId) -> Result<(), DispatchError> {
        self.access.grant_manager(caller, id)?;
        Ok(())
    }

    /// Revoke the Manager capability. Admin only.
    pub fn revoke_manager(&self, caller: AccountId, id: AccountId) -> Result<(), DispatchError> {
        self.access.revoke_manager(caller, id)?;
        Ok(())
    }

    /// Hand the single Admin identity to `new_admin`. Admin only.
    pub fn transfer_admin(&self, caller: AccountId, new_admin: AccountId) -> Result<(), DispatchError> {
        self.access.transfer_admin(caller, new_admin)?;
        info!(new_admin = %new_admin, "admin transferred");
        Ok(())
    }

    // -- read accessors ----------------------------------------------------

    /// The engine's custody account in the bank.
    pub fn engine_account(&self) -> AccountId {
        self.engine
    }

    /// Accrued, uncollected platform fees in `asset`.
    pub fn available_platform_fee(&self, asset: AssetId) -> u128 {
        self.ledger.balance_of(asset, Beneficiary::Platform)
    }

    /// Accrued, uncollected fees owed to `integrator` in `asset`.
    pub fn available_integrator_fee(&self, asset: AssetId, integrator: AccountId) -> u128 {
        self.ledger
            .balance_of(asset, Beneficiary::Integrator(integrator))
    }

    /// The configured minimum dispatchable amount for `asset`.
    pub fn min_token_amount(&self, asset: AssetId) -> u128 {
        self.config.token_bounds(asset).min
    }

    /// The configured maximum dispatchable amount for `asset`.
    pub fn max_token_amount(&self, asset: AssetId) -> u128 {
        self.config.token_bounds(asset).max
    }

    /// The current global flat crypto fee.
    pub fn fixed_crypto_fee(&self) -> u128 {
        self.config.global_config().fixed_crypto_fee
    }

    /// The stored profile for an integrator, active or not.
    pub fn integrator_info(&self, integrator: AccountId) -> Option<IntegratorFeeProfile> {
        self.config.integrator_info(integrator)
    }

    /// The currently whitelisted provider targets.
    pub fn available_providers(&self) -> Vec<AccountId> {
        self.directory.list()
    }

    /// Receipts of every committed dispatch, oldest first.
    pub fn dispatch_log(&self) -> Vec<DispatchReceipt> {
        self.receipts.read().clone()
    }

    // -- internals ---------------------------------------------------------

    fn ensure_active(&self) -> Result<(), DispatchError> {
        if self.is_paused() {
            return Err(DispatchError::ExecutionPaused);
        }
        Ok(())
    }

    fn check_bounds(&self, asset: AssetId, amount: u128) -> Result<(), DispatchError> {
        let AssetBounds { min, max } = self.config.token_bounds(asset);
        if amount < min || amount > max {
            return Err(DispatchError::AmountOutOfBounds {
                asset,
                amount,
                min,
                max,
            });
        }
        Ok(())
    }

    fn token_leg(
        &self,
        caller: AccountId,
        request: &SwapRequest,
        gateway: &dyn ProviderGateway,
        call_data: &[u8],
        attached_value: u128,
        fees: &toll_fees::ResolvedFees,
    ) -> Result<FeeSplit, DispatchError> {
        if attached_value > 0 {
            self.bank
                .transfer(AssetId::NATIVE, caller, self.engine, attached_value)?;
        }
        let held_before = self.bank.balance_of(request.input_asset, self.engine);
        self.bank.transfer_from(
            request.input_asset,
            self.engine,
            caller,
            self.engine,
            request.input_amount,
        )?;
        // Fees are computed on what actually arrived in custody, so
        // transfer-taxed assets never leave the ledger promising more than
        // the engine holds.
        let received = self
            .bank
            .balance_of(request.input_asset, self.engine)
            .saturating_sub(held_before);
        let split = FeeSplit::compute(received, fees);

        self.bank.approve(
            request.input_asset,
            self.engine,
            request.router,
            split.post_fee_amount,
        )?;

        gateway.execute(GatewayCall {
            bank: &self.bank,
            engine: self.engine,
            router: request.router,
            value: 0,
            data: call_data,
        })?;

        let residual = self
            .bank
            .capacity(request.input_asset, self.engine, request.router);
        // Revoke whatever is left before passing judgment on it.
        self.bank
            .approve(request.input_asset, self.engine, request.router, 0)?;
        if residual != 0 {
            return Err(DispatchError::DifferentAmountSpent {
                granted: split.post_fee_amount,
                spent: split.post_fee_amount.saturating_sub(residual),
            });
        }
        Ok(split)
    }

    fn native_leg(
        &self,
        caller: AccountId,
        request: &SwapRequest,
        gateway: &dyn ProviderGateway,
        call_data: &[u8],
        attached_value: u128,
        split: &FeeSplit,
    ) -> Result<(), DispatchError> {
        self.bank
            .transfer(AssetId::NATIVE, caller, self.engine, attached_value)?;
        self.bank
            .transfer(AssetId::NATIVE, self.engine, request.router, split.post_fee_amount)?;

        gateway.execute(GatewayCall {
            bank: &self.bank,
            engine: self.engine,
            router: request.router,
            value: split.post_fee_amount,
            data: call_data,
        })?;
        Ok(())
    }

    fn credit_fees(&self, asset: AssetId, integrator: Option<AccountId>, split: &FeeSplit) {
        self.ledger
            .credit(asset, Beneficiary::Platform, split.platform_token_fee);
        self.ledger.credit(
            AssetId::NATIVE,
            Beneficiary::Platform,
            split.platform_crypto_fee,
        );
        if let Some(id) = integrator {
            self.ledger.credit(
                asset,
                Beneficiary::Integrator(id),
                split.integrator_token_fee,
            );
            self.ledger.credit(
                AssetId::NATIVE,
                Beneficiary::Integrator(id),
                split.integrator_crypto_fee,
            );
        }
    }

    fn commit_receipt(
        &self,
        caller: AccountId,
        request: &SwapRequest,
        input_asset: AssetId,
        split: &FeeSplit,
    ) -> DispatchReceipt {
        let receipt = DispatchReceipt {
            receipt_id: Uuid::new_v4(),
            caller,
            input_asset,
            // The custodied amount; differs from the stated input only for
            // transfer-taxed assets.
            input_amount: split.token_fee_amount + split.post_fee_amount,
            token_fee_amount: split.token_fee_amount,
            post_fee_amount: split.post_fee_amount,
            total_crypto_fee: split.total_crypto_fee,
            destination_chain: request.destination_chain,
            recipient: request.recipient,
            integrator: request.integrator,
            router: request.router,
            executed_at: Utc::now(),
        };
        info!(
            receipt = %receipt.receipt_id,
            asset = %receipt.input_asset,
            input = receipt.input_amount,
            forwarded = receipt.post_fee_amount,
            chain = %receipt.destination_chain,
            recipient = %receipt.recipient,
            "dispatch committed"
        );
        self.receipts.write().push(receipt.clone());
        receipt
    }

    fn pay_out(
        &self,
        asset: AssetId,
        beneficiary: Beneficiary,
        recipient: AccountId,
    ) -> Result<u128, DispatchError> {
        let amount = self.ledger.balance_of(asset, beneficiary);
        if amount == 0 {
            return Ok(0);
        }
        self.bank.transfer(asset, self.engine, recipient, amount)?;
        self.ledger.drain(asset, beneficiary);
        info!(
            asset = %asset,
            beneficiary = %beneficiary,
            recipient = %recipient,
            amount,
            "accrued fees collected"
        );
        Ok(amount)
    }
}

impl std::fmt::Debug for SwapDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapDispatcher")
            .field("engine", &self.engine)
            .field("paused", &self.is_paused())
            .field("receipts", &self.receipts.read().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Construction-time wiring for a [`SwapDispatcher`].
///
/// The whitelist strategy is chosen here: by default the dispatcher owns a
/// private [`EmbeddedWhitelist`]; [`DispatcherBuilder::shared_directory`]
/// plugs in an externally hosted registry shared across dispatcher
/// instances.
pub struct DispatcherBuilder {
    bank: Arc<AssetBank>,
    admin: AccountId,
    global: GlobalFeeConfig,
    providers: Vec<AccountId>,
    bounds: Vec<(AssetId, AssetBounds)>,
    directory: Option<Arc<dyn ProviderDirectory>>,
}

impl DispatcherBuilder {
    /// Set the global flat crypto fee charged per dispatch.
    pub fn fixed_crypto_fee(mut self, value: u128) -> Self {
        self.global.fixed_crypto_fee = value;
        self
    }

    /// Set the global default token-fee rate.
    pub fn platform_fee_rate(mut self, rate: Rate) -> Self {
        self.global.platform_fee_rate = rate;
        self
    }

    /// Whitelist a provider target at construction.
    pub fn provider(mut self, target: AccountId) -> Self {
        self.providers.push(target);
        self
    }

    /// Seed transfer bounds for an asset.
    pub fn token_bounds(mut self, asset: AssetId, min: u128, max: u128) -> Self {
        self.bounds.push((asset, AssetBounds { min, max }));
        self
    }

    /// Use an externally hosted provider directory instead of an embedded
    /// whitelist.
    pub fn shared_directory(mut self, directory: Arc<dyn ProviderDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Validate the wiring and produce the dispatcher.
    pub fn build(self) -> Result<SwapDispatcher, DispatchError> {
        if !self.global.platform_fee_rate.is_within_scale() {
            return Err(toll_fees::FeeConfigError::FeeTooHigh {
                numerator: self.global.platform_fee_rate.numerator(),
            }
            .into());
        }
        let directory = self
            .directory
            .unwrap_or_else(|| Arc::new(EmbeddedWhitelist::new()));
        for target in &self.providers {
            directory.add(*target)?;
        }
        let config = FeeConfigStore::new(self.global);
        for (asset, bounds) in self.bounds {
            config.seed_bounds(asset, bounds)?;
        }
        Ok(SwapDispatcher {
            bank: self.bank,
            engine: AccountId::new(),
            access: AccessController::new(self.admin),
            directory,
            config,
            ledger: FeeLedger::new(),
            paused: AtomicBool::new(false),
            busy: AtomicBool::new(false),
            receipts: RwLock::new(Vec::new()),
        })
    }
}
