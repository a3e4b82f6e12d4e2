//! # Fee Collection & Recovery Tests
//!
//! Draining accrued fees to their beneficiaries: integrator self-service,
//! manager-driven collection on behalf, platform collection, idempotent
//! drains on empty entries, the solvency-guarded emergency sweep, and the
//! single-admin handoff.

use std::sync::Arc;

use toll_asset::{AssetBank, AssetInfo};
use toll_core::{AccountId, AssetId, ChainId, Rate};
use toll_dispatch::{DispatchError, StubBridgeGateway, StubCallData, SwapDispatcher, SwapRequest};
use toll_fees::IntegratorFeeProfile;

const DEFAULT_AMOUNT: u128 = 1_000_000;
const FIXED_CRYPTO_FEE: u128 = 1_000;

struct Harness {
    bank: Arc<AssetBank>,
    dispatcher: SwapDispatcher,
    admin: AccountId,
    manager: AccountId,
    swapper: AccountId,
    integrator: AccountId,
    asset: AssetId,
}

/// An engine that has already committed one integrator dispatch: 6% token
/// fee split 40/60, flat fee split 80/20, so every ledger entry involved
/// in collection is non-empty.
fn collected_harness() -> Harness {
    let bank = Arc::new(AssetBank::new());
    let asset = AssetId::new();
    bank.register_asset(asset, AssetInfo::plain("SWP"))
        .expect("register asset");

    let admin = AccountId::new();
    let manager = AccountId::new();
    let swapper = AccountId::new();
    let integrator = AccountId::new();
    let router = AccountId::new();

    let dispatcher = SwapDispatcher::builder(Arc::clone(&bank), admin)
        .fixed_crypto_fee(FIXED_CRYPTO_FEE)
        .provider(router)
        .token_bounds(asset, 100, 1_000_000_000_000)
        .build()
        .expect("build dispatcher");
    dispatcher.grant_manager(admin, manager).expect("grant");

    dispatcher
        .set_integrator_info(
            admin,
            integrator,
            IntegratorFeeProfile {
                is_integrator: true,
                token_fee_rate: Rate::from_raw(60_000),
                platform_token_share: Rate::from_raw(400_000),
                platform_crypto_share: Rate::from_raw(800_000),
                fixed_crypto_fee: FIXED_CRYPTO_FEE,
            },
        )
        .expect("profile");

    bank.mint(asset, swapper, 10_000_000).expect("mint asset");
    bank.mint(AssetId::NATIVE, swapper, 10_000_000)
        .expect("mint native");
    bank.approve(asset, swapper, dispatcher.engine_account(), u128::MAX)
        .expect("authorize engine");

    let call_data = StubCallData {
        asset,
        amount: 940_000,
        destination_chain: 228,
    }
    .encode()
    .expect("encode");
    dispatcher
        .dispatch_token(
            swapper,
            &SwapRequest {
                input_asset: asset,
                input_amount: DEFAULT_AMOUNT,
                output_asset_hint: AssetId::new(),
                min_output_amount: 1,
                destination_chain: ChainId(228),
                recipient: swapper,
                integrator: Some(integrator),
                router,
            },
            &StubBridgeGateway::new(router),
            &call_data,
            FIXED_CRYPTO_FEE,
        )
        .expect("seed dispatch");

    Harness {
        bank,
        dispatcher,
        admin,
        manager,
        swapper,
        integrator,
        asset,
    }
}

#[test]
fn integrator_collects_its_own_token_fee() {
    let h = collected_harness();
    assert_eq!(
        h.dispatcher.available_integrator_fee(h.asset, h.integrator),
        36_000
    );

    let collected = h
        .dispatcher
        .collect_integrator_fee(h.integrator, h.asset)
        .expect("collect");
    assert_eq!(collected, 36_000);
    assert_eq!(h.bank.balance_of(h.asset, h.integrator), 36_000);
    assert_eq!(
        h.dispatcher.available_integrator_fee(h.asset, h.integrator),
        0
    );
}

#[test]
fn manager_collects_on_behalf_and_the_integrator_is_paid() {
    let h = collected_harness();
    let collected = h
        .dispatcher
        .collect_integrator_fee_for(h.manager, h.integrator, h.asset)
        .expect("collect on behalf");
    assert_eq!(collected, 36_000);
    // Proceeds go to the integrator, not the manager.
    assert_eq!(h.bank.balance_of(h.asset, h.integrator), 36_000);
    assert_eq!(h.bank.balance_of(h.asset, h.manager), 0);
}

#[test]
fn collection_on_behalf_is_manager_gated() {
    let h = collected_harness();
    let err = h
        .dispatcher
        .collect_integrator_fee_for(h.swapper, h.integrator, h.asset)
        .unwrap_err();
    assert!(matches!(err, DispatchError::Access(_)));
}

#[test]
fn platform_fee_is_collected_to_a_chosen_recipient() {
    let h = collected_harness();
    let treasury = AccountId::new();

    let collected = h
        .dispatcher
        .collect_platform_fee(h.manager, h.asset, treasury)
        .expect("collect platform");
    assert_eq!(collected, 24_000);
    assert_eq!(h.bank.balance_of(h.asset, treasury), 24_000);
    assert_eq!(h.dispatcher.available_platform_fee(h.asset), 0);
}

#[test]
fn crypto_fee_split_collects_under_the_native_key() {
    let h = collected_harness();
    // 80% of the flat fee to the platform, the rest to the integrator.
    assert_eq!(h.dispatcher.available_platform_fee(AssetId::NATIVE), 800);
    assert_eq!(
        h.dispatcher
            .available_integrator_fee(AssetId::NATIVE, h.integrator),
        200
    );

    h.dispatcher
        .collect_integrator_fee(h.integrator, AssetId::NATIVE)
        .expect("collect native");
    assert_eq!(h.bank.balance_of(AssetId::NATIVE, h.integrator), 200);
}

#[test]
fn draining_an_empty_entry_returns_zero_and_never_fails() {
    let h = collected_harness();
    h.dispatcher
        .collect_integrator_fee(h.integrator, h.asset)
        .expect("first drain");

    // Second drain: empty entry, still fine.
    let again = h
        .dispatcher
        .collect_integrator_fee(h.integrator, h.asset)
        .expect("second drain");
    assert_eq!(again, 0);

    // An asset nobody ever dispatched drains to zero too.
    let never_used = AssetId::new();
    let nothing = h
        .dispatcher
        .collect_integrator_fee(h.integrator, never_used)
        .expect("empty drain");
    assert_eq!(nothing, 0);
}

// ---------------------------------------------------------------------------
// Emergency sweep
// ---------------------------------------------------------------------------

#[test]
fn admin_sweeps_stray_balances() {
    let h = collected_harness();
    let engine = h.dispatcher.engine_account();
    // Stray funds sent to the engine outside the dispatch path.
    h.bank.mint(h.asset, engine, 5_000).expect("stray mint");

    let rescue = AccountId::new();
    h.dispatcher
        .sweep_tokens(h.admin, h.asset, 5_000, rescue)
        .expect("sweep");
    assert_eq!(h.bank.balance_of(h.asset, rescue), 5_000);
}

#[test]
fn sweep_is_admin_only() {
    let h = collected_harness();
    let err = h
        .dispatcher
        .sweep_tokens(h.manager, h.asset, 1, h.manager)
        .unwrap_err();
    assert!(matches!(err, DispatchError::Access(_)));
}

#[test]
fn sweep_cannot_touch_promised_fees() {
    let h = collected_harness();
    // Everything the engine holds in the asset is promised to the ledger
    // (24,000 platform + 36,000 integrator); there is no surplus.
    let err = h
        .dispatcher
        .sweep_tokens(h.admin, h.asset, 1, h.admin)
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::SweepExceedsSurplus {
            requested: 1,
            surplus: 0
        }
    ));

    // With stray funds on top, only the surplus is sweepable.
    let engine = h.dispatcher.engine_account();
    h.bank.mint(h.asset, engine, 100).expect("stray mint");
    let err = h
        .dispatcher
        .sweep_tokens(h.admin, h.asset, 101, h.admin)
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::SweepExceedsSurplus { surplus: 100, .. }
    ));
    h.dispatcher
        .sweep_tokens(h.admin, h.asset, 100, h.admin)
        .expect("sweep surplus");
}

// ---------------------------------------------------------------------------
// Admin handoff
// ---------------------------------------------------------------------------

#[test]
fn admin_transfer_round_trip() {
    let h = collected_harness();
    let successor = AccountId::new();
    assert!(h.dispatcher.is_admin(h.admin));

    h.dispatcher
        .transfer_admin(h.admin, successor)
        .expect("transfer");
    assert!(!h.dispatcher.is_admin(h.admin));
    assert!(h.dispatcher.is_admin(successor));

    // Admin-only operations follow the identity.
    assert!(matches!(
        h.dispatcher.grant_manager(h.admin, h.swapper),
        Err(DispatchError::Access(_))
    ));
    h.dispatcher
        .grant_manager(successor, h.swapper)
        .expect("grant by successor");
    assert!(h.dispatcher.is_manager(h.swapper));
}
