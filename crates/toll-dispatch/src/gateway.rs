//! # Provider Gateway Interface
//!
//! External liquidity and bridging providers are opaque callees behind the
//! [`ProviderGateway`] trait. The engine hands a gateway its call data
//! verbatim and interprets nothing about the result beyond
//! success/failure — the only thing the engine verifies afterwards is how
//! much of the granted spending capacity the provider consumed.
//!
//! On the token path, the router named in the request holds the capacity
//! grant and pulls the custodied input through
//! [`AssetBank::transfer_from`]. On the native path the router is itself
//! the callee: the forwarded value is delivered to the router's account
//! before [`ProviderGateway::execute`] runs, and [`GatewayCall::value`]
//! reports the delivered amount.
//!
//! [`StubBridgeGateway`] is the in-process provider used by the test
//! suites: its "calldata" is a JSON-encoded [`StubCallData`] naming the
//! exact amount it will pull, which makes under- and over-consumption
//! scenarios one field away.
//!
//! [`AssetBank::transfer_from`]: toll_asset::AssetBank::transfer_from

use serde::{Deserialize, Serialize};
use thiserror::Error;

use toll_asset::{AssetBank, BankError};
use toll_core::{AccountId, AssetId};

/// Errors surfaced by a provider gateway. The dispatcher propagates these
/// verbatim as the underlying reason of its external-call failure.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The call data could not be interpreted by the provider.
    #[error("malformed call data: {0}")]
    MalformedCallData(String),

    /// The provider rejected the call.
    #[error("provider rejected the call: {0}")]
    Rejected(String),

    /// A custody movement inside the provider failed.
    #[error(transparent)]
    Bank(#[from] BankError),
}

/// One provider invocation, as seen from the callee.
pub struct GatewayCall<'a> {
    /// The settlement substrate the provider moves funds through.
    pub bank: &'a AssetBank,
    /// The engine's custody account (the owner of the capacity grant).
    pub engine: AccountId,
    /// The router holding the capacity grant.
    pub router: AccountId,
    /// Native value delivered with the call (native path only; zero on the
    /// token path).
    pub value: u128,
    /// Opaque call data assembled off-process.
    pub data: &'a [u8],
}

/// An external provider callee.
pub trait ProviderGateway: Send + Sync {
    /// The account identity of this call target, checked against the
    /// provider whitelist.
    fn id(&self) -> AccountId;

    /// Execute the provider leg. Failures abort the whole dispatch.
    fn execute(&self, call: GatewayCall<'_>) -> Result<(), GatewayError>;
}

// ---------------------------------------------------------------------------
// Stub provider
// ---------------------------------------------------------------------------

/// Call data understood by [`StubBridgeGateway`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StubCallData {
    /// Asset the stub will pull (or expect as value when native).
    pub asset: AssetId,
    /// Exact amount the stub will consume.
    pub amount: u128,
    /// Destination network ordinal, recorded nowhere — present because
    /// real provider call data carries it.
    pub destination_chain: u64,
}

impl StubCallData {
    /// Encode as the opaque bytes a dispatch forwards.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from forwarded bytes.
    pub fn decode(data: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(data).map_err(|e| GatewayError::MalformedCallData(e.to_string()))
    }
}

/// In-process provider that consumes exactly what its call data names.
///
/// Token path: pulls `amount` of `asset` from the engine's custody through
/// the router's capacity grant into the sink account. Native path: checks
/// the delivered value matches `amount`.
#[derive(Debug, Clone)]
pub struct StubBridgeGateway {
    id: AccountId,
    sink: AccountId,
}

impl StubBridgeGateway {
    /// A stub whose pulled funds land on its own account.
    pub fn new(id: AccountId) -> Self {
        Self { id, sink: id }
    }

    /// A stub delivering pulled funds to a separate sink account.
    pub fn with_sink(id: AccountId, sink: AccountId) -> Self {
        Self { id, sink }
    }
}

impl ProviderGateway for StubBridgeGateway {
    fn id(&self) -> AccountId {
        self.id
    }

    fn execute(&self, call: GatewayCall<'_>) -> Result<(), GatewayError> {
        let decoded = StubCallData::decode(call.data)?;
        if decoded.asset.is_native() {
            if call.value != decoded.amount {
                return Err(GatewayError::Rejected(format!(
                    "expected native value {}, got {}",
                    decoded.amount, call.value
                )));
            }
            Ok(())
        } else {
            call.bank.transfer_from(
                decoded.asset,
                call.router,
                call.engine,
                self.sink,
                decoded.amount,
            )?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toll_asset::AssetInfo;

    #[test]
    fn call_data_round_trip() {
        let data = StubCallData {
            asset: AssetId::new(),
            amount: 940_000,
            destination_chain: 228,
        };
        let bytes = data.encode().expect("encode");
        let back = StubCallData::decode(&bytes).expect("decode");
        assert_eq!(back.asset, data.asset);
        assert_eq!(back.amount, 940_000);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = StubCallData::decode(b"not json").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedCallData(_)));
    }

    #[test]
    fn stub_pulls_exactly_what_call_data_names() {
        let bank = AssetBank::new();
        let asset = AssetId::new();
        bank.register_asset(asset, AssetInfo::plain("TKN"))
            .expect("register");
        let engine = AccountId::new();
        let router = AccountId::new();
        bank.mint(asset, engine, 1_000_000).expect("mint");
        bank.approve(asset, engine, router, 940_000).expect("approve");

        let gateway = StubBridgeGateway::new(router);
        let data = StubCallData {
            asset,
            amount: 940_000,
            destination_chain: 228,
        }
        .encode()
        .expect("encode");

        gateway
            .execute(GatewayCall {
                bank: &bank,
                engine,
                router,
                value: 0,
                data: &data,
            })
            .expect("execute");

        assert_eq!(bank.balance_of(asset, router), 940_000);
        assert_eq!(bank.capacity(asset, engine, router), 0);
    }

    #[test]
    fn native_stub_checks_delivered_value() {
        let bank = AssetBank::new();
        let router = AccountId::new();
        let gateway = StubBridgeGateway::new(router);
        let data = StubCallData {
            asset: AssetId::NATIVE,
            amount: 500,
            destination_chain: 1,
        }
        .encode()
        .expect("encode");

        let err = gateway
            .execute(GatewayCall {
                bank: &bank,
                engine: AccountId::new(),
                router,
                value: 499,
                data: &data,
            })
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));
    }
}
