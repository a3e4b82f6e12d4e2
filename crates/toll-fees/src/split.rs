//! # Fee Split Arithmetic
//!
//! Pure computation of one dispatch's fee breakdown from the resolved
//! rates. Remainders always fall to the integrator side of a split, so the
//! parts reassemble exactly:
//!
//! ```text
//! token_fee_amount + post_fee_amount          == input_amount
//! platform_token_fee + integrator_token_fee   == token_fee_amount
//! platform_crypto_fee + integrator_crypto_fee == total_crypto_fee
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ResolvedFees;

/// The complete fee breakdown for one dispatch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Percentage fee withheld from the input amount.
    pub token_fee_amount: u128,
    /// What remains for the provider after the token fee.
    pub post_fee_amount: u128,
    /// Platform's cut of the token fee.
    pub platform_token_fee: u128,
    /// Integrator's cut of the token fee.
    pub integrator_token_fee: u128,
    /// Flat native-currency fee charged for the dispatch.
    pub total_crypto_fee: u128,
    /// Platform's cut of the crypto fee.
    pub platform_crypto_fee: u128,
    /// Integrator's cut of the crypto fee.
    pub integrator_crypto_fee: u128,
}

impl FeeSplit {
    /// Break an input amount down under the resolved rates.
    pub fn compute(input_amount: u128, fees: &ResolvedFees) -> Self {
        let token_fee_amount = fees.token_fee_rate.apply(input_amount);
        let post_fee_amount = input_amount - token_fee_amount;

        let platform_token_fee = fees.platform_token_share.apply(token_fee_amount);
        let integrator_token_fee = token_fee_amount - platform_token_fee;

        let total_crypto_fee = fees.total_crypto_fee;
        let platform_crypto_fee = fees.platform_crypto_share.apply(total_crypto_fee);
        let integrator_crypto_fee = total_crypto_fee - platform_crypto_fee;

        Self {
            token_fee_amount,
            post_fee_amount,
            platform_token_fee,
            integrator_token_fee,
            total_crypto_fee,
            platform_crypto_fee,
            integrator_crypto_fee,
        }
    }
}
