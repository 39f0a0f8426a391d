// This file is part of Opkit.
//
// Opkit is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Opkit is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Opkit.
// If not, see https://www.gnu.org/licenses/.

//! Pre-verification gas.
//!
//! Bundlers require a submitted `preVerificationGas` of at least a
//! deterministic function of the operation's calldata footprint, usually with
//! a safety margin on top. The guard here computes that value locally so a
//! submission clears the check on the first try.

use alloy_primitives::U256;
use alloy_sol_types::SolValue;
use opkit_types::{dummy_signature, PackedUserOperation, UserOperation};

use crate::{estimation::GasEstimationError, math, Settings};

/// Gas overheads for user operations, used in calculating the
/// pre-verification gas. Values match the fee schedule bundlers enforce
/// (EIP-2028 calldata costs plus per-operation accounting overhead).
#[derive(Clone, Copy, Debug)]
pub struct GasOverheads {
    /// Fixed per-bundle transaction overhead, amortized over the bundle.
    pub fixed: U256,
    /// Overhead per user operation.
    pub per_user_op: U256,
    /// Overhead per 32-byte word of the packed operation.
    pub per_user_op_word: U256,
    /// Calldata cost of a zero byte.
    pub zero_byte: U256,
    /// Calldata cost of a non-zero byte.
    pub non_zero_byte: U256,
    /// Expected bundle size the fixed overhead is divided across.
    pub bundle_size: U256,
}

impl Default for GasOverheads {
    fn default() -> Self {
        Self {
            fixed: U256::from(21_000),
            per_user_op: U256::from(18_300),
            per_user_op_word: U256::from(4),
            zero_byte: U256::from(4),
            non_zero_byte: U256::from(16),
            bundle_size: U256::from(1),
        }
    }
}

/// Byte-cost baseline for the given packed operation.
pub fn calc_static_pre_verification_gas(op: &PackedUserOperation, ov: &GasOverheads) -> U256 {
    let encoded = op.abi_encode();
    // The packed operation's ABI encoding is always a multiple of 32 bytes.
    let length_in_words = encoded.len() / 32;
    let call_data_cost: U256 = encoded
        .iter()
        .map(|&b| if b == 0 { ov.zero_byte } else { ov.non_zero_byte })
        .fold(U256::ZERO, |a, b| a + b);

    ov.fixed / ov.bundle_size
        + call_data_cost
        + ov.per_user_op
        + ov.per_user_op_word * U256::from(length_in_words)
}

/// Computes a `preVerificationGas` the bundler's acceptance rule will take.
///
/// The operation is re-derived with a worst-case placeholder signature of the
/// final length and with the pre-verification word seeded all-ones, so the
/// real signature and the final value can only shrink the byte cost. A 1.2x
/// buffer and an additive floor go on top of the baseline, and the result is
/// re-checked with the candidate embedded until it stabilizes; estimation
/// that is still moving after [`Settings::max_pvg_iterations`] rounds fails
/// rather than looping.
pub fn estimate_pre_verification_gas(
    op: &UserOperation,
    settings: &Settings,
) -> Result<U256, GasEstimationError> {
    let ov = GasOverheads::default();
    let mut op = op.clone();
    op.signature = dummy_signature(settings.signature_length);
    op.pre_verification_gas = U256::MAX;

    let mut pvg = U256::ZERO;
    for iteration in 1..=settings.max_pvg_iterations {
        let baseline = calc_static_pre_verification_gas(&op.pack(), &ov);
        let candidate = math::increase_by_percent(baseline, settings.pvg_buffer_percent)
            + U256::from(settings.pvg_floor);
        if candidate <= pvg {
            tracing::debug!(%pvg, iteration, "pre-verification gas stabilized");
            return Ok(pvg);
        }
        pvg = candidate;
        op.pre_verification_gas = pvg;
    }
    Err(GasEstimationError::DidNotConverge { iterations: settings.max_pvg_iterations })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, Bytes};
    use opkit_types::{UserOperationBuilder, UserOperationRequiredFields};

    use super::*;

    fn op_with_call_data(call_data: Bytes) -> UserOperation {
        UserOperationBuilder::new(UserOperationRequiredFields {
            sender: Address::new([0x42; 20]),
            nonce: U256::from(7),
            call_data,
            call_gas_limit: 500_000,
            verification_gas_limit: 100_000,
            pre_verification_gas: U256::ZERO,
            max_priority_fee_per_gas: 1_000_000_000,
            max_fee_per_gas: 30_000_000_000,
            signature: Bytes::new(),
        })
        .build()
    }

    #[test]
    fn test_guard_clears_baseline_with_buffer() {
        let settings = Settings::default();
        let ov = GasOverheads::default();

        // Mixed zero and non-zero calldata across the whole supported range.
        for len in (0..=10_000usize).step_by(97).chain([10_000]) {
            let data: Vec<u8> = (0..len).map(|i| (i % 7 == 0) as u8 * 0xab).collect();
            let op = op_with_call_data(data.into());
            let pvg = estimate_pre_verification_gas(&op, &settings).unwrap();

            // The accepted value must cover the baseline of the operation as
            // it will actually be submitted, times the safety multiplier.
            let mut submitted = op.clone();
            submitted.signature = dummy_signature(settings.signature_length);
            submitted.pre_verification_gas = pvg;
            let baseline = calc_static_pre_verification_gas(&submitted.pack(), &ov);
            assert!(
                pvg >= math::increase_by_percent(baseline, settings.pvg_buffer_percent),
                "pvg {pvg} below buffered baseline at calldata length {len}"
            );
        }
    }

    #[test]
    fn test_guard_is_deterministic_and_grows_with_calldata() {
        let settings = Settings::default();
        let small = op_with_call_data(vec![0xff; 100].into());
        let large = op_with_call_data(vec![0xff; 1_000].into());

        let a = estimate_pre_verification_gas(&small, &settings).unwrap();
        let b = estimate_pre_verification_gas(&small, &settings).unwrap();
        assert_eq!(a, b);
        assert!(estimate_pre_verification_gas(&large, &settings).unwrap() > a);
    }

    #[test]
    fn test_zero_bytes_cost_less() {
        let settings = Settings::default();
        let zeros = estimate_pre_verification_gas(&op_with_call_data(vec![0; 512].into()), &settings)
            .unwrap();
        let ones = estimate_pre_verification_gas(&op_with_call_data(vec![1; 512].into()), &settings)
            .unwrap();
        assert!(zeros < ones);
    }

    #[test]
    fn test_iteration_cap_reported() {
        let settings = Settings { max_pvg_iterations: 0, ..Default::default() };
        let err = estimate_pre_verification_gas(&op_with_call_data(Bytes::new()), &settings)
            .unwrap_err();
        assert!(matches!(err, GasEstimationError::DidNotConverge { iterations: 0 }));
    }
}
