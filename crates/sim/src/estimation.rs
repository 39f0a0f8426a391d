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

//! Estimation settings and gas-limit tuning.
//!
//! Bundlers reject operations whose limits are far above actual usage
//! (efficiency ratio below ~0.4), so raw estimates cannot simply be padded
//! upward. The tuning here reproduces limits measured to clear both the
//! too-low and too-inefficient rejections.

use opkit_types::{CodecError, GasEstimate, SIGNATURE_LENGTH};

use crate::math;

/// Pad added to the account verification gas limit on top of the bundler
/// estimate, covering cold-storage paths the estimate may have missed.
pub const VERIFICATION_GAS_SAFETY_PAD: u128 = 80_000;

/// Buffer applied to the estimated call gas limit. 1.1x safety buffer.
pub const CALL_GAS_BUFFER_PERCENT: u32 = 10;

/// Fraction of the bundler's paymaster verification estimate actually used.
/// Estimates run ~2x over measured usage; submitting 45% keeps the
/// efficiency ratio above the 0.4 acceptance threshold.
pub const PAYMASTER_VERIFICATION_TUNING_PERCENT: u32 = 45;

/// Pad added to the paymaster post-op gas limit for oracle-path settlement.
pub const POST_OP_GAS_PAD: u128 = 10_000;

/// Gas estimation failures.
#[derive(Debug, thiserror::Error)]
pub enum GasEstimationError {
    /// The pre-verification value was still moving when the iteration cap
    /// was reached. The caller may retry with a larger floor.
    #[error("gas estimation did not converge after {iterations} iterations")]
    DidNotConverge {
        /// Iterations performed before giving up.
        iterations: usize,
    },
    /// A bundler-returned value did not fit its wire width.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Tunables for the pre-verification guard.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    /// Safety buffer over the byte-cost baseline, in percent. 20 = the 1.2x
    /// multiplier bundlers are calibrated against.
    pub pvg_buffer_percent: u32,
    /// Additive floor on top of the buffered baseline.
    pub pvg_floor: u128,
    /// Hard cap on stabilization rounds.
    pub max_pvg_iterations: usize,
    /// Byte length of the placeholder signature; must equal the length the
    /// real signer produces.
    pub signature_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pvg_buffer_percent: 20,
            pvg_floor: 2_000,
            max_pvg_iterations: 3,
            signature_length: SIGNATURE_LENGTH,
        }
    }
}

/// Caps an estimated gas limit so the efficiency ratio stays above target.
///
/// The bundler checks `actual / limit >= target`; given a nominal actual
/// usage, the acceptable ceiling is `actual / target`. Returns the more
/// restrictive of the estimate and that ceiling.
pub fn tune_gas_limit(estimate: u128, nominal_actual: u128, target_efficiency_percent: u32) -> u128 {
    if estimate == 0 {
        return 0;
    }
    let ceiling = nominal_actual.saturating_mul(100) / target_efficiency_percent as u128;
    estimate.min(ceiling)
}

/// Applies the measured tuning profile to a raw bundler estimate.
pub fn tuned_gas_limits(estimate: &GasEstimate) -> GasEstimate {
    GasEstimate {
        pre_verification_gas: estimate.pre_verification_gas,
        verification_gas_limit: estimate
            .verification_gas_limit
            .saturating_add(VERIFICATION_GAS_SAFETY_PAD),
        call_gas_limit: math::increase_by_percent_u128(
            estimate.call_gas_limit,
            CALL_GAS_BUFFER_PERCENT,
        ),
        paymaster_verification_gas_limit: estimate
            .paymaster_verification_gas_limit
            .map(|v| math::percent_u128(v, PAYMASTER_VERIFICATION_TUNING_PERCENT)),
        paymaster_post_op_gas_limit: estimate
            .paymaster_post_op_gas_limit
            .map(|v| v.saturating_add(POST_OP_GAS_PAD)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tune_gas_limit() {
        // Estimate below the efficiency ceiling passes through.
        assert_eq!(tune_gas_limit(100_000, 60_000, 40), 100_000);
        // Estimate above the ceiling is capped at actual / target.
        assert_eq!(tune_gas_limit(300_000, 60_000, 40), 150_000);
        assert_eq!(tune_gas_limit(0, 60_000, 40), 0);
    }

    #[test]
    fn test_tuned_gas_limits() {
        let tuned = tuned_gas_limits(&GasEstimate {
            pre_verification_gas: 50_000,
            verification_gas_limit: 60_000,
            call_gas_limit: 100_000,
            paymaster_verification_gas_limit: Some(200_000),
            paymaster_post_op_gas_limit: Some(100_000),
        });
        assert_eq!(tuned.pre_verification_gas, 50_000);
        assert_eq!(tuned.verification_gas_limit, 140_000);
        assert_eq!(tuned.call_gas_limit, 110_000);
        assert_eq!(tuned.paymaster_verification_gas_limit, Some(90_000));
        assert_eq!(tuned.paymaster_post_op_gas_limit, Some(110_000));
    }
}
