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

//! Fee estimation for user operations.

use opkit_provider::FeeOracle;
use opkit_types::GasFees;

use crate::math;

/// Fee buffering policy.
#[derive(Clone, Copy, Debug)]
pub struct FeeSettings {
    /// Buffer over the network estimate, in percent, absorbing volatility
    /// between estimation and inclusion.
    pub buffer_percent: u32,
    /// Floor on the priority fee; bundlers drop operations tipping less.
    pub min_priority_fee: u128,
    /// Fees used when the oracle read fails.
    pub fallback: GasFees,
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            buffer_percent: 50,
            // 0.5 gwei
            min_priority_fee: 500_000_000,
            fallback: GasFees {
                // 50 gwei / 2 gwei
                max_fee_per_gas: 50_000_000_000,
                max_priority_fee_per_gas: 2_000_000_000,
            },
        }
    }
}

/// Produces submission-ready fees from a network fee oracle.
#[derive(Debug)]
pub struct FeeEstimator<O> {
    oracle: O,
    settings: FeeSettings,
}

impl<O: FeeOracle> FeeEstimator<O> {
    /// Creates an estimator with the default buffering policy.
    pub fn new(oracle: O) -> Self {
        Self::with_settings(oracle, FeeSettings::default())
    }

    /// Creates an estimator with an explicit policy.
    pub fn with_settings(oracle: O, settings: FeeSettings) -> Self {
        Self { oracle, settings }
    }

    /// Returns buffered fees for a new user operation.
    ///
    /// A failed oracle read degrades to the configured fallback fees rather
    /// than blocking submission.
    pub async fn required_fees(&self) -> GasFees {
        let fees = match self.oracle.estimate_eip1559_fees().await {
            Ok(fees) => GasFees {
                max_fee_per_gas: math::increase_by_percent_u128(
                    fees.max_fee_per_gas,
                    self.settings.buffer_percent,
                ),
                max_priority_fee_per_gas: math::increase_by_percent_u128(
                    fees.max_priority_fee_per_gas,
                    self.settings.buffer_percent,
                ),
            },
            Err(err) => {
                tracing::warn!(%err, "fee oracle read failed, using fallback fees");
                self.settings.fallback
            }
        };

        GasFees {
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees
                .max_priority_fee_per_gas
                .max(self.settings.min_priority_fee),
        }
    }
}
