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

#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]

//! Gas estimation.
//!
//! Bundlers accept a user operation only when its `preVerificationGas` clears
//! a deterministic byte-cost formula and its limits are not grossly oversized
//! relative to actual usage. This crate computes values that clear both
//! checks without overpaying: the pre-verification efficiency guard, fee
//! buffering, and the gas-limit tuning applied on top of bundler estimates.

mod estimation;
pub use estimation::{
    tune_gas_limit, tuned_gas_limits, GasEstimationError, Settings, CALL_GAS_BUFFER_PERCENT,
    PAYMASTER_VERIFICATION_TUNING_PERCENT, POST_OP_GAS_PAD, VERIFICATION_GAS_SAFETY_PAD,
};

mod fees;
pub use fees::{FeeEstimator, FeeSettings};

mod gas;
pub use gas::{calc_static_pre_verification_gas, estimate_pre_verification_gas, GasOverheads};

pub(crate) mod math;
