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

//! Gas fee and gas estimate values.

use serde::{Deserialize, Serialize};

/// EIP-1559 fees for a user operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasFees {
    /// Maximum fee per gas.
    pub max_fee_per_gas: u128,
    /// Maximum priority fee per gas.
    pub max_priority_fee_per_gas: u128,
}

/// Gas limits produced by estimation, ready to embed into a user operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasEstimate {
    /// Gas covering bundler-side overhead (calldata cost etc.).
    pub pre_verification_gas: u128,
    /// Gas limit for the account execution call.
    pub call_gas_limit: u128,
    /// Gas limit for account verification.
    pub verification_gas_limit: u128,
    /// Gas limit for paymaster verification, when a paymaster is present.
    pub paymaster_verification_gas_limit: Option<u128>,
    /// Gas limit for the paymaster post-op call, when a paymaster is present.
    pub paymaster_post_op_gas_limit: Option<u128>,
}
