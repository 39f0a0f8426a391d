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

//! Chain context.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Canonical address of the v0.7 entry point deployment.
pub const ENTRY_POINT_ADDRESS_V0_7: Address =
    address!("0000000071727De22E5E9d8BAf0edAc6f37da032");

/// The network a user operation is built for.
///
/// Threaded explicitly through every function that hashes, estimates, or
/// submits. Nothing in this workspace reads chain selection from ambient
/// process state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    /// Chain id, bound into every user operation hash and BLS proposal
    /// message.
    pub id: u64,
    /// Entry point contract this chain's operations are hashed against and
    /// submitted to.
    pub entry_point_address: Address,
}

impl ChainSpec {
    /// Spec for a chain using the canonical v0.7 entry point deployment.
    pub fn with_canonical_entry_point(id: u64) -> Self {
        Self { id, entry_point_address: ENTRY_POINT_ADDRESS_V0_7 }
    }
}
