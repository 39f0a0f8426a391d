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

//! Opkit common types
//!
//! The in-memory user operation model, its packed v0.7 wire form and signing
//! hash, the 128-bit pair bit layout shared by `accountGasLimits`, `gasFees`
//! and `paymasterAndData`, and the chain context threaded through every call
//! site that hashes or submits.

mod chain;
pub use chain::{ChainSpec, ENTRY_POINT_ADDRESS_V0_7};

mod error;
pub use error::CodecError;

mod gas;
pub use gas::{GasEstimate, GasFees};

mod pack;
pub use pack::{pack_pair, try_u128, unpack_pair};

mod timestamp;
pub use timestamp::Timestamp;

mod user_operation;
pub use user_operation::{
    dummy_signature, PackedUserOperation, UserOperation, UserOperationBuilder,
    UserOperationRequiredFields, PAYMASTER_DATA_PREFIX_LEN, SIGNATURE_LENGTH,
};
