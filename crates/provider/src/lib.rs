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

//! External collaborators of the toolkit.
//!
//! The core never opens a transport itself. Everything it needs from the
//! outside world — entry point nonce reads, operator and deposit state,
//! price data, bundler submission, and signing — comes in through the traits
//! here. Results are decoded into explicit structs at this boundary;
//! unexpected shapes are rejected as typed errors instead of propagating
//! loosely-typed values inward.

mod error;
pub use error::{ProviderError, ProviderResult};

mod traits;
#[cfg(feature = "test-utils")]
pub use traits::{
    MockBundler, MockDepositLedger, MockEntryPoint, MockFeeOracle, MockOperatorRegistry,
    MockPriceOracle, MockSigner,
};
pub use traits::{
    Bundler, DepositLedger, EntryPoint, FeeOracle, OperatorRegistry, PriceOracle, Signer,
};

mod types;
pub use types::{
    OperatorAccount, OraclePrice, RpcGasEstimate, RpcLog, RpcUserOperation, UserOperationReceipt,
};
