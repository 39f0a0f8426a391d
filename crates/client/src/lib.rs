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

//! High-level gasless submission.
//!
//! Wires the codec, sponsorship, and estimation layers into the full flow:
//! read nonce → build the sponsored operation → clear the bundler's gas
//! checks → hash → sign → submit. Everything network-facing goes through the
//! collaborator traits; this crate owns only the sequencing and the
//! per-sender serialization that keeps nonces consistent.

mod calldata;
pub use calldata::{encode_execution, encode_token_transfer};

mod gasless;
pub use gasless::{ClientError, GaslessClient, TransactionIntent};

mod receipt;
pub use receipt::{post_op_fee, PostOpFee, POST_OP_PROCESSED_TOPIC};
