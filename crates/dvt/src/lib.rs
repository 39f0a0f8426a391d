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

//! DVT slashing.
//!
//! Operators suspected of misbehavior are slashed through proposals that
//! collect threshold validator agreement, proven to the onchain verifier as
//! one aggregate BLS signature. This crate models the proposal lifecycle and
//! builds the aggregate proof in the verifier's exact byte encoding — the
//! encoding is a fixed external contract, and any padding or ordering
//! mismatch produces a proof that looks valid but never verifies.

mod bls;
pub use bls::{
    aggregate_public_keys, aggregate_signatures, verify, AggregateProof, BlsKeyMaterial,
    BlsPublicKey, BlsSignature, BLS_DST, PUBLIC_KEY_ENCODED_LEN, SIGNATURE_ENCODED_LEN,
};

mod error;
pub use error::DvtError;

mod proposal;
pub use proposal::{
    proposal_digest, ProposalEngine, ProposalStatus, SlashLevel, SlashPayload, SlashProposal,
};
