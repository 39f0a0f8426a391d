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

//! DVT errors.

use alloy_primitives::{Address, U256};

/// Proposal state machine and BLS failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DvtError {
    /// No proposal with this id exists.
    #[error("unknown proposal {0}")]
    UnknownProposal(U256),
    /// The validator already contributed a signature to this proposal; the
    /// signature set is unchanged.
    #[error("validator {validator} already signed proposal {proposal}")]
    AlreadySigned {
        /// Validator that attempted to sign twice.
        validator: Address,
        /// Proposal id.
        proposal: U256,
    },
    /// The proposal was already executed; execution is terminal.
    #[error("proposal {0} already executed")]
    AlreadyExecuted(U256),
    /// Quorum has not been reached yet.
    #[error("proposal {proposal} not ready: {have} of {quorum} required signatures")]
    NotReady {
        /// Proposal id.
        proposal: U256,
        /// Signatures collected so far.
        have: usize,
        /// Signatures required.
        quorum: usize,
    },
    /// The aggregate proof does not verify against the proposal message.
    #[error("aggregate signature does not verify for proposal {0}")]
    InvalidAggregate(U256),
    /// The proposal expired before the attempted transition.
    #[error("proposal {0} expired")]
    Expired(U256),
    /// The secret bytes are not a canonical non-zero scalar.
    #[error("invalid bls secret key")]
    InvalidKey,
    /// Bytes do not decode to a valid curve point.
    #[error("invalid bls {0} encoding")]
    InvalidPoint(&'static str),
    /// Aggregation over an empty set has no meaning.
    #[error("cannot aggregate an empty set of {0}")]
    EmptyAggregate(&'static str),
}
