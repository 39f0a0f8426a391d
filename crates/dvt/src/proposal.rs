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

//! Slash proposal lifecycle.
//!
//! `Open → Signed → Executed`, with `Open`/`Signed` expiring on an external
//! clock. One signature per validator per proposal; quorum is a configured
//! count, not recomputed here. The engine is a single-writer structure —
//! concurrent validators submit through whatever lock the caller wraps it
//! in, and the signature-set insert below is one check-and-insert so a
//! double sign can never land between a check and an update.

use std::{
    collections::{btree_map::Entry, BTreeMap},
    time::Duration,
};

use alloy_primitives::{keccak256, Address, B256, U256};
use opkit_types::Timestamp;

use crate::{
    bls::{verify, AggregateProof, BlsSignature},
    DvtError,
};

/// Severity of a slash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SlashLevel {
    /// Reputational warning only.
    Warning = 0,
    /// First-tier stake penalty.
    Tier1 = 1,
    /// Second-tier stake penalty.
    Tier2 = 2,
    /// Ejection-level penalty.
    Tier3 = 3,
}

/// Lifecycle state of a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Collecting signatures.
    Open,
    /// Quorum reached; executable.
    Signed,
    /// Executed onchain. Terminal.
    Executed,
    /// Deadline passed before execution. Terminal.
    Expired,
}

/// A slash proposal and its collected signatures.
#[derive(Clone, Debug)]
pub struct SlashProposal {
    /// Proposal id, assigned on creation.
    pub id: U256,
    /// Operator accused of misbehavior.
    pub operator: Address,
    /// Proposed severity.
    pub level: SlashLevel,
    /// Human-readable justification.
    pub reason: String,
    /// Creation time, from the caller's clock.
    pub created_at: Timestamp,
    /// Current lifecycle state.
    pub status: ProposalStatus,
    signatures: BTreeMap<Address, BlsSignature>,
}

impl SlashProposal {
    /// Number of validators that have signed.
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Whether this validator already signed.
    pub fn has_signed(&self, validator: Address) -> bool {
        self.signatures.contains_key(&validator)
    }

    /// The collected signatures, keyed by validator.
    pub fn signatures(&self) -> impl Iterator<Item = (&Address, &BlsSignature)> {
        self.signatures.iter()
    }
}

/// The reputation effects bound into a slash execution: which users are
/// rescored, to what, and in which epoch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlashPayload {
    /// Accounts whose reputation the slash adjusts.
    pub affected_users: Vec<Address>,
    /// New scores, index-aligned with `affected_users`.
    pub new_scores: Vec<U256>,
    /// Reputation epoch the scores apply to.
    pub epoch: U256,
}

/// Message digest validators sign for a proposal.
///
/// Packed encoding of `(proposal_id, operator, level, affected_users[],
/// new_scores[], epoch, chain_id)`: id and scores as 32-byte words, the
/// operator as its 20 raw bytes, the level as one byte, array elements
/// word-padded. Binding the id and chain id makes a signature useless on any
/// other proposal or chain.
pub fn proposal_digest(
    proposal_id: U256,
    operator: Address,
    level: SlashLevel,
    payload: &SlashPayload,
    chain_id: u64,
) -> B256 {
    let mut buf =
        Vec::with_capacity(32 + 20 + 1 + 32 * (payload.affected_users.len() + payload.new_scores.len()) + 64);
    buf.extend_from_slice(&proposal_id.to_be_bytes::<32>());
    buf.extend_from_slice(operator.as_slice());
    buf.push(level as u8);
    for user in &payload.affected_users {
        buf.extend_from_slice(user.into_word().as_slice());
    }
    for score in &payload.new_scores {
        buf.extend_from_slice(&score.to_be_bytes::<32>());
    }
    buf.extend_from_slice(&payload.epoch.to_be_bytes::<32>());
    buf.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    keccak256(&buf)
}

/// The slash proposal state machine.
pub struct ProposalEngine {
    chain_id: u64,
    quorum: usize,
    ttl: Duration,
    next_id: U256,
    proposals: BTreeMap<U256, SlashProposal>,
}

impl ProposalEngine {
    /// Creates an engine for one chain. `quorum` is the externally
    /// configured signature count that makes a proposal executable; `ttl`
    /// is how long a proposal stays actionable after creation.
    pub fn new(chain_id: u64, quorum: usize, ttl: Duration) -> Self {
        Self { chain_id, quorum, ttl, next_id: U256::from(1), proposals: BTreeMap::new() }
    }

    /// Opens a proposal against `operator`. Always succeeds; returns the
    /// assigned id.
    pub fn create_proposal(
        &mut self,
        operator: Address,
        level: SlashLevel,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> U256 {
        let id = self.next_id;
        self.next_id += U256::from(1);
        self.proposals.insert(
            id,
            SlashProposal {
                id,
                operator,
                level,
                reason: reason.into(),
                created_at: now,
                status: ProposalStatus::Open,
                signatures: BTreeMap::new(),
            },
        );
        tracing::debug!(%id, %operator, ?level, "slash proposal created");
        id
    }

    /// Looks up a proposal.
    pub fn proposal(&self, id: U256) -> Option<&SlashProposal> {
        self.proposals.get(&id)
    }

    /// Records `validator`'s signature on a proposal.
    ///
    /// Rejects a second signature from the same validator without touching
    /// the set. Reaching quorum moves the proposal to `Signed`.
    pub fn sign(
        &mut self,
        id: U256,
        validator: Address,
        signature: BlsSignature,
        now: Timestamp,
    ) -> Result<ProposalStatus, DvtError> {
        let quorum = self.quorum;
        let proposal = Self::actionable(&mut self.proposals, id, self.ttl, now)?;

        match proposal.signatures.entry(validator) {
            Entry::Occupied(_) => return Err(DvtError::AlreadySigned { validator, proposal: id }),
            Entry::Vacant(slot) => {
                slot.insert(signature);
            }
        }

        if proposal.status == ProposalStatus::Open && proposal.signatures.len() >= quorum {
            proposal.status = ProposalStatus::Signed;
            tracing::debug!(%id, quorum, "proposal reached quorum");
        }
        Ok(proposal.status)
    }

    /// Verifies an aggregate proof against the proposal's bound message.
    pub fn verify_aggregate(
        &self,
        id: U256,
        payload: &SlashPayload,
        proof: &AggregateProof,
    ) -> Result<bool, DvtError> {
        let proposal = self.proposals.get(&id).ok_or(DvtError::UnknownProposal(id))?;
        let digest =
            proposal_digest(proposal.id, proposal.operator, proposal.level, payload, self.chain_id);
        Ok(verify(&proof.public_key, digest.as_slice(), &proof.signature))
    }

    /// Executes a `Signed` proposal with its aggregate proof.
    ///
    /// `Executed` is terminal: repeating the call reports the violation and
    /// mutates nothing.
    pub fn execute(
        &mut self,
        id: U256,
        payload: &SlashPayload,
        proof: &AggregateProof,
        now: Timestamp,
    ) -> Result<(), DvtError> {
        {
            let proposal = Self::actionable(&mut self.proposals, id, self.ttl, now)?;
            match proposal.status {
                ProposalStatus::Open => {
                    return Err(DvtError::NotReady {
                        proposal: id,
                        have: proposal.signatures.len(),
                        quorum: self.quorum,
                    })
                }
                ProposalStatus::Signed => {}
                // actionable() already rejected the terminal states
                ProposalStatus::Executed | ProposalStatus::Expired => unreachable!(),
            }
        }

        if !self.verify_aggregate(id, payload, proof)? {
            return Err(DvtError::InvalidAggregate(id));
        }

        let proposal = self.proposals.get_mut(&id).expect("checked above");
        proposal.status = ProposalStatus::Executed;
        tracing::debug!(%id, "proposal executed");
        Ok(())
    }

    /// Fetches a proposal that can still change state, applying lazy expiry
    /// against the caller's clock first.
    fn actionable<'a>(
        proposals: &'a mut BTreeMap<U256, SlashProposal>,
        id: U256,
        ttl: Duration,
        now: Timestamp,
    ) -> Result<&'a mut SlashProposal, DvtError> {
        let proposal = proposals.get_mut(&id).ok_or(DvtError::UnknownProposal(id))?;
        match proposal.status {
            ProposalStatus::Executed => return Err(DvtError::AlreadyExecuted(id)),
            ProposalStatus::Expired => return Err(DvtError::Expired(id)),
            ProposalStatus::Open | ProposalStatus::Signed => {
                if now > proposal.created_at + ttl {
                    proposal.status = ProposalStatus::Expired;
                    return Err(DvtError::Expired(id));
                }
            }
        }
        Ok(proposal)
    }
}
