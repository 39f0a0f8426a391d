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

//! `paymasterAndData` segment encodings.
//!
//! Both sponsorship variants share the layout
//! `[paymaster(20)][packed gas limits(32)][selector(20)]`: the selector is the
//! payment token for the deposit variant and the sponsoring operator for the
//! SuperPaymaster. Contracts read the selector at byte offset 52, so field
//! order here never varies. Optional trailers follow the selector: the
//! deposit variant may append a `[validUntil(6)][validAfter(6)]` window, the
//! SuperPaymaster an exchange-rate ceiling word.

use alloy_primitives::{Address, Bytes, U256};
use opkit_types::{pack_pair, unpack_pair, CodecError, Timestamp, PAYMASTER_DATA_PREFIX_LEN};

/// Length of a segment with no trailer: 52-byte prefix plus the selector.
pub const PAYMASTER_SEGMENT_BASE_LEN: usize = PAYMASTER_DATA_PREFIX_LEN + 20;

const DEPOSIT_WINDOW_LEN: usize = PAYMASTER_SEGMENT_BASE_LEN + 12;
const SUPER_RATE_LEN: usize = PAYMASTER_SEGMENT_BASE_LEN + 32;

/// Time range during which a deposit-sponsored operation validates.
///
/// Encoded as two 6-byte big-endian timestamps after the token address. The
/// SuperPaymaster variant never carries one; its contract derives validity
/// from the cached oracle price age internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidityWindow {
    /// Operation is invalid after this time.
    pub valid_until: Timestamp,
    /// Operation is invalid before this time.
    pub valid_after: Timestamp,
}

impl ValidityWindow {
    /// A window opening `grace` seconds in the past and closing `lifetime`
    /// seconds after `now`.
    pub fn around(now: Timestamp, lifetime_secs: u64, grace_secs: u64) -> Self {
        Self {
            valid_until: now + std::time::Duration::from_secs(lifetime_secs),
            valid_after: now - std::time::Duration::from_secs(grace_secs),
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.valid_until.seconds_since_epoch().to_be_bytes()[2..]);
        out.extend_from_slice(&self.valid_after.seconds_since_epoch().to_be_bytes()[2..]);
    }

    fn decode(bytes: &[u8; 12]) -> Self {
        let mut until = [0u8; 8];
        let mut after = [0u8; 8];
        until[2..].copy_from_slice(&bytes[..6]);
        after[2..].copy_from_slice(&bytes[6..]);
        Self {
            valid_until: Timestamp::new(u64::from_be_bytes(until)),
            valid_after: Timestamp::new(u64::from_be_bytes(after)),
        }
    }
}

/// A sponsorship choice for one user operation.
///
/// The tag is in-memory only and is erased at [`PaymasterSegment::encode`];
/// production logic never infers it back from bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymasterSegment {
    /// No sponsorship; the sender pays gas natively.
    None,
    /// Deposit-based sponsorship: the sender has pre-deposited `token` with
    /// the paymaster, and postOp debits that balance at an oracle-derived
    /// price.
    DepositV4 {
        /// Sponsoring paymaster contract.
        paymaster: Address,
        /// Paymaster verification gas limit.
        verification_gas_limit: u128,
        /// Paymaster post-op gas limit.
        post_op_gas_limit: u128,
        /// Token the sender's deposit is denominated in.
        token: Address,
        /// Optional validity window trailer.
        validity: Option<ValidityWindow>,
    },
    /// Operator-credit sponsorship: the named operator's gas token, exchange
    /// rate, treasury and credit limit govern settlement.
    SuperPaymaster {
        /// Sponsoring paymaster contract.
        paymaster: Address,
        /// Paymaster verification gas limit.
        verification_gas_limit: u128,
        /// Paymaster post-op gas limit.
        post_op_gas_limit: u128,
        /// Sponsoring operator.
        operator: Address,
        /// Optional exchange-rate ceiling the sender commits to; protects
        /// against the operator raising its rate between build and
        /// settlement.
        max_rate: Option<U256>,
    },
}

/// Which variant a decoded payload should be read as. The 72-byte encodings
/// are byte-identical, so this is caller-tracked intent, not something
/// recoverable from the data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    /// Deposit-based sponsorship.
    DepositV4,
    /// Operator-credit sponsorship.
    SuperPaymaster,
}

/// No sponsorship.
pub fn build_none() -> PaymasterSegment {
    PaymasterSegment::None
}

/// Deposit-based sponsorship segment.
///
/// Encodes only. The precondition — the sender actually holds a non-zero
/// deposit of `token` with `paymaster` — is an external read; see
/// [`crate::ensure_deposit_ready`].
pub fn build_deposit_v4(
    paymaster: Address,
    token: Address,
    verification_gas: u128,
    postop_gas: u128,
) -> PaymasterSegment {
    PaymasterSegment::DepositV4 {
        paymaster,
        verification_gas_limit: verification_gas,
        post_op_gas_limit: postop_gas,
        token,
        validity: None,
    }
}

/// Deposit-based sponsorship with an explicit validity window.
pub fn build_deposit_v4_with_validity(
    paymaster: Address,
    token: Address,
    verification_gas: u128,
    postop_gas: u128,
    validity: ValidityWindow,
) -> PaymasterSegment {
    PaymasterSegment::DepositV4 {
        paymaster,
        verification_gas_limit: verification_gas,
        post_op_gas_limit: postop_gas,
        token,
        validity: Some(validity),
    }
}

/// Operator-credit sponsorship segment.
///
/// Encodes only. The precondition — `operator` is configured and not paused —
/// is an external read; see [`crate::ensure_operator_ready`].
pub fn build_super_paymaster(
    paymaster: Address,
    operator: Address,
    verification_gas: u128,
    postop_gas: u128,
) -> PaymasterSegment {
    PaymasterSegment::SuperPaymaster {
        paymaster,
        verification_gas_limit: verification_gas,
        post_op_gas_limit: postop_gas,
        operator,
        max_rate: None,
    }
}

/// Operator-credit sponsorship with an exchange-rate ceiling.
pub fn build_super_paymaster_with_rate(
    paymaster: Address,
    operator: Address,
    verification_gas: u128,
    postop_gas: u128,
    max_rate: U256,
) -> PaymasterSegment {
    PaymasterSegment::SuperPaymaster {
        paymaster,
        verification_gas_limit: verification_gas,
        post_op_gas_limit: postop_gas,
        operator,
        max_rate: Some(max_rate),
    }
}

impl PaymasterSegment {
    /// Serializes the segment into `paymasterAndData` bytes.
    pub fn encode(&self) -> Bytes {
        match self {
            Self::None => Bytes::new(),
            Self::DepositV4 {
                paymaster,
                verification_gas_limit,
                post_op_gas_limit,
                token,
                validity,
            } => {
                let mut out = prefix(*paymaster, *verification_gas_limit, *post_op_gas_limit);
                out.extend_from_slice(token.as_slice());
                if let Some(window) = validity {
                    window.encode_into(&mut out);
                }
                out.into()
            }
            Self::SuperPaymaster {
                paymaster,
                verification_gas_limit,
                post_op_gas_limit,
                operator,
                max_rate,
            } => {
                let mut out = prefix(*paymaster, *verification_gas_limit, *post_op_gas_limit);
                out.extend_from_slice(operator.as_slice());
                if let Some(rate) = max_rate {
                    out.extend_from_slice(&rate.to_be_bytes::<32>());
                }
                out.into()
            }
        }
    }

    /// The fields a [`opkit_types::UserOperationBuilder`] needs: paymaster
    /// address, its gas limits, and the data following the 52-byte prefix.
    /// `None` for the unsponsored variant.
    pub fn op_fields(&self) -> Option<(Address, u128, u128, Bytes)> {
        match self {
            Self::None => None,
            Self::DepositV4 { paymaster, verification_gas_limit, post_op_gas_limit, .. }
            | Self::SuperPaymaster { paymaster, verification_gas_limit, post_op_gas_limit, .. } => {
                let encoded = self.encode();
                Some((
                    *paymaster,
                    *verification_gas_limit,
                    *post_op_gas_limit,
                    Bytes::from(encoded[PAYMASTER_DATA_PREFIX_LEN..].to_vec()),
                ))
            }
        }
    }
}

fn prefix(paymaster: Address, verification_gas_limit: u128, post_op_gas_limit: u128) -> Vec<u8> {
    let mut out = paymaster.to_vec();
    out.extend_from_slice(&pack_pair(verification_gas_limit, post_op_gas_limit));
    out
}

/// Decodes `paymasterAndData` bytes as the variant the caller knows it to be.
///
/// Total inverse of [`PaymasterSegment::encode`]: empty input is the
/// unsponsored segment, and any length that fits neither the bare nor the
/// trailered layout of `kind` is [`CodecError::MalformedPaymasterData`] with
/// the offending length.
pub fn decode(bytes: &[u8], kind: SegmentKind) -> Result<PaymasterSegment, CodecError> {
    if bytes.is_empty() {
        return Ok(PaymasterSegment::None);
    }
    if bytes.len() < PAYMASTER_SEGMENT_BASE_LEN {
        return Err(CodecError::MalformedPaymasterData { len: bytes.len() });
    }

    let paymaster = Address::from_slice(&bytes[..20]);
    let mut pair = [0u8; 32];
    pair.copy_from_slice(&bytes[20..PAYMASTER_DATA_PREFIX_LEN]);
    let (verification_gas_limit, post_op_gas_limit) = unpack_pair(&pair);
    let selector = Address::from_slice(&bytes[PAYMASTER_DATA_PREFIX_LEN..PAYMASTER_SEGMENT_BASE_LEN]);
    let trailer = &bytes[PAYMASTER_SEGMENT_BASE_LEN..];

    match kind {
        SegmentKind::DepositV4 => {
            let validity = match trailer.len() {
                0 => None,
                12 => {
                    let mut window = [0u8; 12];
                    window.copy_from_slice(trailer);
                    Some(ValidityWindow::decode(&window))
                }
                _ => return Err(CodecError::MalformedPaymasterData { len: bytes.len() }),
            };
            Ok(PaymasterSegment::DepositV4 {
                paymaster,
                verification_gas_limit,
                post_op_gas_limit,
                token: selector,
                validity,
            })
        }
        SegmentKind::SuperPaymaster => {
            let max_rate = match trailer.len() {
                0 => None,
                32 => Some(U256::from_be_slice(trailer)),
                _ => return Err(CodecError::MalformedPaymasterData { len: bytes.len() }),
            };
            Ok(PaymasterSegment::SuperPaymaster {
                paymaster,
                verification_gas_limit,
                post_op_gas_limit,
                operator: selector,
                max_rate,
            })
        }
    }
}

/// Variant-agnostic view of a `paymasterAndData` payload.
///
/// Debug and inspection only: it reads the shared prefix without deciding
/// what the trailing bytes mean.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPaymasterFields {
    /// Paymaster address at offset 0.
    pub paymaster: Address,
    /// High half of the packed gas-limit pair.
    pub verification_gas_limit: u128,
    /// Low half of the packed gas-limit pair.
    pub post_op_gas_limit: u128,
    /// Everything after the 52-byte prefix, selector included.
    pub data: Bytes,
}

/// Splits any well-formed `paymasterAndData` payload into its shared fields.
/// `Ok(None)` for an empty payload.
pub fn inspect(bytes: &[u8]) -> Result<Option<RawPaymasterFields>, CodecError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    if bytes.len() < PAYMASTER_DATA_PREFIX_LEN {
        return Err(CodecError::MalformedPaymasterData { len: bytes.len() });
    }
    let mut pair = [0u8; 32];
    pair.copy_from_slice(&bytes[20..PAYMASTER_DATA_PREFIX_LEN]);
    let (verification_gas_limit, post_op_gas_limit) = unpack_pair(&pair);
    Ok(Some(RawPaymasterFields {
        paymaster: Address::from_slice(&bytes[..20]),
        verification_gas_limit,
        post_op_gas_limit,
        data: Bytes::from(bytes[PAYMASTER_DATA_PREFIX_LEN..].to_vec()),
    }))
}
