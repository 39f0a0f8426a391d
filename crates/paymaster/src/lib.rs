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

//! Paymaster sponsorship models.
//!
//! Two sponsorship variants share one wire layout: the deposit-based "v4"
//! paymaster settles against the sender's own pre-deposited token balance,
//! while the SuperPaymaster settles against a sponsoring operator's credit.
//! Which one a payload means is caller-tracked state — the bytes alone cannot
//! tell them apart — so the variant lives in [`PaymasterSegment`] until the
//! final encode boundary.

mod data;
pub use data::{
    build_deposit_v4, build_deposit_v4_with_validity, build_none, build_super_paymaster,
    build_super_paymaster_with_rate, decode, inspect, PaymasterSegment, RawPaymasterFields,
    SegmentKind, ValidityWindow, PAYMASTER_SEGMENT_BASE_LEN,
};

mod preflight;
pub use preflight::{
    ensure_deposit_ready, ensure_operator_ready, gas_token_cost, PaymasterError,
};
