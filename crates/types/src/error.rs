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

//! Codec errors.
//!
//! Every error names the offending field or byte range; debugging a rejected
//! user operation depends on knowing exactly which segment was wrong.

use alloy_primitives::U256;

/// Errors raised by the pure encode/decode layer.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// A numeric field exceeds its 128-bit wire width. Fatal; the caller must
    /// fix its inputs.
    #[error("field {field} overflows its 128-bit wire width: {value}")]
    FieldOverflow {
        /// Wire name of the field that overflowed.
        field: &'static str,
        /// The out-of-range value.
        value: U256,
    },
    /// `paymasterAndData` is neither empty nor long enough to hold the
    /// 52-byte prefix (20-byte paymaster address + 32-byte gas-limit pair).
    #[error(
        "malformed paymasterAndData: length {len}, expected 0 or at least 52 bytes \
         (paymaster address in [0..20], packed gas limits in [20..52])"
    )]
    MalformedPaymasterData {
        /// Actual byte length observed.
        len: usize,
    },
    /// `initCode` is non-empty but shorter than a 20-byte factory address.
    #[error("malformed initCode: length {len}, expected 0 or at least the 20-byte factory address")]
    MalformedInitCode {
        /// Actual byte length observed.
        len: usize,
    },
}
