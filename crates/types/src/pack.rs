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

//! Bit layout for the 128-bit pairs used throughout v0.7 user operations.
//!
//! `accountGasLimits`, `gasFees`, and the gas-limit segment of
//! `paymasterAndData` all share the same 32-byte shape: two big-endian u128
//! halves, high half first. Contracts read these fields at fixed offsets, so
//! the layout here must never change.

use alloy_primitives::U256;

use crate::CodecError;

/// Packs two 128-bit values into the canonical 32-byte pair layout.
///
/// `high` lands in bytes `[0..16]`, `low` in bytes `[16..32]`, both
/// big-endian.
pub fn pack_pair(high: u128, low: u128) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&high.to_be_bytes());
    out[16..].copy_from_slice(&low.to_be_bytes());
    out
}

/// Inverse of [`pack_pair`].
pub fn unpack_pair(bytes: &[u8; 32]) -> (u128, u128) {
    let mut high = [0u8; 16];
    let mut low = [0u8; 16];
    high.copy_from_slice(&bytes[..16]);
    low.copy_from_slice(&bytes[16..]);
    (u128::from_be_bytes(high), u128::from_be_bytes(low))
}

/// Narrows a 256-bit value to the 128-bit wire width of a gas-limit or fee
/// field.
///
/// Values that do not fit are a configuration error on the caller's side and
/// are rejected as [`CodecError::FieldOverflow`] before any encoding is
/// attempted, naming the offending field.
pub fn try_u128(field: &'static str, value: U256) -> Result<u128, CodecError> {
    if value > U256::from(u128::MAX) {
        return Err(CodecError::FieldOverflow { field, value });
    }
    Ok(value.to::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout() {
        // (high = 1, low = 2) must produce two 16-byte zero-padded halves.
        let packed = pack_pair(1, 2);
        let mut expected = [0u8; 32];
        expected[15] = 1;
        expected[31] = 2;
        assert_eq!(packed, expected);
        assert_eq!(unpack_pair(&packed), (1, 2));
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            (0u128, 0u128),
            (1, 2),
            (u128::MAX, 0),
            (0, u128::MAX),
            (u128::MAX, u128::MAX),
            (0xdead_beef, 0x1234_5678_9abc_def0),
        ];
        for (high, low) in cases {
            assert_eq!(unpack_pair(&pack_pair(high, low)), (high, low));
        }
    }

    #[test]
    fn test_try_u128_overflow() {
        assert_eq!(try_u128("callGasLimit", U256::from(u128::MAX)), Ok(u128::MAX));
        let err = try_u128("callGasLimit", U256::from(u128::MAX) + U256::from(1)).unwrap_err();
        assert!(matches!(err, CodecError::FieldOverflow { field: "callGasLimit", .. }));
    }
}
