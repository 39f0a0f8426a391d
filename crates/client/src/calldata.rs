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

//! Calldata builders for the common gasless flows.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

sol! {
    function transfer(address to, uint256 amount) external returns (bool);
    function execute(address dest, uint256 value, bytes func) external;
}

/// Encodes an ERC-20 `transfer(to, amount)` call.
pub fn encode_token_transfer(recipient: Address, amount: U256) -> Bytes {
    transferCall { to: recipient, amount }.abi_encode().into()
}

/// Wraps an inner call into a smart account `execute(dest, value, func)`
/// call — the payload the account owner actually signs off on.
pub fn encode_execution(target: Address, value: U256, data: Bytes) -> Bytes {
    executeCall { dest: target, value, func: data }.abi_encode().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors() {
        let transfer = encode_token_transfer(Address::new([0x22; 20]), U256::from(1_000));
        assert_eq!(&transfer[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(transfer.len(), 4 + 64);

        let execution =
            encode_execution(Address::new([0x33; 20]), U256::ZERO, transfer.clone());
        assert_eq!(&execution[..4], &[0xb6, 0x1d, 0x27, 0xf6]);
    }

    #[test]
    fn test_execution_embeds_inner_call() {
        let inner = encode_token_transfer(Address::new([0x22; 20]), U256::from(7));
        let outer = encode_execution(Address::new([0x33; 20]), U256::ZERO, inner.clone());
        let window = outer
            .windows(inner.len())
            .any(|candidate| candidate == &inner[..]);
        assert!(window);
    }
}
