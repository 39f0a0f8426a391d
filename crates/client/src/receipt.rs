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

//! Settlement data from user operation receipts.

use alloy_primitives::{b256, Address, B256, U256};
use opkit_provider::UserOperationReceipt;

/// Topic of the paymaster's settlement event:
/// `PostOpProcessed(address indexed user, address indexed token,
/// uint256 actualGasCostWei, uint256 tokenCost, uint256 protocolRevenue)`.
pub const POST_OP_PROCESSED_TOPIC: B256 =
    b256!("62544d7f48b11c32334310ebd306b47224fca220163218d4a7264322c52ae073");

/// What the paymaster actually charged for one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostOpFee {
    /// Gas cost settled, in wei.
    pub actual_gas_cost_wei: U256,
    /// Amount debited from the user in gas-token units.
    pub token_cost: U256,
    /// Portion of the debit kept as protocol revenue.
    pub protocol_revenue: U256,
}

/// Extracts the paymaster's `PostOpProcessed` settlement from a receipt.
///
/// `None` when the operation was not sponsored by `paymaster` or the event
/// is missing (for example a self-paying operation).
pub fn post_op_fee(receipt: &UserOperationReceipt, paymaster: Address) -> Option<PostOpFee> {
    receipt
        .logs
        .iter()
        .find(|log| {
            log.address == paymaster && log.topics.first() == Some(&POST_OP_PROCESSED_TOPIC)
        })
        .and_then(|log| {
            // Non-indexed data is three 32-byte words.
            if log.data.len() < 96 {
                return None;
            }
            Some(PostOpFee {
                actual_gas_cost_wei: U256::from_be_slice(&log.data[..32]),
                token_cost: U256::from_be_slice(&log.data[32..64]),
                protocol_revenue: U256::from_be_slice(&log.data[64..96]),
            })
        })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Bytes;
    use opkit_provider::RpcLog;

    use super::*;

    const PM: Address = Address::new([0x11; 20]);

    fn settlement_log(address: Address) -> RpcLog {
        let mut data = Vec::new();
        data.extend_from_slice(&U256::from(31_337).to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(62_674).to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(313).to_be_bytes::<32>());
        RpcLog {
            address,
            topics: vec![POST_OP_PROCESSED_TOPIC, B256::ZERO, B256::ZERO],
            data: Bytes::from(data),
        }
    }

    #[test]
    fn test_extracts_settlement() {
        let receipt = UserOperationReceipt {
            logs: vec![
                RpcLog { address: PM, topics: vec![B256::ZERO], data: Bytes::new() },
                settlement_log(PM),
            ],
            ..Default::default()
        };
        let fee = post_op_fee(&receipt, PM).unwrap();
        assert_eq!(fee.actual_gas_cost_wei, U256::from(31_337));
        assert_eq!(fee.token_cost, U256::from(62_674));
        assert_eq!(fee.protocol_revenue, U256::from(313));
    }

    #[test]
    fn test_ignores_other_paymasters() {
        let receipt = UserOperationReceipt {
            logs: vec![settlement_log(Address::new([0x99; 20]))],
            ..Default::default()
        };
        assert_eq!(post_op_fee(&receipt, PM), None);
    }
}
