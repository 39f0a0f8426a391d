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

//! Wire shapes and decoded read results.

use alloy_primitives::{Address, Bytes, B256, U128, U256};
use opkit_types::{
    try_u128, CodecError, GasEstimate, Timestamp, UserOperation, UserOperationBuilder,
    UserOperationRequiredFields,
};
use serde::{Deserialize, Serialize};

use crate::ProviderError;

/// User operation in the unpacked JSON-RPC submission shape.
///
/// Bundlers take the four gas values and the paymaster fields separately,
/// while onchain hashing uses the packed form; this struct is the
/// `eth_sendUserOperation` side of that split. Numeric fields serialize as
/// `0x`-prefixed hex with no leading zeros, and absent optional groups are
/// omitted entirely — bundlers reject unknown or null fields.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcUserOperation {
    sender: Address,
    nonce: U256,
    call_data: Bytes,
    call_gas_limit: U128,
    verification_gas_limit: U128,
    pre_verification_gas: U256,
    max_priority_fee_per_gas: U128,
    max_fee_per_gas: U128,
    #[serde(skip_serializing_if = "Option::is_none")]
    factory: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    factory_data: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paymaster: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paymaster_verification_gas_limit: Option<U128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paymaster_post_op_gas_limit: Option<U128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paymaster_data: Option<Bytes>,
    signature: Bytes,
}

impl From<UserOperation> for RpcUserOperation {
    fn from(op: UserOperation) -> Self {
        let factory_data = op.factory.is_some().then(|| op.factory_data.clone());
        let (paymaster_verification_gas_limit, paymaster_post_op_gas_limit, paymaster_data) =
            if op.paymaster.is_some() {
                (
                    Some(U128::from(op.paymaster_verification_gas_limit)),
                    Some(U128::from(op.paymaster_post_op_gas_limit)),
                    Some(op.paymaster_data.clone()),
                )
            } else {
                (None, None, None)
            };

        RpcUserOperation {
            sender: op.sender,
            nonce: op.nonce,
            call_data: op.call_data,
            call_gas_limit: U128::from(op.call_gas_limit),
            verification_gas_limit: U128::from(op.verification_gas_limit),
            pre_verification_gas: op.pre_verification_gas,
            max_priority_fee_per_gas: U128::from(op.max_priority_fee_per_gas),
            max_fee_per_gas: U128::from(op.max_fee_per_gas),
            factory: op.factory,
            factory_data,
            paymaster: op.paymaster,
            paymaster_verification_gas_limit,
            paymaster_post_op_gas_limit,
            paymaster_data,
            signature: op.signature,
        }
    }
}

impl From<RpcUserOperation> for UserOperation {
    fn from(def: RpcUserOperation) -> Self {
        let mut builder = UserOperationBuilder::new(UserOperationRequiredFields {
            sender: def.sender,
            nonce: def.nonce,
            call_data: def.call_data,
            call_gas_limit: def.call_gas_limit.to(),
            verification_gas_limit: def.verification_gas_limit.to(),
            pre_verification_gas: def.pre_verification_gas,
            max_priority_fee_per_gas: def.max_priority_fee_per_gas.to(),
            max_fee_per_gas: def.max_fee_per_gas.to(),
            signature: def.signature,
        });
        if let Some(factory) = def.factory {
            builder = builder.factory(factory, def.factory_data.unwrap_or_default());
        }
        if let Some(paymaster) = def.paymaster {
            builder = builder.paymaster(
                paymaster,
                def.paymaster_verification_gas_limit.map(|x| x.to()).unwrap_or_default(),
                def.paymaster_post_op_gas_limit.map(|x| x.to()).unwrap_or_default(),
                def.paymaster_data.unwrap_or_default(),
            );
        }
        builder.build()
    }
}

/// Gas estimate as returned by `eth_estimateUserOperationGas`.
///
/// Values arrive as unbounded quantities; narrowing them to the 128-bit
/// limits happens in [`RpcGasEstimate::try_into_estimate`] so an out-of-range
/// answer surfaces as a [`CodecError::FieldOverflow`] naming the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcGasEstimate {
    /// Pre-verification gas the bundler will accept.
    pub pre_verification_gas: U256,
    /// Estimated gas limit for account verification.
    pub verification_gas_limit: U256,
    /// Estimated gas limit for the execution call.
    pub call_gas_limit: U256,
    /// Estimated paymaster verification gas limit, when sponsored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    /// Estimated paymaster post-op gas limit, when sponsored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
}

impl RpcGasEstimate {
    /// Narrows the raw quantities to typed gas limits.
    pub fn try_into_estimate(self) -> Result<GasEstimate, CodecError> {
        Ok(GasEstimate {
            pre_verification_gas: try_u128("preVerificationGas", self.pre_verification_gas)?,
            verification_gas_limit: try_u128("verificationGasLimit", self.verification_gas_limit)?,
            call_gas_limit: try_u128("callGasLimit", self.call_gas_limit)?,
            paymaster_verification_gas_limit: self
                .paymaster_verification_gas_limit
                .map(|x| try_u128("paymasterVerificationGasLimit", x))
                .transpose()?,
            paymaster_post_op_gas_limit: self
                .paymaster_post_op_gas_limit
                .map(|x| try_u128("paymasterPostOpGasLimit", x))
                .transpose()?,
        })
    }
}

/// A log entry attached to a user operation receipt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    /// Contract that emitted the log.
    pub address: Address,
    /// Indexed topics; `topics[0]` is the event signature.
    pub topics: Vec<B256>,
    /// Non-indexed data.
    pub data: Bytes,
}

/// Receipt returned by `eth_getUserOperationReceipt`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    /// Hash of the user operation.
    pub user_op_hash: B256,
    /// Account that sent the operation.
    pub sender: Address,
    /// Nonce the operation consumed.
    pub nonce: U256,
    /// Whether the execution call succeeded.
    pub success: bool,
    /// Actual gas cost paid, in wei.
    pub actual_gas_cost: U256,
    /// Actual gas used.
    pub actual_gas_used: U256,
    /// Logs emitted during the operation, including paymaster events.
    pub logs: Vec<RpcLog>,
}

/// Price read from the oracle, with staleness metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OraclePrice {
    /// Price in USD, scaled by `10^decimals`.
    pub price: U256,
    /// Decimal scaling of `price`.
    pub decimals: u8,
    /// When the oracle last updated this answer.
    pub updated_at: Timestamp,
}

/// A SuperPaymaster operator's configured account. External state; this
/// toolkit only reads it to decide credit sufficiency before constructing a
/// sponsorship segment, never to mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorAccount {
    /// The operator's aPNTs-equivalent sponsorship balance.
    pub apnts_balance: U256,
    /// Gas token users settle in under this operator.
    pub gas_token: Address,
    /// Treasury receiving settled gas tokens.
    pub treasury: Address,
    /// Gas-token units per 1 ETH of gas cost, scaled by 1e18.
    pub exchange_rate: U256,
    /// Operator is paused and must not sponsor new operations.
    pub paused: bool,
    /// Cumulative wei of gas sponsored.
    pub total_sponsored: U256,
    /// Cumulative gas-token revenue collected.
    pub total_revenue: U256,
}

impl OperatorAccount {
    /// Number of 32-byte words in the `operators(address)` result tuple.
    pub const WORDS: usize = 7;

    /// Decodes the raw result words of an `operators(address)` read.
    ///
    /// Word order: balance, gas token, treasury, exchange rate, paused flag,
    /// total sponsored, total revenue.
    pub fn try_from_words(words: &[U256]) -> Result<Self, ProviderError> {
        if words.len() != Self::WORDS {
            return Err(ProviderError::UnexpectedRpcShape {
                context: format!(
                    "operator account tuple: expected {} words, got {}",
                    Self::WORDS,
                    words.len()
                ),
            });
        }
        Ok(Self {
            apnts_balance: words[0],
            gas_token: Address::from_word(words[1].into()),
            treasury: Address::from_word(words[2].into()),
            exchange_rate: words[3],
            paused: !words[4].is_zero(),
            total_sponsored: words[5],
            total_revenue: words[6],
        })
    }

    /// An operator with no gas token configured has never been set up.
    pub fn is_configured(&self) -> bool {
        self.gas_token != Address::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc_op() -> RpcUserOperation {
        let op = UserOperationBuilder::new(UserOperationRequiredFields {
            sender: "0x1306b01bc3e4ad202612d3843387e94737673f53".parse().unwrap(),
            nonce: U256::from(1),
            call_data: "0xb61d27f6".parse().unwrap(),
            call_gas_limit: 500_000,
            verification_gas_limit: 60_000,
            pre_verification_gas: U256::from(50_000),
            max_priority_fee_per_gas: 1_000_000_000,
            max_fee_per_gas: 30_000_000_000,
            signature: Bytes::new(),
        })
        .paymaster(
            "0x0123456789abcdef0123456789abcdef01234567".parse().unwrap(),
            200_000,
            100_000,
            "0x9999999999999999999999999999999999999999".parse().unwrap(),
        )
        .build();
        op.into()
    }

    #[test]
    fn test_rpc_serialization() {
        let json = serde_json::to_value(rpc_op()).unwrap();
        // Quantities are compact hex, not zero-padded.
        assert_eq!(json["nonce"], "0x1");
        assert_eq!(json["preVerificationGas"], "0xc350");
        assert_eq!(json["callGasLimit"], "0x7a120");
        assert_eq!(json["paymasterVerificationGasLimit"], "0x30d40");
        // No factory group was set, so the keys must be absent.
        assert!(json.get("factory").is_none());
        assert!(json.get("factoryData").is_none());
    }

    #[test]
    fn test_rpc_round_trip() {
        let rpc = rpc_op();
        let op: UserOperation = rpc.clone().into();
        assert_eq!(RpcUserOperation::from(op), rpc);
    }

    #[test]
    fn test_gas_estimate_overflow() {
        let estimate = RpcGasEstimate {
            pre_verification_gas: U256::from(50_000),
            verification_gas_limit: U256::MAX,
            call_gas_limit: U256::from(100_000),
            ..Default::default()
        };
        let err = estimate.try_into_estimate().unwrap_err();
        assert!(matches!(err, CodecError::FieldOverflow { field: "verificationGasLimit", .. }));
    }

    #[test]
    fn test_operator_account_shape() {
        let words = vec![U256::from(10); 3];
        assert!(OperatorAccount::try_from_words(&words).is_err());

        let mut words = vec![U256::ZERO; OperatorAccount::WORDS];
        words[0] = U256::from(1_000_000);
        words[1] = U256::from_be_bytes({
            let mut w = [0u8; 32];
            w[12..].copy_from_slice(&[0xaa; 20]);
            w
        });
        words[4] = U256::from(1);
        let account = OperatorAccount::try_from_words(&words).unwrap();
        assert_eq!(account.gas_token, Address::from([0xaa; 20]));
        assert!(account.paused);
        assert!(account.is_configured());
    }
}
