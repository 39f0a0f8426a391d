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

//! ERC-4337 v0.7 user operations.
//!
//! The offchain model keeps every field unpacked; [`UserOperation::pack`]
//! produces the onchain form, where `accountGasLimits` and `gasFees` collapse
//! into 32-byte pairs, `factory`/`factoryData` join into `initCode`, and the
//! paymaster fields join into `paymasterAndData`.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolValue};

use crate::{
    pack::{pack_pair, unpack_pair},
    CodecError,
};

/// Byte length of an ecosystem-standard ECDSA signature (r ++ s ++ v).
pub const SIGNATURE_LENGTH: usize = 65;

/// Length of the fixed `paymasterAndData` prefix: 20-byte paymaster address
/// followed by the 32-byte packed gas-limit pair. Variant-specific data (the
/// payment token or sponsoring operator) always starts at this offset.
pub const PAYMASTER_DATA_PREFIX_LEN: usize = 52;

sol! {
    /// User operation in the packed v0.7 wire form consumed by the entry
    /// point and used for hashing.
    #[derive(Debug, Default)]
    struct PackedUserOperation {
        address sender;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        bytes32 accountGasLimits;
        uint256 preVerificationGas;
        bytes32 gasFees;
        bytes paymasterAndData;
        bytes signature;
    }
}

/// User operation, offchain version.
///
/// Must be packed before hashing or sending onchain. Gas limits and fees are
/// `u128` by construction; values that do not fit the 128-bit wire halves
/// cannot be represented at all.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserOperation {
    /// Account sending the operation.
    pub sender: Address,
    /// Anti-replay nonce, read from the entry point per sender.
    pub nonce: U256,
    /// Factory deploying the account, present only until the account exists.
    pub factory: Option<Address>,
    /// Calldata passed to the factory.
    pub factory_data: Bytes,
    /// Calldata for the main execution call.
    pub call_data: Bytes,
    /// Gas limit for the main execution call.
    pub call_gas_limit: u128,
    /// Gas limit for the verification step.
    pub verification_gas_limit: u128,
    /// Gas covering bundler overhead (calldata cost etc.).
    pub pre_verification_gas: U256,
    /// EIP-1559 priority fee cap.
    pub max_priority_fee_per_gas: u128,
    /// EIP-1559 total fee cap.
    pub max_fee_per_gas: u128,
    /// Sponsoring paymaster, if any.
    pub paymaster: Option<Address>,
    /// Gas limit for paymaster verification.
    pub paymaster_verification_gas_limit: u128,
    /// Gas limit for the paymaster post-op call.
    pub paymaster_post_op_gas_limit: u128,
    /// Variant-specific paymaster payload following the 52-byte prefix.
    pub paymaster_data: Bytes,
    /// Owner signature over [`UserOperation::hash`]. Excluded from the hash
    /// itself; empty or a placeholder until signing.
    pub signature: Bytes,
}

impl UserOperation {
    /// Packs the operation into the v0.7 wire form.
    pub fn pack(&self) -> PackedUserOperation {
        let init_code = match self.factory {
            Some(factory) => {
                let mut init_code = factory.to_vec();
                init_code.extend_from_slice(&self.factory_data);
                Bytes::from(init_code)
            }
            None => Bytes::new(),
        };

        let paymaster_and_data = match self.paymaster {
            Some(paymaster) => {
                let mut pmd = paymaster.to_vec();
                pmd.extend_from_slice(&pack_pair(
                    self.paymaster_verification_gas_limit,
                    self.paymaster_post_op_gas_limit,
                ));
                pmd.extend_from_slice(&self.paymaster_data);
                Bytes::from(pmd)
            }
            None => Bytes::new(),
        };

        PackedUserOperation {
            sender: self.sender,
            nonce: self.nonce,
            initCode: init_code,
            callData: self.call_data.clone(),
            accountGasLimits: pack_pair(self.verification_gas_limit, self.call_gas_limit).into(),
            preVerificationGas: self.pre_verification_gas,
            gasFees: pack_pair(self.max_priority_fee_per_gas, self.max_fee_per_gas).into(),
            paymasterAndData: paymaster_and_data,
            signature: self.signature.clone(),
        }
    }

    /// ABI encoding of the packed form, ready for calldata.
    pub fn to_wire_packed(&self) -> Bytes {
        self.pack().abi_encode().into()
    }

    /// Calculates the hash signed by the account owner.
    ///
    /// The signature field never contributes to the hash, so the raw 32-byte
    /// result can be signed after the operation is fully built.
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> B256 {
        hash_packed_user_operation(&self.pack(), entry_point, chain_id)
    }

    /// Upper bound, in wei, on what this operation can cost.
    pub fn max_gas_cost(&self) -> U256 {
        let gas = self.pre_verification_gas
            + U256::from(self.call_gas_limit)
            + U256::from(self.verification_gas_limit)
            + U256::from(self.paymaster_verification_gas_limit)
            + U256::from(self.paymaster_post_op_gas_limit);
        gas * U256::from(self.max_fee_per_gas)
    }

    /// Total verification gas across account and paymaster.
    pub fn total_verification_gas_limit(&self) -> u128 {
        self.verification_gas_limit + self.paymaster_verification_gas_limit
    }
}

/// Hashes a packed user operation the way the entry point does: the static
/// tuple (with dynamic fields pre-hashed) first, then the result bound to the
/// entry point address and chain id.
fn hash_packed_user_operation(
    puo: &PackedUserOperation,
    entry_point: Address,
    chain_id: u64,
) -> B256 {
    let hashed = keccak256(
        (
            puo.sender,
            puo.nonce,
            keccak256(&puo.initCode),
            keccak256(&puo.callData),
            puo.accountGasLimits,
            puo.preVerificationGas,
            puo.gasFees,
            keccak256(&puo.paymasterAndData),
        )
            .abi_encode(),
    );
    keccak256((hashed, entry_point, U256::from(chain_id)).abi_encode())
}

impl TryFrom<PackedUserOperation> for UserOperation {
    type Error = CodecError;

    /// Unpacks the wire form. Total inverse of [`UserOperation::pack`]:
    /// malformed `initCode` or `paymasterAndData` lengths are rejected with
    /// the offending length rather than silently truncated.
    fn try_from(puo: PackedUserOperation) -> Result<Self, Self::Error> {
        let (factory, factory_data) = match puo.initCode.len() {
            0 => (None, Bytes::new()),
            n if n < 20 => return Err(CodecError::MalformedInitCode { len: n }),
            _ => (
                Some(Address::from_slice(&puo.initCode[..20])),
                Bytes::from(puo.initCode[20..].to_vec()),
            ),
        };

        let (paymaster, paymaster_vgl, paymaster_pogl, paymaster_data) =
            match puo.paymasterAndData.len() {
                0 => (None, 0, 0, Bytes::new()),
                n if n < PAYMASTER_DATA_PREFIX_LEN => {
                    return Err(CodecError::MalformedPaymasterData { len: n })
                }
                _ => {
                    let pmd = &puo.paymasterAndData;
                    let mut pair = [0u8; 32];
                    pair.copy_from_slice(&pmd[20..PAYMASTER_DATA_PREFIX_LEN]);
                    let (vgl, pogl) = unpack_pair(&pair);
                    (
                        Some(Address::from_slice(&pmd[..20])),
                        vgl,
                        pogl,
                        Bytes::from(pmd[PAYMASTER_DATA_PREFIX_LEN..].to_vec()),
                    )
                }
            };

        let (verification_gas_limit, call_gas_limit) = unpack_pair(&puo.accountGasLimits.0);
        let (max_priority_fee_per_gas, max_fee_per_gas) = unpack_pair(&puo.gasFees.0);

        Ok(Self {
            sender: puo.sender,
            nonce: puo.nonce,
            factory,
            factory_data,
            call_data: puo.callData,
            call_gas_limit,
            verification_gas_limit,
            pre_verification_gas: puo.preVerificationGas,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            paymaster,
            paymaster_verification_gas_limit: paymaster_vgl,
            paymaster_post_op_gas_limit: paymaster_pogl,
            paymaster_data,
            signature: puo.signature,
        })
    }
}

/// Required fields for a [`UserOperationBuilder`].
#[derive(Clone, Debug, Default)]
pub struct UserOperationRequiredFields {
    /// Account sending the operation.
    pub sender: Address,
    /// Anti-replay nonce.
    pub nonce: U256,
    /// Calldata for the main execution call.
    pub call_data: Bytes,
    /// Gas limit for the main execution call.
    pub call_gas_limit: u128,
    /// Gas limit for the verification step.
    pub verification_gas_limit: u128,
    /// Gas covering bundler overhead.
    pub pre_verification_gas: U256,
    /// EIP-1559 priority fee cap.
    pub max_priority_fee_per_gas: u128,
    /// EIP-1559 total fee cap.
    pub max_fee_per_gas: u128,
    /// Owner signature, or a placeholder of the final length.
    pub signature: Bytes,
}

/// Builder for [`UserOperation`].
pub struct UserOperationBuilder {
    required: UserOperationRequiredFields,
    factory: Option<Address>,
    factory_data: Bytes,
    paymaster: Option<Address>,
    paymaster_verification_gas_limit: u128,
    paymaster_post_op_gas_limit: u128,
    paymaster_data: Bytes,
}

impl UserOperationBuilder {
    /// Creates a builder with the required fields; factory and paymaster are
    /// optional extras.
    pub fn new(required: UserOperationRequiredFields) -> Self {
        Self {
            required,
            factory: None,
            factory_data: Bytes::new(),
            paymaster: None,
            paymaster_verification_gas_limit: 0,
            paymaster_post_op_gas_limit: 0,
            paymaster_data: Bytes::new(),
        }
    }

    /// Sets the account factory and its calldata.
    pub fn factory(mut self, factory: Address, factory_data: Bytes) -> Self {
        self.factory = Some(factory);
        self.factory_data = factory_data;
        self
    }

    /// Sets the sponsoring paymaster, its gas limits, and the
    /// variant-specific data following the 52-byte prefix.
    pub fn paymaster(
        mut self,
        paymaster: Address,
        paymaster_verification_gas_limit: u128,
        paymaster_post_op_gas_limit: u128,
        paymaster_data: Bytes,
    ) -> Self {
        self.paymaster = Some(paymaster);
        self.paymaster_verification_gas_limit = paymaster_verification_gas_limit;
        self.paymaster_post_op_gas_limit = paymaster_post_op_gas_limit;
        self.paymaster_data = paymaster_data;
        self
    }

    /// Overrides the pre-verification gas after estimation.
    pub fn pre_verification_gas(mut self, pre_verification_gas: U256) -> Self {
        self.required.pre_verification_gas = pre_verification_gas;
        self
    }

    /// Builds the user operation.
    pub fn build(self) -> UserOperation {
        UserOperation {
            sender: self.required.sender,
            nonce: self.required.nonce,
            factory: self.factory,
            factory_data: self.factory_data,
            call_data: self.required.call_data,
            call_gas_limit: self.required.call_gas_limit,
            verification_gas_limit: self.required.verification_gas_limit,
            pre_verification_gas: self.required.pre_verification_gas,
            max_priority_fee_per_gas: self.required.max_priority_fee_per_gas,
            max_fee_per_gas: self.required.max_fee_per_gas,
            paymaster: self.paymaster,
            paymaster_verification_gas_limit: self.paymaster_verification_gas_limit,
            paymaster_post_op_gas_limit: self.paymaster_post_op_gas_limit,
            paymaster_data: self.paymaster_data,
            signature: self.required.signature,
        }
    }
}

/// Worst-case placeholder signature used during gas estimation.
///
/// All bytes are non-zero so the calldata cost can only shrink once the real
/// signature replaces it; the length must match what the signer will return.
pub fn dummy_signature(len: usize) -> Bytes {
    vec![0xff; len].into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_op() -> UserOperation {
        UserOperationBuilder::new(UserOperationRequiredFields {
            sender: "0x1306b01bc3e4ad202612d3843387e94737673f53".parse().unwrap(),
            nonce: U256::from(8942),
            call_data: "0x0000000000000000000000000000000000000000080085".parse().unwrap(),
            call_gas_limit: 10_000,
            verification_gas_limit: 100_000,
            pre_verification_gas: U256::from(100),
            max_priority_fee_per_gas: 9_999_999,
            max_fee_per_gas: 99_999,
            signature: Bytes::new(),
        })
        .factory(
            "0x6942069420694206942069420694206942069420".parse().unwrap(),
            "0xdeadbeef".parse().unwrap(),
        )
        .paymaster(
            "0x0123456789abcdef0123456789abcdef01234567".parse().unwrap(),
            100_000,
            50_000,
            "0x9999999999999999999999999999999999999999".parse().unwrap(),
        )
        .build()
    }

    #[test]
    fn test_hash_zeroed() {
        // Matches the entry point's getUserOpHash() for an all-default
        // operation at entry point 0x66a1...4ddc, chain id 1337.
        let op = UserOperation::default();
        let entry_point = "0x66a15edcc3b50a663e72f1457ffd49b9ae284ddc".parse().unwrap();
        assert_eq!(
            op.hash(entry_point, 1337),
            "0xdd4e6a940905af631df69197721a3ba90fd3b47c98cd5227029d1a7cbdc44f21"
                .parse::<B256>()
                .unwrap()
        );
    }

    #[test]
    fn test_hash() {
        let op = populated_op();
        let entry_point = "0x66a15edcc3b50a663e72f1457ffd49b9ae284ddc".parse().unwrap();
        assert_eq!(
            op.hash(entry_point, 1337),
            "0x3940f53b3e4fc5a9aa8c21e2cde33e670c5095903df6dc14bc4fbd70e1021113"
                .parse::<B256>()
                .unwrap()
        );
    }

    #[test]
    fn test_hash_ignores_signature() {
        let mut op = populated_op();
        let entry_point: Address = "0x66a15edcc3b50a663e72f1457ffd49b9ae284ddc".parse().unwrap();
        let unsigned = op.hash(entry_point, 1337);
        op.signature = dummy_signature(SIGNATURE_LENGTH);
        assert_eq!(op.hash(entry_point, 1337), unsigned);
        // While any hashed field changes the result.
        op.nonce = U256::from(8943);
        assert_ne!(op.hash(entry_point, 1337), unsigned);
    }

    #[test]
    fn test_packed_layout() {
        let op = populated_op();
        let packed = op.pack();

        // accountGasLimits: verification gas in the high half, call gas low.
        assert_eq!(unpack_pair(&packed.accountGasLimits.0), (100_000, 10_000));
        // gasFees: priority fee high, max fee low.
        assert_eq!(unpack_pair(&packed.gasFees.0), (9_999_999, 99_999));
        // paymasterAndData: the variant-specific address always sits at the
        // 52-byte offset.
        assert_eq!(packed.paymasterAndData.len(), 72);
        assert_eq!(
            &packed.paymasterAndData[PAYMASTER_DATA_PREFIX_LEN..],
            &op.paymaster_data[..]
        );
        assert_eq!(packed.initCode.len(), 24);
    }

    #[test]
    fn test_pack_round_trip() {
        let ops = [UserOperation::default(), populated_op()];
        for op in ops {
            let restored = UserOperation::try_from(op.pack()).unwrap();
            assert_eq!(restored, op);
        }
    }

    #[test]
    fn test_unpack_rejects_malformed_paymaster_data() {
        let mut packed = populated_op().pack();
        let truncated = Bytes::from(packed.paymasterAndData[..51].to_vec());
        packed.paymasterAndData = truncated;
        assert_eq!(
            UserOperation::try_from(packed).unwrap_err(),
            CodecError::MalformedPaymasterData { len: 51 }
        );
    }

    #[test]
    fn test_unpack_rejects_malformed_init_code() {
        let mut packed = populated_op().pack();
        let truncated = Bytes::from(packed.initCode[..10].to_vec());
        packed.initCode = truncated;
        assert_eq!(
            UserOperation::try_from(packed).unwrap_err(),
            CodecError::MalformedInitCode { len: 10 }
        );
    }

    #[test]
    fn test_max_gas_cost() {
        let op = UserOperation {
            call_gas_limit: 10,
            verification_gas_limit: 20,
            pre_verification_gas: U256::from(30),
            paymaster_verification_gas_limit: 40,
            paymaster_post_op_gas_limit: 50,
            max_fee_per_gas: 2,
            ..Default::default()
        };
        assert_eq!(op.max_gas_cost(), U256::from(300));
    }
}
