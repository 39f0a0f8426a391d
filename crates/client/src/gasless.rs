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

//! The gasless submission flow.

use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{Address, Bytes, B256, U256};
use opkit_paymaster::PaymasterSegment;
use opkit_provider::{Bundler, EntryPoint, FeeOracle, ProviderError, Signer};
use opkit_sim::{
    estimate_pre_verification_gas, tuned_gas_limits, FeeEstimator, GasEstimationError, Settings,
};
use opkit_types::{
    dummy_signature, ChainSpec, CodecError, GasEstimate, UserOperation, UserOperationBuilder,
    UserOperationRequiredFields,
};

// Limits used for the throwaway estimation operation, before the bundler's
// answer replaces them.
const ESTIMATION_VERIFICATION_GAS: u128 = 60_000;
const ESTIMATION_CALL_GAS: u128 = 100_000;
const ESTIMATION_PRE_VERIFICATION_GAS: u128 = 50_000;

/// Submission failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A collaborator call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// An encode/decode step failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Gas estimation failed.
    #[error(transparent)]
    Estimation(#[from] GasEstimationError),
}

/// What the caller wants executed and how it is sponsored.
#[derive(Clone, Debug)]
pub struct TransactionIntent {
    /// The smart account sending the operation.
    pub sender: Address,
    /// Execution calldata (see [`crate::encode_execution`]).
    pub call_data: Bytes,
    /// Chosen sponsorship. Preflight checks belong to the caller; this value
    /// is only encoded here.
    pub sponsorship: PaymasterSegment,
    /// Factory and its calldata when the account is not deployed yet.
    pub factory: Option<(Address, Bytes)>,
}

/// Per-sender submission locks.
///
/// Nonce assignment is sender-scoped: a stale nonce read racing another
/// in-flight submission for the same sender is rejected onchain. Each sender
/// gets one async lock held across its read-nonce → build → sign → submit
/// sequence; different senders proceed concurrently.
#[derive(Default)]
struct SenderLocks {
    locks: parking_lot::Mutex<HashMap<Address, Arc<tokio::sync::Mutex<()>>>>,
}

impl SenderLocks {
    fn lock_for(&self, sender: Address) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.lock().entry(sender).or_default().clone()
    }
}

/// End-to-end client for building, signing, and submitting sponsored user
/// operations.
pub struct GaslessClient<EP, B, S, F> {
    chain: ChainSpec,
    entry_point: EP,
    bundler: B,
    signer: S,
    fees: FeeEstimator<F>,
    settings: Settings,
    sender_locks: SenderLocks,
}

impl<EP, B, S, F> GaslessClient<EP, B, S, F>
where
    EP: EntryPoint,
    B: Bundler,
    S: Signer,
    F: FeeOracle,
{
    /// Creates a client over the given collaborators.
    pub fn new(chain: ChainSpec, entry_point: EP, bundler: B, signer: S, fee_oracle: F) -> Self {
        let signature_length = signer.signature_length();
        Self {
            chain,
            entry_point,
            bundler,
            signer,
            fees: FeeEstimator::new(fee_oracle),
            settings: Settings { signature_length, ..Default::default() },
            sender_locks: SenderLocks::default(),
        }
    }

    /// Builds, signs, and submits one user operation. Returns the bundler's
    /// operation hash.
    ///
    /// Holds the sender's lock for the whole sequence so concurrent intents
    /// from one account serialize instead of racing the nonce.
    pub async fn submit(&self, intent: TransactionIntent) -> Result<B256, ClientError> {
        let lock = self.sender_locks.lock_for(intent.sender);
        let _guard = lock.lock().await;

        let nonce = self.entry_point.get_nonce(intent.sender, U256::ZERO).await?;
        let fees = self.fees.required_fees().await;

        // Throwaway operation with placeholder gas and signature, good
        // enough for the bundler to simulate against.
        let draft = self.build_op(
            &intent,
            nonce,
            fees.max_priority_fee_per_gas,
            fees.max_fee_per_gas,
            GasEstimate {
                pre_verification_gas: ESTIMATION_PRE_VERIFICATION_GAS,
                verification_gas_limit: ESTIMATION_VERIFICATION_GAS,
                call_gas_limit: ESTIMATION_CALL_GAS,
                ..Default::default()
            },
        );

        let estimate = self
            .bundler
            .estimate_user_operation_gas(draft.clone().into(), self.chain.entry_point_address)
            .await?
            .try_into_estimate()?;
        let tuned = tuned_gas_limits(&estimate);

        // The bundler's pre-verification answer and the local guard must
        // both be satisfied; take whichever is larger.
        let guard_pvg = estimate_pre_verification_gas(&draft, &self.settings)?;
        let pre_verification_gas = guard_pvg.max(U256::from(tuned.pre_verification_gas));

        let mut op = self.build_op(
            &intent,
            nonce,
            fees.max_priority_fee_per_gas,
            fees.max_fee_per_gas,
            tuned,
        );
        op.pre_verification_gas = pre_verification_gas;

        let hash = op.hash(self.chain.entry_point_address, self.chain.id);
        op.signature = self.signer.sign_hash(hash).await?;

        tracing::debug!(
            sender = %intent.sender,
            %nonce,
            %pre_verification_gas,
            "submitting user operation"
        );
        let op_hash = self
            .bundler
            .send_user_operation(op.into(), self.chain.entry_point_address)
            .await?;
        Ok(op_hash)
    }

    fn build_op(
        &self,
        intent: &TransactionIntent,
        nonce: U256,
        max_priority_fee_per_gas: u128,
        max_fee_per_gas: u128,
        gas: GasEstimate,
    ) -> UserOperation {
        let mut builder = UserOperationBuilder::new(UserOperationRequiredFields {
            sender: intent.sender,
            nonce,
            call_data: intent.call_data.clone(),
            call_gas_limit: gas.call_gas_limit,
            verification_gas_limit: gas.verification_gas_limit,
            pre_verification_gas: U256::from(gas.pre_verification_gas),
            max_priority_fee_per_gas,
            max_fee_per_gas,
            signature: dummy_signature(self.settings.signature_length),
        });
        if let Some((factory, factory_data)) = &intent.factory {
            builder = builder.factory(*factory, factory_data.clone());
        }
        if let Some((paymaster, verification_gas_limit, post_op_gas_limit, data)) =
            intent.sponsorship.op_fields()
        {
            builder = builder.paymaster(paymaster, verification_gas_limit, post_op_gas_limit, data);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use opkit_paymaster::build_super_paymaster;
    use opkit_provider::{
        MockBundler, MockEntryPoint, MockFeeOracle, MockSigner, RpcGasEstimate,
    };
    use opkit_types::GasFees;

    use super::*;

    const SENDER: Address = Address::new([0x42; 20]);

    fn intent() -> TransactionIntent {
        TransactionIntent {
            sender: SENDER,
            call_data: crate::encode_execution(
                Address::new([0x22; 20]),
                U256::ZERO,
                crate::encode_token_transfer(Address::new([0x23; 20]), U256::from(1_000)),
            ),
            sponsorship: build_super_paymaster(
                Address::new([0x11; 20]),
                Address::new([0x33; 20]),
                80_000,
                100_000,
            ),
            factory: None,
        }
    }

    fn client() -> GaslessClient<MockEntryPoint, MockBundler, MockSigner, MockFeeOracle> {
        let mut entry_point = MockEntryPoint::new();
        entry_point.expect_get_nonce().returning(|_, _| Ok(U256::from(5)));

        let mut fee_oracle = MockFeeOracle::new();
        fee_oracle.expect_estimate_eip1559_fees().returning(|| {
            Ok(GasFees { max_fee_per_gas: 20_000_000_000, max_priority_fee_per_gas: 1_000_000_000 })
        });

        let mut bundler = MockBundler::new();
        bundler.expect_estimate_user_operation_gas().returning(|_, _| {
            Ok(RpcGasEstimate {
                pre_verification_gas: U256::from(48_000),
                verification_gas_limit: U256::from(70_000),
                call_gas_limit: U256::from(120_000),
                paymaster_verification_gas_limit: Some(U256::from(200_000)),
                paymaster_post_op_gas_limit: Some(U256::from(90_000)),
            })
        });
        bundler.expect_send_user_operation().returning(|op, _| {
            let op = UserOperation::from(op);
            assert_eq!(op.sender, SENDER);
            assert_eq!(op.nonce, U256::from(5));
            // Final fees carry the 1.5x buffer.
            assert_eq!(op.max_fee_per_gas, 30_000_000_000);
            // Verification limit is the estimate plus the safety pad.
            assert_eq!(op.verification_gas_limit, 150_000);
            // The signature is the signer's, not the placeholder.
            assert_eq!(op.signature.len(), 65);
            assert!(op.signature.iter().all(|&b| b == 0x01));
            Ok(B256::repeat_byte(0xab))
        });

        let mut signer = MockSigner::new();
        signer.expect_sign_hash().returning(|_| Ok(vec![0x01; 65].into()));
        signer.expect_signature_length().return_const(65usize);

        GaslessClient::new(
            ChainSpec::with_canonical_entry_point(11_155_111),
            entry_point,
            bundler,
            signer,
            fee_oracle,
        )
    }

    #[tokio::test]
    async fn test_submit_flow() {
        let hash = client().submit(intent()).await.unwrap();
        assert_eq!(hash, B256::repeat_byte(0xab));
    }

    #[tokio::test]
    async fn test_guard_floor_on_bundler_pvg() {
        // A lowball bundler answer is below what the local guard requires
        // for this operation, so the guard's value must win.
        let mut bundler = MockBundler::new();
        bundler.expect_estimate_user_operation_gas().returning(|_, _| {
            Ok(RpcGasEstimate {
                pre_verification_gas: U256::from(1),
                verification_gas_limit: U256::from(70_000),
                call_gas_limit: U256::from(120_000),
                paymaster_verification_gas_limit: None,
                paymaster_post_op_gas_limit: None,
            })
        });
        bundler.expect_send_user_operation().returning(|op, _| {
            let op = UserOperation::from(op);
            // Well above the bundler's lowball answer of 1.
            assert!(op.pre_verification_gas > U256::from(40_000));
            Ok(B256::ZERO)
        });

        let mut entry_point = MockEntryPoint::new();
        entry_point.expect_get_nonce().returning(|_, _| Ok(U256::ZERO));
        let mut fee_oracle = MockFeeOracle::new();
        fee_oracle.expect_estimate_eip1559_fees().returning(|| Ok(GasFees::default()));
        let mut signer = MockSigner::new();
        signer.expect_sign_hash().returning(|_| Ok(vec![0x01; 65].into()));
        signer.expect_signature_length().return_const(65usize);

        let client = GaslessClient::new(
            ChainSpec::with_canonical_entry_point(1),
            entry_point,
            bundler,
            signer,
            fee_oracle,
        );
        client.submit(intent()).await.unwrap();
    }

    #[test]
    fn test_sender_locks_are_per_sender() {
        let locks = SenderLocks::default();
        let a = locks.lock_for(SENDER);
        let b = locks.lock_for(SENDER);
        let c = locks.lock_for(Address::new([0x43; 20]));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
