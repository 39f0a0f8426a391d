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

//! Collaborator traits.
//!
//! Implementations own their transports, retries, and backoff; the core only
//! calls these methods and treats the results as already validated.

use alloy_primitives::{Address, Bytes, B256, U256};
use opkit_types::GasFees;

use crate::{
    types::{OperatorAccount, OraclePrice, RpcGasEstimate, RpcUserOperation, UserOperationReceipt},
    ProviderResult,
};

/// Entry point contract reads.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait::async_trait]
pub trait EntryPoint: Send + Sync {
    /// Reads `getNonce(sender, key)`. Nonce assignment is sender-scoped;
    /// callers must serialize the read-nonce → build → sign → submit sequence
    /// per sender.
    async fn get_nonce(&self, sender: Address, key: U256) -> ProviderResult<U256>;
}

/// Deposit-based paymaster ledger reads (`balances(user, token)`).
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait::async_trait]
pub trait DepositLedger: Send + Sync {
    /// Balance of `token` the user has pre-deposited with the paymaster.
    async fn deposit_balance(&self, user: Address, token: Address) -> ProviderResult<U256>;
}

/// SuperPaymaster operator registry reads.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait::async_trait]
pub trait OperatorRegistry: Send + Sync {
    /// The operator's configured account (`operators(operator)`).
    async fn operator_account(&self, operator: Address) -> ProviderResult<OperatorAccount>;

    /// Credit, in the operator's gas-token units, still available to `user`
    /// under this operator (`getAvailableCredit(operator, user)`).
    async fn available_credit(&self, operator: Address, user: Address) -> ProviderResult<U256>;
}

/// Price oracle reads. The oracle itself is external; only the returned
/// price and its staleness metadata cross this boundary.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait::async_trait]
pub trait PriceOracle: Send + Sync {
    /// Latest price with decimals and update time.
    async fn latest_price(&self) -> ProviderResult<OraclePrice>;
}

/// Network fee reads used to seed fee estimation.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait::async_trait]
pub trait FeeOracle: Send + Sync {
    /// Current EIP-1559 fee estimates.
    async fn estimate_eip1559_fees(&self) -> ProviderResult<GasFees>;
}

/// Bundler JSON-RPC endpoint.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait::async_trait]
pub trait Bundler: Send + Sync {
    /// `eth_sendUserOperation`. Returns the user operation hash tracked by
    /// the bundler.
    async fn send_user_operation(
        &self,
        op: RpcUserOperation,
        entry_point: Address,
    ) -> ProviderResult<B256>;

    /// `eth_estimateUserOperationGas`.
    async fn estimate_user_operation_gas(
        &self,
        op: RpcUserOperation,
        entry_point: Address,
    ) -> ProviderResult<RpcGasEstimate>;

    /// `eth_getUserOperationReceipt`. `None` while the operation is pending.
    async fn user_operation_receipt(
        &self,
        hash: B256,
    ) -> ProviderResult<Option<UserOperationReceipt>>;
}

/// Opaque signing callback: a key, KMS, or remote signer.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait::async_trait]
pub trait Signer: Send + Sync {
    /// Signs the raw 32-byte user operation hash. Whether an EIP-191 prefix
    /// applies is this signer's contract with the verifying account.
    async fn sign_hash(&self, hash: B256) -> ProviderResult<Bytes>;

    /// Byte length of the signatures this signer produces. Placeholder
    /// signatures during estimation must use exactly this length.
    fn signature_length(&self) -> usize {
        opkit_types::SIGNATURE_LENGTH
    }
}
