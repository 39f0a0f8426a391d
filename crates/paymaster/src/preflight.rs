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

//! Sponsorship preflight checks.
//!
//! The segment builders in [`crate::data`] only encode; these helpers perform
//! the external reads their preconditions name. All reads go through the
//! provider traits and nothing here mutates onchain state.

use alloy_primitives::{Address, U256};
use opkit_provider::{DepositLedger, OperatorAccount, OperatorRegistry, ProviderError};
use opkit_types::CodecError;

/// Sponsorship preflight failures.
#[derive(Debug, thiserror::Error)]
pub enum PaymasterError {
    /// The sender has nothing deposited to draw gas payments from.
    #[error("sender {user} has no deposit of token {token} with the paymaster")]
    NoDeposit {
        /// Account that would be debited.
        user: Address,
        /// Deposit token checked.
        token: Address,
    },
    /// The operator has never configured a gas token.
    #[error("operator {0} is not configured")]
    OperatorNotConfigured(Address),
    /// The operator is paused and must not sponsor new operations.
    #[error("operator {0} is paused")]
    OperatorPaused(Address),
    /// The user's remaining credit under this operator cannot cover the
    /// operation's maximum cost.
    #[error("available credit {available} gas-token units below required {required}")]
    InsufficientCredit {
        /// Gas-token units the operation may cost at the operator's rate.
        required: U256,
        /// Gas-token units of credit left.
        available: U256,
    },
    /// Encoding error from the types layer.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Collaborator read failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Converts a wei gas cost into gas-token units at an operator exchange rate.
///
/// `exchange_rate` is gas-token units per 1 ETH, scaled by 1e18, so the
/// conversion is `cost_wei * rate / 1e18`.
pub fn gas_token_cost(max_cost_wei: U256, exchange_rate: U256) -> U256 {
    max_cost_wei * exchange_rate / U256::from(10u64).pow(U256::from(18))
}

/// Checks the deposit-sponsorship precondition: the sender holds a non-zero
/// balance of `token` with the paymaster.
pub async fn ensure_deposit_ready(
    ledger: &dyn DepositLedger,
    user: Address,
    token: Address,
) -> Result<U256, PaymasterError> {
    let balance = ledger.deposit_balance(user, token).await?;
    if balance.is_zero() {
        return Err(PaymasterError::NoDeposit { user, token });
    }
    Ok(balance)
}

/// Checks the operator-sponsorship preconditions: the operator is configured,
/// not paused, and the user's remaining credit covers `max_cost_wei` at the
/// operator's exchange rate.
///
/// Returns the operator account so callers can reuse the rate and treasury
/// without a second read.
pub async fn ensure_operator_ready(
    registry: &dyn OperatorRegistry,
    operator: Address,
    user: Address,
    max_cost_wei: U256,
) -> Result<OperatorAccount, PaymasterError> {
    let account = registry.operator_account(operator).await?;
    if !account.is_configured() {
        return Err(PaymasterError::OperatorNotConfigured(operator));
    }
    if account.paused {
        return Err(PaymasterError::OperatorPaused(operator));
    }

    let required = gas_token_cost(max_cost_wei, account.exchange_rate);
    let available = registry.available_credit(operator, user).await?;
    if available < required {
        return Err(PaymasterError::InsufficientCredit { required, available });
    }

    tracing::debug!(
        %operator,
        %required,
        %available,
        "operator sponsorship preflight passed"
    );
    Ok(account)
}

#[cfg(test)]
mod tests {
    use opkit_provider::{MockDepositLedger, MockOperatorRegistry};

    use super::*;

    const USER: Address = Address::new([0x01; 20]);
    const TOKEN: Address = Address::new([0x02; 20]);
    const OPERATOR: Address = Address::new([0x03; 20]);

    fn configured_account(rate: u64, paused: bool) -> OperatorAccount {
        OperatorAccount {
            apnts_balance: U256::from(1_000_000),
            gas_token: TOKEN,
            treasury: Address::new([0x04; 20]),
            exchange_rate: U256::from(rate) * U256::from(10u64).pow(U256::from(18)),
            paused,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_deposit_preflight() {
        let mut ledger = MockDepositLedger::new();
        ledger.expect_deposit_balance().returning(|_, _| Ok(U256::from(500)));
        assert_eq!(ensure_deposit_ready(&ledger, USER, TOKEN).await.unwrap(), U256::from(500));

        let mut empty = MockDepositLedger::new();
        empty.expect_deposit_balance().returning(|_, _| Ok(U256::ZERO));
        assert!(matches!(
            ensure_deposit_ready(&empty, USER, TOKEN).await,
            Err(PaymasterError::NoDeposit { .. })
        ));
    }

    #[tokio::test]
    async fn test_operator_preflight() {
        let mut registry = MockOperatorRegistry::new();
        registry.expect_operator_account().returning(|_| Ok(configured_account(2, false)));
        registry.expect_available_credit().returning(|_, _| Ok(U256::from(1_000)));

        // Max cost 400 wei at rate 2 tokens/ETH needs 800 token units.
        let account =
            ensure_operator_ready(&registry, OPERATOR, USER, U256::from(400)).await.unwrap();
        assert_eq!(account.gas_token, TOKEN);

        // 600 wei needs 1200 units, above the 1000 available.
        assert!(matches!(
            ensure_operator_ready(&registry, OPERATOR, USER, U256::from(600)).await,
            Err(PaymasterError::InsufficientCredit { .. })
        ));
    }

    #[tokio::test]
    async fn test_operator_preflight_rejects_paused_and_unconfigured() {
        let mut paused = MockOperatorRegistry::new();
        paused.expect_operator_account().returning(|_| Ok(configured_account(1, true)));
        assert!(matches!(
            ensure_operator_ready(&paused, OPERATOR, USER, U256::ZERO).await,
            Err(PaymasterError::OperatorPaused(_))
        ));

        let mut unconfigured = MockOperatorRegistry::new();
        unconfigured.expect_operator_account().returning(|_| Ok(OperatorAccount::default()));
        assert!(matches!(
            ensure_operator_ready(&unconfigured, OPERATOR, USER, U256::ZERO).await,
            Err(PaymasterError::OperatorNotConfigured(_))
        ));
    }
}
