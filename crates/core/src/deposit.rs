//! Native value deposits and withdrawals
//!
//! Independent of the state ledger: withdrawing does not require inclusion in
//! any finalized state.

use std::collections::HashMap;

use crate::error::{Result, RollupError};
use crate::types::{AccountId, Amount};

/// Errors raised by the external value vault
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    /// The paying side does not hold enough value
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },
    /// Vault-specific refusal
    #[error("{0}")]
    Rejected(String),
}

/// External value asset the deposit ledger pulls from and pays out to
pub trait ValueVault {
    /// Take `amount` from `from` into custody
    fn receive(&mut self, from: &AccountId, amount: Amount) -> std::result::Result<(), VaultError>;

    /// Release `amount` from custody to `to`
    fn pay_out(&mut self, to: &AccountId, amount: Amount) -> std::result::Result<(), VaultError>;
}

/// In-memory vault holding external wallet balances
#[derive(Clone, Debug, Default)]
pub struct InMemoryVault {
    wallets: HashMap<AccountId, Amount>,
    custody: Amount,
}

impl InMemoryVault {
    /// Create an empty vault
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `account` external funds
    pub fn fund(&mut self, account: AccountId, amount: Amount) {
        let wallet = self.wallets.entry(account).or_default();
        *wallet = wallet.saturating_add(amount);
    }

    /// External balance of `account`
    pub fn wallet_balance(&self, account: &AccountId) -> Amount {
        self.wallets.get(account).copied().unwrap_or_default()
    }

    /// Value currently held in custody
    pub fn custody(&self) -> Amount {
        self.custody
    }
}

impl ValueVault for InMemoryVault {
    fn receive(&mut self, from: &AccountId, amount: Amount) -> std::result::Result<(), VaultError> {
        let available = self.wallet_balance(from);
        if available < amount {
            return Err(VaultError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        let custody = self
            .custody
            .checked_add(amount)
            .ok_or_else(|| VaultError::Rejected("custody overflow".to_string()))?;

        self.wallets.insert(*from, available - amount);
        self.custody = custody;
        Ok(())
    }

    fn pay_out(&mut self, to: &AccountId, amount: Amount) -> std::result::Result<(), VaultError> {
        if self.custody < amount {
            return Err(VaultError::InsufficientFunds {
                required: amount,
                available: self.custody,
            });
        }
        self.custody -= amount;
        self.fund(*to, amount);
        Ok(())
    }
}

/// Per-account balances backed one-to-one by the held reserve
#[derive(Clone, Debug, Default)]
pub struct DepositLedger {
    balances: HashMap<AccountId, Amount>,
    reserve: Amount,
}

impl DepositLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `caller` after the vault accepts `amount`; returns the new balance
    pub fn deposit<V: ValueVault>(
        &mut self,
        vault: &mut V,
        caller: &AccountId,
        amount: Amount,
    ) -> Result<Amount> {
        if amount == 0 {
            return Err(RollupError::ZeroAmount);
        }
        let balance = self
            .balance_of(caller)
            .checked_add(amount)
            .ok_or(RollupError::BalanceOverflow)?;
        let reserve = self
            .reserve
            .checked_add(amount)
            .ok_or(RollupError::BalanceOverflow)?;

        vault.receive(caller, amount)?;

        self.balances.insert(*caller, balance);
        self.reserve = reserve;
        Ok(balance)
    }

    /// Debit `caller` and release `amount` through the vault; returns the new balance
    pub fn withdraw<V: ValueVault>(
        &mut self,
        vault: &mut V,
        caller: &AccountId,
        amount: Amount,
    ) -> Result<Amount> {
        if amount == 0 {
            return Err(RollupError::ZeroAmount);
        }
        let available = self.balance_of(caller);
        if available < amount {
            return Err(RollupError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        vault.pay_out(caller, amount)?;

        let balance = available - amount;
        self.balances.insert(*caller, balance);
        self.reserve -= amount;
        Ok(balance)
    }

    /// Recorded balance of `account`
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Value held against all recorded balances
    pub fn reserve(&self) -> Amount {
        self.reserve
    }

    /// Sum of all recorded balances
    pub fn total_balances(&self) -> Amount {
        self.balances.values().fold(0, |acc, b| acc.saturating_add(*b))
    }
}
