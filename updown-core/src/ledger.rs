//! # Ledger Adapter
//!
//! The host ledger's value-transfer primitive and ordering clock, as consumed
//! by the engine. The engine never implements transfers itself; it drives a
//! [`Ledger`] and reads a [`Clock`] supplied by the host.
//!
//! [`InMemoryLedger`] and [`ManualClock`] are complete implementations for
//! hosts that run the engine outside of a ledger environment.

use std::collections::HashMap;

use thiserror::Error;

use crate::AccountId;

/// Failure of a ledger transfer. A failed transfer moves nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Recipient balance would overflow")]
    Overflow,
}

/// Atomic value transfer between accounts.
pub trait Ledger {
    /// Move `amount` from `from` to `to`, all or nothing.
    fn transfer(
        &mut self,
        amount: u64,
        from: &AccountId,
        to: &AccountId,
    ) -> Result<(), LedgerError>;

    /// Current balance of `account`; unknown accounts hold 0.
    fn balance_of(&self, account: &AccountId) -> u64;
}

/// Monotonically non-decreasing ordering clock (block height).
pub trait Clock {
    fn current_height(&self) -> u64;
}

/// Balance map ledger.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    balances: HashMap<AccountId, u64>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` into `account` (host-side funding).
    pub fn credit(&mut self, account: &AccountId, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Sum of all balances held by the ledger.
    pub fn total_supply(&self) -> u128 {
        self.balances.values().map(|b| *b as u128).sum()
    }
}

impl Ledger for InMemoryLedger {
    fn transfer(
        &mut self,
        amount: u64,
        from: &AccountId,
        to: &AccountId,
    ) -> Result<(), LedgerError> {
        if amount == 0 || from == to {
            return Ok(());
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        let new_to = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        // Both sides validated, apply together
        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, new_to);
        Ok(())
    }

    fn balance_of(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

/// Host-driven block height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManualClock {
    height: u64,
}

impl ManualClock {
    pub fn new(height: u64) -> Self {
        Self { height }
    }

    /// Move the clock to `height`. The clock never moves backwards.
    pub fn set_height(&mut self, height: u64) {
        if height < self.height {
            log::warn!(
                "Ignoring clock rewind from height {} to {}",
                self.height,
                height
            );
            return;
        }
        self.height = height;
    }

    /// Advance the clock by `blocks`, saturating at `u64::MAX`.
    pub fn advance(&mut self, blocks: u64) {
        self.height = self.height.saturating_add(blocks);
    }
}

impl Clock for ManualClock {
    fn current_height(&self) -> u64 {
        self.height
    }
}
