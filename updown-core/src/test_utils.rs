//! Common test utilities for updown-core tests.
//!
//! Well-known accounts, funded engine fixtures, and a ledger double that
//! fails transfers on demand.

use crate::{
    AccountId, EngineConfig, InMemoryLedger, Ledger, LedgerError, ManualClock, PredictionEngine,
};

/// Balance every participant fixture starts with
pub const STARTING_BALANCE: u64 = 10_000_000;

/// Minimum stake configured by the fixtures
pub const MIN_STAKE: u64 = 100_000;

/// Fee configured by the fixtures
pub const FEE_PERCENT: u64 = 2;

pub fn owner() -> AccountId {
    AccountId::from_label("owner")
}

pub fn oracle() -> AccountId {
    AccountId::from_label("oracle")
}

pub fn alice() -> AccountId {
    AccountId::from_label("alice")
}

pub fn bob() -> AccountId {
    AccountId::from_label("bob")
}

pub fn carol() -> AccountId {
    AccountId::from_label("carol")
}

pub fn dave() -> AccountId {
    AccountId::from_label("dave")
}

pub fn participants() -> [AccountId; 4] {
    [alice(), bob(), carol(), dave()]
}

/// Install a test logger; repeated calls are harmless.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fixture_config() -> EngineConfig {
    EngineConfig::new(owner())
        .with_oracle(oracle())
        .with_minimum_stake(MIN_STAKE)
        .with_fee_percent(FEE_PERCENT)
}

/// Engine at height 0 with every participant funded and no markets.
pub fn fixture_engine() -> PredictionEngine {
    engine_with_config(fixture_config())
}

pub fn engine_with_config(config: EngineConfig) -> PredictionEngine {
    init_logging();
    let mut ledger = InMemoryLedger::new();
    for account in participants() {
        ledger.credit(&account, STARTING_BALANCE).unwrap();
    }
    PredictionEngine::new(config, ledger, ManualClock::new(0)).unwrap()
}

/// Fixture engine with market 0 (start price 100, blocks [10, 20)) open at height 10.
pub fn open_market_engine() -> PredictionEngine {
    let mut engine = fixture_engine();
    engine.create_market(&owner(), 100, 10, 20).unwrap();
    engine.clock_mut().set_height(10);
    engine
}

/// Ledger double that fails selected transfers.
#[derive(Debug, Default)]
pub struct FlakyLedger {
    pub inner: InMemoryLedger,
    /// Transfers still allowed through before failing starts
    passes_before_failure: usize,
    /// Transfers still to fail
    failures_left: usize,
}

impl FlakyLedger {
    /// Fail the next `count` transfers.
    pub fn fail_next_transfers(&mut self, count: usize) {
        self.passes_before_failure = 0;
        self.failures_left = count;
    }

    /// Let `passes` transfers succeed, then fail exactly one.
    pub fn fail_transfer_after(&mut self, passes: usize) {
        self.fail_transfers_after(passes, 1);
    }

    /// Let `passes` transfers succeed, then fail the next `count`.
    pub fn fail_transfers_after(&mut self, passes: usize, count: usize) {
        self.passes_before_failure = passes;
        self.failures_left = count;
    }
}

impl Ledger for FlakyLedger {
    fn transfer(
        &mut self,
        amount: u64,
        from: &AccountId,
        to: &AccountId,
    ) -> Result<(), LedgerError> {
        if self.failures_left > 0 {
            if self.passes_before_failure > 0 {
                self.passes_before_failure -= 1;
            } else {
                self.failures_left -= 1;
                return Err(LedgerError::InsufficientFunds {
                    required: amount,
                    available: self.inner.balance_of(from),
                });
            }
        }
        self.inner.transfer(amount, from, to)
    }

    fn balance_of(&self, account: &AccountId) -> u64 {
        self.inner.balance_of(account)
    }
}

/// Fixture engine on a [`FlakyLedger`], at height 0 with no markets.
pub fn flaky_engine() -> PredictionEngine<FlakyLedger, ManualClock> {
    init_logging();
    let mut ledger = FlakyLedger::default();
    for account in participants() {
        ledger.inner.credit(&account, STARTING_BALANCE).unwrap();
    }
    PredictionEngine::new(fixture_config(), ledger, ManualClock::new(0)).unwrap()
}
