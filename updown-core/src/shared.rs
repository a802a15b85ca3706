//! Thread-safe handle that serializes engine operations.
//!
//! Each [`SharedEngine::transact`] call holds the lock for its whole closure,
//! so validation, fund movement and record updates inside it are observed by
//! other threads as a single step.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{Clock, InMemoryLedger, Ledger, ManualClock, PredictionEngine};

pub struct SharedEngine<L = InMemoryLedger, C = ManualClock> {
    inner: Arc<Mutex<PredictionEngine<L, C>>>,
}

impl<L, C> Clone for SharedEngine<L, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: Ledger, C: Clock> SharedEngine<L, C> {
    pub fn new(engine: PredictionEngine<L, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine.
    pub fn transact<T>(&self, f: impl FnOnce(&mut PredictionEngine<L, C>) -> T) -> T {
        // Operations never leave partial state behind, so a poisoned lock is still consistent
        let mut engine = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut engine)
    }

    /// Recover the engine once every other handle is gone.
    pub fn into_inner(self) -> Option<PredictionEngine<L, C>> {
        Arc::try_unwrap(self.inner)
            .ok()
            .map(|mutex| mutex.into_inner().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::{AccountId, Direction};
    use std::thread;

    #[test]
    fn test_concurrent_predictions_are_serialized() {
        let mut engine = open_market_engine();
        let accounts: Vec<_> = (0..8)
            .map(|i| AccountId::from_label(&format!("trader-{i}")))
            .collect();
        for account in &accounts {
            engine.ledger_mut().credit(account, STARTING_BALANCE).unwrap();
        }
        let shared = SharedEngine::new(engine);

        let handles: Vec<_> = accounts
            .iter()
            .enumerate()
            .map(|(i, account)| {
                let shared = shared.clone();
                let account = *account;
                thread::spawn(move || {
                    let direction = if i % 2 == 0 { Direction::Up } else { Direction::Down };
                    let stake = MIN_STAKE * (i as u64 + 1);
                    shared.transact(|engine| engine.make_prediction(&account, 0, direction, stake))
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let engine = shared.into_inner().unwrap();
        let expected: u64 = (1..=8).map(|i| MIN_STAKE * i).sum();
        let market = engine.get_market(0).unwrap();
        assert_eq!(market.total_pool(), expected);
        assert_eq!(engine.get_escrow_balance(), expected);
        assert_eq!(engine.predictions().for_market(0).count(), 8);
    }

    #[test]
    fn test_into_inner_with_live_handles() {
        let shared = SharedEngine::new(fixture_engine());
        let other = shared.clone();
        assert!(shared.into_inner().is_none());
        assert!(other.into_inner().is_some());
    }
}
