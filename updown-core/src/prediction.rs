//! # Prediction Ledger
//!
//! Per-(market, account) stake records and their claim status.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{AccountId, Direction, EngineError, MarketId, Result};

/// A participant's stake on one market.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prediction {
    pub direction: Direction,
    pub stake: u64,
    /// Set once, by a successful claim
    pub claimed: bool,
}

impl Prediction {
    pub fn new(direction: Direction, stake: u64) -> Self {
        Self {
            direction,
            stake,
            claimed: false,
        }
    }
}

/// Public snapshot of a prediction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PredictionView {
    pub market_id: MarketId,
    pub account: AccountId,
    pub direction: Direction,
    pub stake: u64,
    pub claimed: bool,
}

/// Owner of all prediction records.
#[derive(Clone, Debug, Default)]
pub struct PredictionLedger {
    predictions: HashMap<(MarketId, AccountId), Prediction>,
}

impl PredictionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, market_id: MarketId, account: &AccountId) -> Option<&Prediction> {
        self.predictions.get(&(market_id, *account))
    }

    pub fn get(&self, market_id: MarketId, account: &AccountId) -> Result<&Prediction> {
        self.find(market_id, account).ok_or_else(|| {
            EngineError::NotFound(format!(
                "No prediction by {account} on market {market_id}"
            ))
        })
    }

    /// Insert or replace the record for (market, account), returning the old one.
    pub(crate) fn upsert(
        &mut self,
        market_id: MarketId,
        account: AccountId,
        prediction: Prediction,
    ) -> Option<Prediction> {
        self.predictions.insert((market_id, account), prediction)
    }

    pub(crate) fn get_mut(
        &mut self,
        market_id: MarketId,
        account: &AccountId,
    ) -> Result<&mut Prediction> {
        self.predictions
            .get_mut(&(market_id, *account))
            .ok_or_else(|| {
                EngineError::NotFound(format!(
                    "No prediction by {account} on market {market_id}"
                ))
            })
    }

    pub fn view(&self, market_id: MarketId, account: &AccountId) -> Result<PredictionView> {
        let prediction = self.get(market_id, account)?;
        Ok(PredictionView {
            market_id,
            account: *account,
            direction: prediction.direction,
            stake: prediction.stake,
            claimed: prediction.claimed,
        })
    }

    /// All predictions placed on `market_id`
    pub fn for_market(
        &self,
        market_id: MarketId,
    ) -> impl Iterator<Item = (&AccountId, &Prediction)> + '_ {
        self.predictions
            .iter()
            .filter(move |((id, _), _)| *id == market_id)
            .map(|((_, account), prediction)| (account, prediction))
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}
