//! Journal of committed engine mutations.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Direction, MarketId, Payout};

/// One committed state change, tagged with the clock height it happened at.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    MarketCreated {
        height: u64,
        market_id: MarketId,
        start_price: u64,
        start_block: u64,
        end_block: u64,
    },
    PredictionPlaced {
        height: u64,
        market_id: MarketId,
        account: AccountId,
        direction: Direction,
        stake: u64,
        /// Stake of the prediction this one replaced, if any
        replaced_stake: Option<u64>,
    },
    MarketResolved {
        height: u64,
        market_id: MarketId,
        end_price: u64,
        winning_direction: Direction,
    },
    WinningsClaimed {
        height: u64,
        market_id: MarketId,
        account: AccountId,
        payout: Payout,
    },
    FeesWithdrawn {
        height: u64,
        owner: AccountId,
        amount: u64,
    },
    ConfigUpdated {
        height: u64,
        parameter: ConfigParameter,
    },
}

/// The configuration value an admin call changed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfigParameter {
    Oracle(AccountId),
    MinimumStake(u64),
    FeePercent(u64),
}

impl EngineEvent {
    pub fn height(&self) -> u64 {
        match self {
            Self::MarketCreated { height, .. }
            | Self::PredictionPlaced { height, .. }
            | Self::MarketResolved { height, .. }
            | Self::WinningsClaimed { height, .. }
            | Self::FeesWithdrawn { height, .. }
            | Self::ConfigUpdated { height, .. } => *height,
        }
    }

    /// Market the event belongs to, if any
    pub fn market_id(&self) -> Option<MarketId> {
        match self {
            Self::MarketCreated { market_id, .. }
            | Self::PredictionPlaced { market_id, .. }
            | Self::MarketResolved { market_id, .. }
            | Self::WinningsClaimed { market_id, .. } => Some(*market_id),
            Self::FeesWithdrawn { .. } | Self::ConfigUpdated { .. } => None,
        }
    }
}
