//! # Market Registry
//!
//! Binary up/down price markets keyed by a counter-assigned identifier.
//!
//! A market opens at `start_block`, stops accepting predictions at
//! `end_block`, and is resolved exactly once by the oracle with the realized
//! end price:
//!
//! ```text
//! Pending --(start_block)--> Open --(end_block)--> Closed --(resolve)--> Resolved
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{settlement, EngineError, Result};

/// Market identifier, assigned from a counter starting at 0 and never reused.
pub type MarketId = u64;

/// Direction of a price prediction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Wire tag: 0 for up, 1 for down
    pub fn tag(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = EngineError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Down),
            _ => Err(EngineError::InvalidPrediction(format!(
                "Unknown direction tag: {tag}"
            ))),
        }
    }
}

impl FromStr for Direction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(EngineError::InvalidPrediction(format!(
                "Direction must be 'up' or 'down', got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// Lifecycle phase of a market at a given clock height.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    /// Before `start_block`
    Pending,
    /// Accepting predictions
    Open,
    /// Past `end_block`, awaiting the oracle
    Closed,
    /// End price reported; claims allowed
    Resolved,
}

/// A binary price market and its pooled stakes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Market {
    pub id: MarketId,

    /// Reference price at window open
    pub start_price: u64,

    /// Realized price, 0 until resolved
    pub end_price: u64,

    pub total_up_stake: u64,
    pub total_down_stake: u64,

    /// First height at which predictions are accepted
    pub start_block: u64,

    /// First height at which predictions are refused and resolution allowed
    pub end_block: u64,

    pub resolved: bool,

    /// Gross winnings paid out so far
    pub paid_out: u64,

    /// Winning stake whose owners have claimed
    pub claimed_stake: u64,
}

impl Market {
    fn new(id: MarketId, start_price: u64, start_block: u64, end_block: u64) -> Result<Self> {
        if start_price == 0 {
            return Err(EngineError::InvalidParameter(
                "Start price must be greater than 0".to_string(),
            ));
        }
        if end_block <= start_block {
            return Err(EngineError::InvalidParameter(format!(
                "End block {end_block} must be after start block {start_block}"
            )));
        }

        Ok(Self {
            id,
            start_price,
            end_price: 0,
            total_up_stake: 0,
            total_down_stake: 0,
            start_block,
            end_block,
            resolved: false,
            paid_out: 0,
            claimed_stake: 0,
        })
    }

    /// Phase of the market at clock `height`
    pub fn status(&self, height: u64) -> MarketStatus {
        if self.resolved {
            MarketStatus::Resolved
        } else if height < self.start_block {
            MarketStatus::Pending
        } else if height < self.end_block {
            MarketStatus::Open
        } else {
            MarketStatus::Closed
        }
    }

    /// Pooled stake on one side
    pub fn pool(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Up => self.total_up_stake,
            Direction::Down => self.total_down_stake,
        }
    }

    /// Both sides combined. Pool updates keep this within `u64`.
    pub fn total_pool(&self) -> u64 {
        self.total_up_stake + self.total_down_stake
    }

    /// Winning side, once resolved
    pub fn winning_direction(&self) -> Option<Direction> {
        self.resolved
            .then(|| settlement::winning_direction(self.start_price, self.end_price))
    }

    /// Pool totals after taking `removed` out and putting `added` in.
    ///
    /// Does not mutate; fails with `InvalidParameter` if a total or their sum
    /// would leave `u64`.
    pub fn rebalanced_pools(
        &self,
        removed: Option<(Direction, u64)>,
        added: (Direction, u64),
    ) -> Result<(u64, u64)> {
        let mut up = self.total_up_stake;
        let mut down = self.total_down_stake;

        if let Some((direction, stake)) = removed {
            let side = match direction {
                Direction::Up => &mut up,
                Direction::Down => &mut down,
            };
            // Removed stake was counted in this pool when it was placed
            *side = side.checked_sub(stake).ok_or_else(|| {
                EngineError::InvalidParameter(format!(
                    "Cannot remove stake {stake} from {direction} pool of market {}",
                    self.id
                ))
            })?;
        }

        let (direction, stake) = added;
        let side = match direction {
            Direction::Up => &mut up,
            Direction::Down => &mut down,
        };
        *side = side
            .checked_add(stake)
            .ok_or_else(|| EngineError::overflow("Pool total"))?;

        up.checked_add(down)
            .ok_or_else(|| EngineError::overflow("Total pool"))?;
        Ok((up, down))
    }

    pub(crate) fn set_pools(&mut self, (up, down): (u64, u64)) {
        self.total_up_stake = up;
        self.total_down_stake = down;
    }

    /// Read-only snapshot at clock `height`
    pub fn view(&self, height: u64) -> MarketView {
        MarketView {
            id: self.id,
            start_price: self.start_price,
            end_price: self.end_price,
            total_up_stake: self.total_up_stake,
            total_down_stake: self.total_down_stake,
            start_block: self.start_block,
            end_block: self.end_block,
            resolved: self.resolved,
            status: self.status(height),
            winning_direction: self.winning_direction(),
        }
    }
}

/// Public snapshot of a market.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MarketView {
    pub id: MarketId,
    pub start_price: u64,
    pub end_price: u64,
    pub total_up_stake: u64,
    pub total_down_stake: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub resolved: bool,
    pub status: MarketStatus,
    pub winning_direction: Option<Direction>,
}

impl MarketView {
    pub fn total_pool(&self) -> u64 {
        self.total_up_stake + self.total_down_stake
    }
}

/// Owner of all market records and the identifier counter.
#[derive(Clone, Debug, Default)]
pub struct MarketRegistry {
    markets: BTreeMap<MarketId, Market>,
    next_id: MarketId,
}

impl MarketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a new market, returning its identifier.
    pub fn create(&mut self, start_price: u64, start_block: u64, end_block: u64) -> Result<MarketId> {
        let id = self.next_id;
        let next_id = id
            .checked_add(1)
            .ok_or_else(|| EngineError::overflow("Market counter"))?;
        let market = Market::new(id, start_price, start_block, end_block)?;

        self.markets.insert(id, market);
        self.next_id = next_id;
        Ok(id)
    }

    pub fn get(&self, id: MarketId) -> Result<&Market> {
        self.markets
            .get(&id)
            .ok_or_else(|| EngineError::NotFound(format!("Market {id} does not exist")))
    }

    pub(crate) fn get_mut(&mut self, id: MarketId) -> Result<&mut Market> {
        self.markets
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound(format!("Market {id} does not exist")))
    }

    /// Identifier the next market will receive
    pub fn next_id(&self) -> MarketId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }
}
