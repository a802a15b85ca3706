//! # Updown Core
//!
//! Escrow-and-settlement engine for binary (up/down) price prediction markets.
//!
//! Participants lock funds against a price direction, an authorized oracle
//! reports the realized end price, and winners split the whole pool in
//! proportion to their stake on the winning side, minus a protocol fee.
//!
//! ## Features
//!
//! - **Market Registry**: Counter-assigned markets with a block window `[start_block, end_block)`
//! - **Prediction Ledger**: One stake record per (market, account), claimable once
//! - **Settlement**: Integer pro-rata payouts with floor division and fee extraction
//! - **Admin Surface**: Owner-gated oracle, minimum stake and fee parameters, surplus withdrawal
//! - **Injected Ledger**: Funds move only through a host [`Ledger`]; the height comes from a host [`Clock`]
//!
//! ## Examples
//!
//! ```rust
//! use updown_core::{
//!     AccountId, Direction, EngineConfig, InMemoryLedger, ManualClock, PredictionEngine,
//! };
//!
//! let owner = AccountId::from_label("owner");
//! let alice = AccountId::from_label("alice");
//! let bob = AccountId::from_label("bob");
//!
//! let mut ledger = InMemoryLedger::new();
//! ledger.credit(&alice, 1_000_000)?;
//! ledger.credit(&bob, 1_000_000)?;
//!
//! let config = EngineConfig::new(owner);
//! let mut engine = PredictionEngine::new(config, ledger, ManualClock::new(0))?;
//! let market = engine.create_market(&owner, 100, 10, 20)?;
//!
//! engine.clock_mut().set_height(12);
//! engine.make_prediction(&alice, market, Direction::Up, 1_000_000)?;
//! engine.make_prediction(&bob, market, Direction::Down, 1_000_000)?;
//!
//! // The owner is the initial oracle
//! engine.clock_mut().set_height(20);
//! engine.resolve_market(&owner, market, 150)?;
//!
//! let payout = engine.claim_winnings(&alice, market)?;
//! assert_eq!(payout, 1_960_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod account;
pub mod admin;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod market;
pub mod prediction;
pub mod settlement;
pub mod shared;

#[cfg(test)]
pub mod test_utils;

pub use account::AccountId;
pub use config::{
    EngineConfig, RepeatPredictionPolicy, DEFAULT_FEE_PERCENT, DEFAULT_MINIMUM_STAKE,
    MAX_FEE_PERCENT,
};
pub use engine::PredictionEngine;
pub use error::{EngineError, ErrorKind, Result};
pub use events::{ConfigParameter, EngineEvent};
pub use ledger::{Clock, InMemoryLedger, Ledger, LedgerError, ManualClock};
pub use market::{Direction, Market, MarketId, MarketRegistry, MarketStatus, MarketView};
pub use prediction::{Prediction, PredictionLedger, PredictionView};
pub use settlement::Payout;
pub use shared::SharedEngine;
