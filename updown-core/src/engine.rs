//! # Prediction Engine
//!
//! The public operation surface: market creation, prediction submission,
//! oracle resolution and winner claims, on top of an injected [`Ledger`] and
//! [`Clock`].
//!
//! Every operation validates completely before its first transfer and only
//! mutates records after all transfers have succeeded, so an `Err` leaves the
//! engine and the ledger exactly as they were. The one exception is a claim
//! whose net payout reached the winner but could not be reversed: that claim
//! is recorded as settled so it can never be paid twice.

use crate::{
    settlement::{self, compute_payout, Payout},
    AccountId, Clock, Direction, EngineConfig, EngineError, EngineEvent, InMemoryLedger, Ledger,
    ManualClock, Market, MarketId, MarketRegistry, MarketStatus, MarketView, Prediction,
    PredictionLedger, PredictionView, RepeatPredictionPolicy, Result,
};

/// Escrow-and-settlement engine for up/down price markets.
#[derive(Debug)]
pub struct PredictionEngine<L = InMemoryLedger, C = ManualClock> {
    pub(crate) config: EngineConfig,
    pub(crate) markets: MarketRegistry,
    pub(crate) predictions: PredictionLedger,
    pub(crate) ledger: L,
    pub(crate) clock: C,
    pub(crate) events: Vec<EngineEvent>,
}

impl<L: Ledger, C: Clock> PredictionEngine<L, C> {
    /// Deploy an engine with a validated configuration.
    pub fn new(config: EngineConfig, ledger: L, clock: C) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Deploying prediction engine: owner {}, oracle {}, minimum stake {}, fee {}%",
            config.owner,
            config.oracle,
            config.minimum_stake,
            config.fee_percent
        );

        Ok(Self {
            config,
            markets: MarketRegistry::new(),
            predictions: PredictionLedger::new(),
            ledger,
            clock,
            events: Vec::new(),
        })
    }

    /// Create a market; owner only. Returns the new market's identifier.
    pub fn create_market(
        &mut self,
        caller: &AccountId,
        start_price: u64,
        start_block: u64,
        end_block: u64,
    ) -> Result<MarketId> {
        self.require_owner(caller, "create markets")?;

        let market_id = self.markets.create(start_price, start_block, end_block)?;

        let height = self.clock.current_height();
        self.events.push(EngineEvent::MarketCreated {
            height,
            market_id,
            start_price,
            start_block,
            end_block,
        });
        log::info!(
            "Created market {market_id}: start price {start_price}, blocks [{start_block}, {end_block})"
        );
        Ok(market_id)
    }

    /// Stake `stake` on `direction` in an open market.
    ///
    /// Under [`RepeatPredictionPolicy::Replace`] a repeated submission replaces
    /// the caller's previous prediction and only the stake difference moves.
    pub fn make_prediction(
        &mut self,
        caller: &AccountId,
        market_id: MarketId,
        direction: Direction,
        stake: u64,
    ) -> Result<()> {
        let height = self.clock.current_height();
        let market = self.markets.get_mut(market_id)?;

        let status = market.status(height);
        if status != MarketStatus::Open {
            return Err(EngineError::MarketClosed(format!(
                "Market {market_id} is not accepting predictions at height {height} ({})",
                describe_status(status)
            )));
        }
        if caller.is_escrow() {
            return Err(EngineError::Unauthorized(
                "The escrow account cannot make predictions".to_string(),
            ));
        }
        if stake < self.config.minimum_stake {
            return Err(EngineError::InvalidPrediction(format!(
                "Stake {stake} is below the minimum of {}",
                self.config.minimum_stake
            )));
        }

        let previous = self.predictions.find(market_id, caller).copied();
        if previous.is_some() && self.config.repeat_policy == RepeatPredictionPolicy::Reject {
            return Err(EngineError::InvalidPrediction(format!(
                "Account {caller} already predicted on market {market_id}"
            )));
        }

        let removed = previous.map(|p| (p.direction, p.stake));
        let pools = market.rebalanced_pools(removed, (direction, stake))?;

        // Only the difference against a replaced stake moves
        let previous_stake = previous.map_or(0, |p| p.stake);
        let escrow = AccountId::escrow();
        if stake > previous_stake {
            let required = stake - previous_stake;
            let available = self.ledger.balance_of(caller);
            if available < required {
                return Err(EngineError::InsufficientBalance {
                    required,
                    available,
                });
            }
            self.ledger.transfer(required, caller, &escrow)?;
        } else if previous_stake > stake {
            self.ledger
                .transfer(previous_stake - stake, &escrow, caller)?;
        }

        market.set_pools(pools);
        self.predictions
            .upsert(market_id, *caller, Prediction::new(direction, stake));

        self.events.push(EngineEvent::PredictionPlaced {
            height,
            market_id,
            account: *caller,
            direction,
            stake,
            replaced_stake: previous.map(|p| p.stake),
        });
        log::debug!(
            "Account {caller} staked {stake} on {direction} in market {market_id} (up pool {}, down pool {})",
            pools.0,
            pools.1
        );
        Ok(())
    }

    /// Report the realized end price; oracle only, once, at or after `end_block`.
    pub fn resolve_market(
        &mut self,
        caller: &AccountId,
        market_id: MarketId,
        end_price: u64,
    ) -> Result<()> {
        if *caller != self.config.oracle {
            return Err(EngineError::Unauthorized(format!(
                "Only the oracle can resolve markets, caller was {caller}"
            )));
        }

        let height = self.clock.current_height();
        let market = self.markets.get_mut(market_id)?;
        if market.resolved {
            return Err(EngineError::MarketClosed(format!(
                "Market {market_id} is already resolved"
            )));
        }
        if height < market.end_block {
            return Err(EngineError::MarketClosed(format!(
                "Market {market_id} cannot be resolved before block {} (height {height})",
                market.end_block
            )));
        }
        if end_price == 0 {
            return Err(EngineError::InvalidParameter(
                "End price must be greater than 0".to_string(),
            ));
        }

        market.end_price = end_price;
        market.resolved = true;
        let winning_direction = settlement::winning_direction(market.start_price, end_price);

        self.events.push(EngineEvent::MarketResolved {
            height,
            market_id,
            end_price,
            winning_direction,
        });
        log::info!(
            "Resolved market {market_id} at price {end_price} (start {}): {winning_direction} wins",
            market.start_price
        );
        Ok(())
    }

    /// Pay the caller's winnings for a resolved market. Returns the net payout.
    pub fn claim_winnings(&mut self, caller: &AccountId, market_id: MarketId) -> Result<u64> {
        let height = self.clock.current_height();
        let market = self.markets.get_mut(market_id)?;
        let prediction = self.predictions.get_mut(market_id, caller)?;

        let payout = claim_terms(market, prediction, self.config.fee_percent)?;
        let paid_out = market
            .paid_out
            .checked_add(payout.gross)
            .ok_or_else(|| EngineError::overflow("Paid out total"))?;
        let claimed_stake = market
            .claimed_stake
            .checked_add(prediction.stake)
            .ok_or_else(|| EngineError::overflow("Claimed stake total"))?;

        let net_paid_out = market
            .paid_out
            .checked_add(payout.net)
            .ok_or_else(|| EngineError::overflow("Paid out total"))?;

        if let Err(failure) = transfer_payout(&mut self.ledger, caller, &self.config.owner, &payout)
        {
            if failure.net_committed {
                // The unpaid fee stays in escrow
                prediction.claimed = true;
                market.paid_out = net_paid_out;
                market.claimed_stake = claimed_stake;
                log::error!(
                    "Claim by {caller} on market {market_id} settled without its fee of {}",
                    payout.fee
                );
            }
            return Err(failure.error);
        }

        prediction.claimed = true;
        market.paid_out = paid_out;
        market.claimed_stake = claimed_stake;

        self.events.push(EngineEvent::WinningsClaimed {
            height,
            market_id,
            account: *caller,
            payout,
        });
        log::info!(
            "Account {caller} claimed {} on market {market_id} (gross {}, fee {})",
            payout.net,
            payout.gross,
            payout.fee
        );
        Ok(payout.net)
    }

    /// The payout `claim_winnings` would make for `account` right now.
    pub fn preview_claim(&self, market_id: MarketId, account: &AccountId) -> Result<Payout> {
        let market = self.markets.get(market_id)?;
        let prediction = self.predictions.get(market_id, account)?;
        claim_terms(market, prediction, self.config.fee_percent)
    }

    pub fn get_market(&self, market_id: MarketId) -> Result<MarketView> {
        let market = self.markets.get(market_id)?;
        Ok(market.view(self.clock.current_height()))
    }

    pub fn get_prediction(&self, market_id: MarketId, account: &AccountId) -> Result<PredictionView> {
        self.markets.get(market_id)?;
        self.predictions.view(market_id, account)
    }

    /// Balance held by the escrow account
    pub fn get_escrow_balance(&self) -> u64 {
        self.ledger.balance_of(&AccountId::escrow())
    }

    /// Escrow balance not owed to any participant; withdrawable by the owner.
    pub fn get_escrow_surplus(&self) -> u64 {
        let liabilities: u128 = self
            .markets
            .iter()
            .map(|m| settlement::outstanding_liability(m) as u128)
            .sum();
        (self.get_escrow_balance() as u128).saturating_sub(liabilities) as u64
    }

    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of markets created so far
    pub fn market_count(&self) -> u64 {
        self.markets.next_id()
    }

    pub fn predictions(&self) -> &PredictionLedger {
        &self.predictions
    }

    /// Committed events, oldest first
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Host access to the ledger, e.g. for funding accounts
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Host access to the clock; the engine itself never advances it
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub(crate) fn require_owner(&self, caller: &AccountId, action: &str) -> Result<()> {
        if *caller != self.config.owner {
            return Err(EngineError::Unauthorized(format!(
                "Only the owner can {action}, caller was {caller}"
            )));
        }
        Ok(())
    }
}

fn describe_status(status: MarketStatus) -> &'static str {
    match status {
        MarketStatus::Pending => "not yet open",
        MarketStatus::Open => "open",
        MarketStatus::Closed => "past its end block",
        MarketStatus::Resolved => "already resolved",
    }
}

/// Validate a claim and compute its payout.
fn claim_terms(market: &Market, prediction: &Prediction, fee_percent: u64) -> Result<Payout> {
    let Some(winner) = market.winning_direction() else {
        return Err(EngineError::MarketClosed(format!(
            "Market {} is not resolved yet",
            market.id
        )));
    };
    if prediction.claimed {
        return Err(EngineError::AlreadyClaimed {
            market_id: market.id,
        });
    }
    if prediction.direction != winner {
        return Err(EngineError::InvalidPrediction(format!(
            "Prediction {} lost on market {}; {winner} won",
            prediction.direction, market.id
        )));
    }

    compute_payout(
        prediction.stake,
        market.total_pool(),
        market.pool(winner),
        fee_percent,
    )
}

/// A payout that stopped partway.
struct PayoutFailure {
    error: EngineError,
    /// The net amount reached the winner and could not be taken back
    net_committed: bool,
}

impl PayoutFailure {
    fn rolled_back(error: impl Into<EngineError>) -> Self {
        Self {
            error: error.into(),
            net_committed: false,
        }
    }
}

/// Move `payout` out of escrow: net to the winner, fee to the owner.
///
/// If the fee transfer fails after the net transfer succeeded, the net
/// transfer is reversed before the error is returned. A failed reversal is
/// reported through [`PayoutFailure::net_committed`].
fn transfer_payout<L: Ledger>(
    ledger: &mut L,
    winner: &AccountId,
    owner: &AccountId,
    payout: &Payout,
) -> std::result::Result<(), PayoutFailure> {
    let escrow = AccountId::escrow();
    let available = ledger.balance_of(&escrow);
    if available < payout.gross {
        return Err(PayoutFailure::rolled_back(EngineError::InsufficientBalance {
            required: payout.gross,
            available,
        }));
    }

    if payout.net > 0 {
        ledger
            .transfer(payout.net, &escrow, winner)
            .map_err(PayoutFailure::rolled_back)?;
    }
    if payout.fee > 0 {
        if let Err(err) = ledger.transfer(payout.fee, &escrow, owner) {
            log::warn!("Fee transfer of {} failed ({err}), reversing payout", payout.fee);
            let mut net_committed = false;
            if payout.net > 0 {
                if let Err(rollback) = ledger.transfer(payout.net, winner, &escrow) {
                    log::error!(
                        "Failed to reverse payout of {} to {winner}: {rollback}",
                        payout.net
                    );
                    net_committed = true;
                }
            }
            return Err(PayoutFailure {
                error: err.into(),
                net_committed,
            });
        }
    }
    Ok(())
}
