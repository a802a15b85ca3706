//! # Admin Surface
//!
//! Owner-gated mutation of the global parameters and withdrawal of escrow
//! surplus. The role check is always the first guard.

use crate::{
    config::{validate_fee_percent, validate_minimum_stake, validate_role_account},
    events::ConfigParameter,
    AccountId, Clock, EngineError, EngineEvent, Ledger, PredictionEngine, Result,
};

impl<L: Ledger, C: Clock> PredictionEngine<L, C> {
    /// Hand the resolution role to `oracle`.
    pub fn set_oracle_identity(&mut self, caller: &AccountId, oracle: AccountId) -> Result<()> {
        self.require_owner(caller, "change the oracle")?;
        validate_role_account(&oracle, "oracle")?;

        self.config.oracle = oracle;
        self.record_config_change(ConfigParameter::Oracle(oracle));
        log::info!("Oracle identity set to {oracle}");
        Ok(())
    }

    pub fn set_minimum_stake(&mut self, caller: &AccountId, minimum_stake: u64) -> Result<()> {
        self.require_owner(caller, "change the minimum stake")?;
        validate_minimum_stake(minimum_stake)?;

        self.config.minimum_stake = minimum_stake;
        self.record_config_change(ConfigParameter::MinimumStake(minimum_stake));
        log::info!("Minimum stake set to {minimum_stake}");
        Ok(())
    }

    /// Applies to every claim made after the change, including claims on
    /// markets resolved earlier.
    pub fn set_fee_percent(&mut self, caller: &AccountId, fee_percent: u64) -> Result<()> {
        self.require_owner(caller, "change the fee")?;
        validate_fee_percent(fee_percent)?;

        self.config.fee_percent = fee_percent;
        self.record_config_change(ConfigParameter::FeePercent(fee_percent));
        log::info!("Fee set to {fee_percent}%");
        Ok(())
    }

    /// Transfer `amount` of escrow surplus to the owner.
    ///
    /// Surplus is whatever the escrow holds beyond its outstanding liabilities
    /// to participants, so this can never touch a claimable stake.
    pub fn withdraw_fees(&mut self, caller: &AccountId, amount: u64) -> Result<()> {
        self.require_owner(caller, "withdraw fees")?;
        if amount == 0 {
            return Err(EngineError::InvalidParameter(
                "Withdrawal amount must be greater than 0".to_string(),
            ));
        }

        let surplus = self.get_escrow_surplus();
        if amount > surplus {
            return Err(EngineError::InsufficientBalance {
                required: amount,
                available: surplus,
            });
        }

        let owner = self.config.owner;
        self.ledger.transfer(amount, &AccountId::escrow(), &owner)?;

        let height = self.clock.current_height();
        self.events.push(EngineEvent::FeesWithdrawn {
            height,
            owner,
            amount,
        });
        log::info!("Withdrew {amount} of escrow surplus to owner {owner}");
        Ok(())
    }

    fn record_config_change(&mut self, parameter: ConfigParameter) {
        let height = self.clock.current_height();
        self.events
            .push(EngineEvent::ConfigUpdated { height, parameter });
    }
}
