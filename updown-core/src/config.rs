//! # Engine Configuration
//!
//! Process-wide parameters fixed at deployment and afterwards mutable only
//! through the owner-gated admin surface.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{AccountId, EngineError, Result};

/// Default minimum stake, in ledger base units
pub const DEFAULT_MINIMUM_STAKE: u64 = 100_000;

/// Default protocol fee, as a percentage of each gross payout
pub const DEFAULT_FEE_PERCENT: u64 = 2;

/// Upper bound on the protocol fee percentage
pub const MAX_FEE_PERCENT: u64 = 100;

/// What happens when an account predicts twice on the same market.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPredictionPolicy {
    /// The new prediction replaces the old one; only the stake difference moves.
    #[default]
    Replace,
    /// The second prediction fails with `InvalidPrediction`.
    Reject,
}

/// Global engine configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Designated owner; receives fees and gates the admin surface
    pub owner: AccountId,

    /// Account allowed to resolve markets
    pub oracle: AccountId,

    /// Floor on the stake of a single prediction
    pub minimum_stake: u64,

    /// Fee percentage applied to each gross payout
    pub fee_percent: u64,

    /// Handling of repeated predictions on the same market
    pub repeat_policy: RepeatPredictionPolicy,
}

/// On-disk form; every field except the owner may be omitted.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    owner: AccountId,
    #[serde(default)]
    oracle: Option<AccountId>,
    #[serde(default = "default_minimum_stake")]
    minimum_stake: u64,
    #[serde(default = "default_fee_percent")]
    fee_percent: u64,
    #[serde(default)]
    repeat_policy: RepeatPredictionPolicy,
}

fn default_minimum_stake() -> u64 {
    DEFAULT_MINIMUM_STAKE
}

fn default_fee_percent() -> u64 {
    DEFAULT_FEE_PERCENT
}

impl EngineConfig {
    /// Deployment defaults; the owner doubles as the initial oracle.
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            oracle: owner,
            minimum_stake: DEFAULT_MINIMUM_STAKE,
            fee_percent: DEFAULT_FEE_PERCENT,
            repeat_policy: RepeatPredictionPolicy::default(),
        }
    }

    pub fn with_oracle(mut self, oracle: AccountId) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_minimum_stake(mut self, minimum_stake: u64) -> Self {
        self.minimum_stake = minimum_stake;
        self
    }

    pub fn with_fee_percent(mut self, fee_percent: u64) -> Self {
        self.fee_percent = fee_percent;
        self
    }

    pub fn with_repeat_policy(mut self, repeat_policy: RepeatPredictionPolicy) -> Self {
        self.repeat_policy = repeat_policy;
        self
    }

    /// Check every parameter against its bounds.
    pub fn validate(&self) -> Result<()> {
        validate_minimum_stake(self.minimum_stake)?;
        validate_fee_percent(self.fee_percent)?;
        validate_role_account(&self.owner, "owner")?;
        validate_role_account(&self.oracle, "oracle")?;
        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let raw: RawConfig =
            serde_json::from_str(json).context("Failed to parse engine configuration")?;
        let config = Self {
            owner: raw.owner,
            oracle: raw.oracle.unwrap_or(raw.owner),
            minimum_stake: raw.minimum_stake,
            fee_percent: raw.fee_percent,
            repeat_policy: raw.repeat_policy,
        };
        config
            .validate()
            .context("Engine configuration is out of bounds")?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }
}

pub(crate) fn validate_minimum_stake(minimum_stake: u64) -> Result<()> {
    if minimum_stake == 0 {
        return Err(EngineError::InvalidParameter(
            "Minimum stake must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_fee_percent(fee_percent: u64) -> Result<()> {
    if fee_percent > MAX_FEE_PERCENT {
        return Err(EngineError::InvalidParameter(format!(
            "Fee percent must be at most {MAX_FEE_PERCENT}, got {fee_percent}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_role_account(account: &AccountId, role: &str) -> Result<()> {
    if account.is_escrow() {
        return Err(EngineError::InvalidParameter(format!(
            "The escrow account cannot act as {role}"
        )));
    }
    Ok(())
}
