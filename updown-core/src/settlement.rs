//! # Settlement Arithmetic
//!
//! Winner determination and pro-rata payout computation.
//!
//! Winners split the *entire* pool (both sides) in proportion to their share
//! of the winning side. All division floors; the remainder ("dust") stays in
//! escrow as protocol surplus.
//!
//! ```text
//! gross = stake * total_pool / winning_pool
//! fee   = gross * fee_percent / 100
//! net   = gross - fee
//! ```

use serde::{Deserialize, Serialize};

use crate::{Direction, EngineError, Market, Result};

/// Split of one winner's share of the pool.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Payout {
    /// Pro-rata share of the total pool
    pub gross: u64,
    /// Protocol fee taken from `gross`
    pub fee: u64,
    /// Amount paid to the winner
    pub net: u64,
}

/// Winning side for a market that opened at `start_price` and closed at
/// `end_price`. A tie goes to `Down`.
pub fn winning_direction(start_price: u64, end_price: u64) -> Direction {
    if end_price > start_price {
        Direction::Up
    } else {
        Direction::Down
    }
}

/// Compute the payout owed to a winning `stake`.
pub fn compute_payout(
    stake: u64,
    total_pool: u64,
    winning_pool: u64,
    fee_percent: u64,
) -> Result<Payout> {
    if winning_pool == 0 {
        return Err(EngineError::InvalidParameter(
            "Winning pool is empty".to_string(),
        ));
    }
    if stake > winning_pool || winning_pool > total_pool {
        return Err(EngineError::InvalidParameter(format!(
            "Inconsistent pools: stake {stake}, winning pool {winning_pool}, total pool {total_pool}"
        )));
    }
    if fee_percent > crate::MAX_FEE_PERCENT {
        return Err(EngineError::InvalidParameter(format!(
            "Fee percent {fee_percent} exceeds {}",
            crate::MAX_FEE_PERCENT
        )));
    }

    // u64 * u64 fits in u128, and stake <= winning_pool bounds gross by total_pool
    let gross = (stake as u128 * total_pool as u128) / winning_pool as u128;
    let gross = u64::try_from(gross).map_err(|_| EngineError::overflow("Gross winnings"))?;

    let fee = (gross as u128 * fee_percent as u128) / 100;
    let fee = u64::try_from(fee).map_err(|_| EngineError::overflow("Fee"))?;

    Ok(Payout {
        gross,
        fee,
        net: gross - fee,
    })
}

/// Amount of escrow a market still owes its participants.
///
/// Unresolved markets owe their whole pool. Resolved markets owe what is left
/// of the pool until every winning stake has claimed, and nothing at all if
/// nobody picked the winning side.
pub fn outstanding_liability(market: &Market) -> u64 {
    let Some(winner) = market.winning_direction() else {
        return market.total_pool();
    };

    let winning_pool = market.pool(winner);
    if winning_pool == 0 || market.claimed_stake >= winning_pool {
        return 0;
    }
    market.total_pool().saturating_sub(market.paid_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MarketRegistry;

    #[test]
    fn test_winning_direction() {
        assert_eq!(winning_direction(100, 150), Direction::Up);
        assert_eq!(winning_direction(100, 50), Direction::Down);
        assert_eq!(winning_direction(100, 100), Direction::Down);
    }

    #[test]
    fn test_even_pools_with_fee() {
        let payout = compute_payout(1_000_000, 2_000_000, 1_000_000, 2).unwrap();
        assert_eq!(
            payout,
            Payout {
                gross: 2_000_000,
                fee: 40_000,
                net: 1_960_000
            }
        );
    }

    #[test]
    fn test_proportional_share() {
        // Winners hold 100k and 50k of a 300k pool
        let a = compute_payout(100_000, 300_000, 150_000, 0).unwrap();
        let b = compute_payout(50_000, 300_000, 150_000, 0).unwrap();
        assert_eq!(a.gross, 200_000);
        assert_eq!(b.gross, 100_000);
        assert_eq!(a.fee, 0);
        assert_eq!(a.net, a.gross);
    }

    #[test]
    fn test_floor_division_never_overpays() {
        let stakes = [333_333u64, 333_333, 333_334, 7, 1_000_003];
        let winning_pool: u64 = stakes.iter().sum();
        let total_pool = winning_pool + 999_999;

        let paid: u64 = stakes
            .iter()
            .map(|s| compute_payout(*s, total_pool, winning_pool, 3).unwrap())
            .map(|p| p.net + p.fee)
            .sum();

        assert!(paid <= total_pool);
        // Dust is at most one unit per winner
        assert!(total_pool - paid < stakes.len() as u64);
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        let payout = compute_payout(u64::MAX / 2, u64::MAX, u64::MAX / 2, 100).unwrap();
        assert_eq!(payout.gross, u64::MAX);
        assert_eq!(payout.net, 0);
        assert_eq!(payout.fee, payout.gross);
    }

    #[test]
    fn test_inconsistent_inputs() {
        assert!(matches!(
            compute_payout(10, 100, 0, 2),
            Err(EngineError::InvalidParameter(_))
        ));
        assert!(matches!(
            compute_payout(60, 100, 50, 2),
            Err(EngineError::InvalidParameter(_))
        ));
        assert!(matches!(
            compute_payout(10, 100, 50, 101),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_outstanding_liability() {
        let mut registry = MarketRegistry::new();
        let id = registry.create(100, 10, 20).unwrap();
        let market = registry.get_mut(id).unwrap();
        market.set_pools((300, 700));
        assert_eq!(outstanding_liability(market), 1_000);

        market.end_price = 150;
        market.resolved = true;
        assert_eq!(outstanding_liability(market), 1_000);

        market.paid_out = 666;
        market.claimed_stake = 200;
        assert_eq!(outstanding_liability(market), 334);

        market.paid_out = 999;
        market.claimed_stake = 300;
        assert_eq!(outstanding_liability(market), 0);
    }

    #[test]
    fn test_no_winners_owes_nothing() {
        let mut registry = MarketRegistry::new();
        let id = registry.create(100, 10, 20).unwrap();
        let market = registry.get_mut(id).unwrap();
        market.set_pools((0, 700));
        market.end_price = 150;
        market.resolved = true;
        assert_eq!(outstanding_liability(market), 0);
    }
}
