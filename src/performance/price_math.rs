use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::TradeStatus;

/// Half-width of the band around zero treated as breakeven, in percent.
const BREAKEVEN_BAND_PCT: Decimal = Decimal::from_parts(5, 0, 0, false, 1); // 0.5

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Round half away from zero to `dp` decimal places.
pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitLoss {
    pub profit_loss: Decimal,
    pub profit_loss_percentage: Decimal,
}

/// Realised P/L of a long position.
///
/// `entry_price` must be non-zero; callers check this before calling.
/// Returns `None` when a result does not fit in a `Decimal`.
pub fn compute_profit_loss(
    entry_price: Decimal,
    exit_price: Decimal,
    position_size: Decimal,
) -> Option<ProfitLoss> {
    let move_ = exit_price.checked_sub(entry_price)?;
    let profit_loss = move_.checked_mul(position_size)?;
    let percentage = move_
        .checked_div(entry_price)?
        .checked_mul(Decimal::ONE_HUNDRED)?;

    Some(ProfitLoss {
        profit_loss: round_to(profit_loss, 2),
        profit_loss_percentage: round_to(percentage, 2),
    })
}

/// Realised move divided by the distance to the stop. Zero when the stop
/// sits on the entry price; `None` on overflow.
pub fn compute_risk_reward_ratio(
    entry_price: Decimal,
    exit_price: Decimal,
    stop_loss: Decimal,
) -> Option<Decimal> {
    let reward = exit_price.checked_sub(entry_price)?.abs();
    let risk = entry_price.checked_sub(stop_loss)?.abs();

    if risk.is_zero() {
        return Some(Decimal::ZERO);
    }

    reward.checked_div(risk).map(|ratio| round_to(ratio, 2))
}

/// Whole days between two instants, rounded up. Any non-zero gap counts as
/// at least one day.
pub fn compute_duration_days(entry_date: DateTime<Utc>, exit_date: DateTime<Utc>) -> i64 {
    let millis = (exit_date - entry_date).num_milliseconds().abs();
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner,
    Loser,
    Breakeven,
}

impl From<Outcome> for TradeStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Winner => TradeStatus::Winner,
            Outcome::Loser => TradeStatus::Loser,
            Outcome::Breakeven => TradeStatus::Breakeven,
        }
    }
}

/// Moves inside ±0.5% are breakeven so that noise is not counted as a
/// directional result.
pub fn classify_outcome(profit_loss_percentage: Decimal) -> Outcome {
    if profit_loss_percentage > BREAKEVEN_BAND_PCT {
        Outcome::Winner
    } else if profit_loss_percentage < -BREAKEVEN_BAND_PCT {
        Outcome::Loser
    } else {
        Outcome::Breakeven
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
