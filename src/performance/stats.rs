use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price_math::round_to;
use crate::models::{TradeRecord, TradeStatus};

/// Portfolio summary over one user's trades. Never stored; recomputed per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub total_trades: usize,
    pub active_trades: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub win_rate: Decimal,
    pub total_wins: Decimal,
    pub total_losses: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub total_profit_loss: Decimal,
    /// Plain sum of per-trade percentages, not a compounded return.
    pub total_profit_loss_percentage: Decimal,
    pub profit_factor: Decimal,
    pub best_trade: Option<TradeRecord>,
    pub worst_trade: Option<TradeRecord>,
    pub avg_duration: Decimal,
    pub avg_risk_reward: Decimal,
}

/// Reduce a user's trades to a [`PerformanceStats`] summary.
///
/// `cancelled` trades are ignored everywhere, including the trade counts.
pub fn compute_stats(trades: &[TradeRecord]) -> PerformanceStats {
    let active_trades = trades
        .iter()
        .filter(|t| t.status == TradeStatus::Active)
        .count();
    let closed: Vec<&TradeRecord> = trades.iter().filter(|t| t.is_closed()).collect();

    let with_status = |status: TradeStatus| {
        closed
            .iter()
            .copied()
            .filter(|t| t.status == status)
            .collect::<Vec<_>>()
    };
    let winners = with_status(TradeStatus::Winner);
    let losers = with_status(TradeStatus::Loser);
    let breakeven_trades = with_status(TradeStatus::Breakeven).len();

    let pl = |t: &&TradeRecord| t.profit_loss.unwrap_or(Decimal::ZERO);

    let total_wins = sum(winners.iter().map(pl));
    let total_losses = sum(losers.iter().map(pl)).abs();

    let win_rate = ratio(Decimal::from(winners.len()), closed.len()) * Decimal::ONE_HUNDRED;
    let avg_win = ratio(total_wins, winners.len());
    let avg_loss = ratio(total_losses, losers.len());

    let total_profit_loss = sum(closed.iter().map(pl));
    let total_profit_loss_percentage = sum(
        closed
            .iter()
            .map(|t| t.profit_loss_percentage.unwrap_or(Decimal::ZERO)),
    );

    let profit_factor = if total_losses > Decimal::ZERO {
        total_wins.checked_div(total_losses).unwrap_or(Decimal::MAX)
    } else {
        Decimal::ZERO
    };

    // Ties keep the earliest record in input order.
    let mut best: Option<&TradeRecord> = None;
    let mut worst: Option<&TradeRecord> = None;
    for trade in &closed {
        let value = pl(trade);
        if best.map_or(true, |b| value > pl(&b)) {
            best = Some(*trade);
        }
        if worst.map_or(true, |w| value < pl(&w)) {
            worst = Some(*trade);
        }
    }
    let best_trade = best.filter(|t| pl(t) > Decimal::ZERO).cloned();
    let worst_trade = worst.filter(|t| pl(t) < Decimal::ZERO).cloned();

    let total_duration = sum(
        closed
            .iter()
            .map(|t| Decimal::from(t.duration_days.unwrap_or(0))),
    );
    let avg_duration = ratio(total_duration, closed.len());

    let ratios: Vec<Decimal> = closed.iter().filter_map(|t| t.risk_reward_ratio).collect();
    let avg_risk_reward = ratio(sum(ratios.iter().copied()), ratios.len());

    PerformanceStats {
        total_trades: active_trades + closed.len(),
        active_trades,
        closed_trades: closed.len(),
        winning_trades: winners.len(),
        losing_trades: losers.len(),
        breakeven_trades,
        win_rate: round_to(win_rate, 2),
        total_wins: round_to(total_wins, 2),
        total_losses: round_to(total_losses, 2),
        avg_win: round_to(avg_win, 2),
        avg_loss: round_to(avg_loss, 2),
        total_profit_loss: round_to(total_profit_loss, 2),
        total_profit_loss_percentage: round_to(total_profit_loss_percentage, 2),
        profit_factor: round_to(profit_factor, 2),
        best_trade,
        worst_trade,
        avg_duration: round_to(avg_duration, 1),
        avg_risk_reward: round_to(avg_risk_reward, 2),
    }
}

/// Saturating sum, so extreme stored values cannot abort a stats request.
fn sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

/// `numerator / count`, or zero for an empty set.
fn ratio(numerator: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        numerator / Decimal::from(count)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
