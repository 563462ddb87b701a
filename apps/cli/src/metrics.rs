//! Trade-metric aggregation over closed positions, grounded on
//! `original_source/backend/src/models/backtest.py`'s `BacktestMetrics`
//! field set.

use jejakcuan_db::PositionRow;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Starting equity assumed for `total_return`, matching the original
/// script's default `BacktestConfig.initial_capital`.
const INITIAL_CAPITAL: Decimal = dec!(100_000);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BacktestMetrics {
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub win_rate: Decimal,
    pub average_r_multiple: Decimal,
    pub profit_factor: Decimal,
    pub max_drawdown: Decimal,
    pub sharpe_ratio: Decimal,
    pub total_return: Decimal,
}

impl BacktestMetrics {
    pub fn empty() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: Decimal::ZERO,
            average_r_multiple: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            sharpe_ratio: Decimal::ZERO,
            total_return: Decimal::ZERO,
        }
    }

    /// Positions must already be filtered to `status = 'closed'` and
    /// ordered by `closed_date` -- `PostgresPositionRepository::
    /// get_closed_in_range` guarantees both.
    pub fn from_closed_positions(positions: &[PositionRow]) -> Self {
        if positions.is_empty() {
            return Self::empty();
        }

        let mut winning = 0u32;
        let mut losing = 0u32;
        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        let mut r_multiple_sum = Decimal::ZERO;
        let mut returns = Vec::with_capacity(positions.len());

        let mut equity = Decimal::ZERO;
        let mut peak = Decimal::ZERO;
        let mut max_drawdown = Decimal::ZERO;

        for position in positions {
            let pnl = position.realized_pnl.unwrap_or(Decimal::ZERO);

            if pnl > Decimal::ZERO {
                winning += 1;
                gross_profit += pnl;
            } else if pnl < Decimal::ZERO {
                losing += 1;
                gross_loss += -pnl;
            }

            let risk_per_share = (position.entry_price - position.stop_loss).abs();
            if risk_per_share > Decimal::ZERO && position.shares > Decimal::ZERO {
                let risk_amount = risk_per_share * position.shares;
                r_multiple_sum += pnl / risk_amount;
            }

            let notional = position.entry_price * position.shares;
            if notional > Decimal::ZERO {
                returns.push(pnl / notional);
            }

            equity += pnl;
            if equity > peak {
                peak = equity;
            }
            let drawdown = if peak > Decimal::ZERO {
                (peak - equity) / peak
            } else {
                Decimal::ZERO
            };
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        let total_trades = positions.len() as u32;
        let win_rate = Decimal::from(winning) / Decimal::from(total_trades);
        let average_r_multiple = r_multiple_sum / Decimal::from(total_trades);
        let profit_factor = if gross_loss > Decimal::ZERO {
            gross_profit / gross_loss
        } else {
            gross_profit
        };
        let sharpe_ratio = sharpe_from_returns(&returns);
        let total_return = equity / INITIAL_CAPITAL;

        Self {
            total_trades,
            winning_trades: winning,
            losing_trades: losing,
            win_rate,
            average_r_multiple,
            profit_factor,
            max_drawdown,
            sharpe_ratio,
            total_return,
        }
    }
}

/// Annualized Sharpe ratio over per-trade returns, assuming ~252 trades
/// per year as the scaling horizon (no calendar information survives
/// into this aggregate).
fn sharpe_from_returns(returns: &[Decimal]) -> Decimal {
    if returns.len() < 2 {
        return Decimal::ZERO;
    }

    let n = Decimal::from(returns.len() as u32);
    let mean = returns.iter().sum::<Decimal>() / n;
    let variance = returns
        .iter()
        .map(|r| (*r - mean) * (*r - mean))
        .sum::<Decimal>()
        / n;

    if variance <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let std_dev = variance.sqrt().unwrap_or(Decimal::ZERO);
    if std_dev == Decimal::ZERO {
        return Decimal::ZERO;
    }

    let annualization = dec!(252).sqrt().unwrap_or(Decimal::ZERO);
    (mean / std_dev) * annualization
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn closed_position(entry: Decimal, stop: Decimal, shares: Decimal, pnl: Decimal) -> PositionRow {
        PositionRow {
            id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            signal_id: Uuid::new_v4(),
            symbol: "AAPL".to_string(),
            direction: "long".to_string(),
            entry_date: Utc::now(),
            entry_price: entry,
            shares,
            stop_loss: stop,
            current_price: entry,
            current_pnl: Decimal::ZERO,
            status: "closed".to_string(),
            closed_date: Some(Utc::now()),
            exit_price: Some(entry),
            realized_pnl: Some(pnl),
        }
    }

    #[test]
    fn empty_positions_yield_zeroed_metrics() {
        let metrics = BacktestMetrics::from_closed_positions(&[]);
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.win_rate, Decimal::ZERO);
    }

    #[test]
    fn mixed_trades_compute_win_rate_and_profit_factor() {
        let positions = vec![
            closed_position(dec!(100), dec!(95), dec!(10), dec!(100)),
            closed_position(dec!(100), dec!(95), dec!(10), dec!(-50)),
            closed_position(dec!(100), dec!(95), dec!(10), dec!(150)),
        ];

        let metrics = BacktestMetrics::from_closed_positions(&positions);
        assert_eq!(metrics.total_trades, 3);
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 1);
        assert_eq!(metrics.win_rate, Decimal::from(2) / Decimal::from(3));
        assert_eq!(metrics.profit_factor, dec!(250) / dec!(50));
    }

    #[test]
    fn drawdown_tracks_peak_to_trough_equity() {
        let positions = vec![
            closed_position(dec!(100), dec!(95), dec!(10), dec!(200)),
            closed_position(dec!(100), dec!(95), dec!(10), dec!(-300)),
        ];

        let metrics = BacktestMetrics::from_closed_positions(&positions);
        assert_eq!(metrics.max_drawdown, dec!(300) / dec!(200));
    }
}
