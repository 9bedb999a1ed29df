//! Summary statistics and trade log derived from a backtest result.

use super::backtest::{BacktestResult, BacktestRow};
use chrono::NaiveDate;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// A contiguous run of long bars in the realized position series.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_close: f64,
    pub exit_date: NaiveDate,
    pub exit_close: f64,
    pub bars_held: usize,
    /// Compounded strategy return over the held bars.
    pub return_pct: f64,
    /// Closed by the trailing stop rather than by the signal or filter.
    pub stopped_out: bool,
    /// Still long on the final bar.
    pub open: bool,
}

pub fn extract_trades(rows: &[BacktestRow]) -> Vec<Trade> {
    let mut trades = Vec::new();
    let mut current: Option<Trade> = None;

    for row in rows {
        if row.position.is_long() {
            let trade = current.get_or_insert(Trade {
                entry_date: row.date,
                entry_close: row.close,
                exit_date: row.date,
                exit_close: row.close,
                bars_held: 0,
                return_pct: 0.0,
                stopped_out: false,
                open: false,
            });
            trade.exit_date = row.date;
            trade.exit_close = row.close;
            trade.bars_held += 1;
            trade.return_pct = (1.0 + trade.return_pct) * (1.0 + row.strategy_return) - 1.0;
        } else if let Some(mut trade) = current.take() {
            trade.stopped_out = row.stopped;
            trades.push(trade);
        }
    }

    if let Some(mut trade) = current {
        trade.open = true;
        trades.push(trade);
    }

    trades
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub final_value: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    /// Fraction of bars held long.
    pub exposure: f64,
    pub total_trades: usize,
    pub stop_exits: usize,
    pub win_rate: f64,
}

impl Metrics {
    pub fn compute(result: &BacktestResult) -> Self {
        let rows = &result.rows;
        let total_return = result.total_return();

        let years = rows.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let multipliers: Vec<f64> = rows.iter().map(|r| r.equity_multiplier).collect();
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&multipliers);

        let long_bars = rows.iter().filter(|r| r.position.is_long()).count();
        let exposure = if rows.is_empty() {
            0.0
        } else {
            long_bars as f64 / rows.len() as f64
        };

        let trades = extract_trades(rows);
        let closed: Vec<&Trade> = trades.iter().filter(|t| !t.open).collect();
        let won = closed.iter().filter(|t| t.return_pct > 0.0).count();
        let win_rate = if closed.is_empty() {
            0.0
        } else {
            won as f64 / closed.len() as f64
        };

        Metrics {
            total_return,
            final_value: result.final_value(),
            annualized_return,
            max_drawdown,
            max_drawdown_duration,
            exposure,
            total_trades: trades.len(),
            stop_exits: trades.iter().filter(|t| t.stopped_out).count(),
            win_rate,
        }
    }
}

fn compute_drawdown(curve: &[f64]) -> (f64, usize) {
    if curve.is_empty() {
        return (0.0, 0);
    }

    let mut peak = curve[0];
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for &equity in curve {
        if equity >= peak {
            peak = equity;
            current_dd_duration = 0;
        } else {
            let dd = (peak - equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}
