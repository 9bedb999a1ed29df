//! Backtest pipeline: indicators, signal, filter, trailing stop, equity.
//!
//! Each stage consumes only the previous stage's output plus the closes, and
//! the result is one [`BacktestRow`] per input bar.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::equity::{accumulate, EquityCurve};
use crate::domain::error::EmatrailError;
use crate::domain::indicator::{calculate_ema, IndicatorSeries};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::signal::{crossover_signal, CrossoverSignal, Exposure};
use crate::domain::strategy::StrategyConfig;
use crate::domain::trailing_stop::{run_trailing_stop, TrailingStopPass};
use crate::domain::trend_filter::{gate, trend_ok};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRow {
    pub date: NaiveDate,
    pub close: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub ema_filter: f64,
    pub raw_signal: Exposure,
    pub intended: Exposure,
    pub trend_ok: bool,
    pub gated: Exposure,
    pub trail_peak: Option<f64>,
    pub stopped: bool,
    pub position: Exposure,
    pub bar_return: f64,
    pub strategy_return: f64,
    pub equity_multiplier: f64,
    pub equity_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub config: StrategyConfig,
    pub rows: Vec<BacktestRow>,
}

impl BacktestResult {
    /// Final equity multiplier minus one.
    pub fn total_return(&self) -> f64 {
        self.rows
            .last()
            .map(|r| r.equity_multiplier - 1.0)
            .unwrap_or(0.0)
    }

    pub fn final_value(&self) -> f64 {
        self.rows
            .last()
            .map(|r| r.equity_value)
            .unwrap_or(self.config.initial_capital)
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    pub fn positions(&self) -> Vec<Exposure> {
        self.rows.iter().map(|r| r.position).collect()
    }

    pub fn equity_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.equity_value).collect()
    }
}

pub fn run_backtest(
    series: &PriceSeries,
    config: &StrategyConfig,
) -> Result<BacktestResult, EmatrailError> {
    config.validate()?;

    let close = series.closes();
    info!(
        symbol = series.symbol(),
        bars = close.len(),
        strategy = %config.label(),
        "running backtest"
    );

    let fast = calculate_ema(&close, config.fast_span)?;
    let slow = calculate_ema(&close, config.slow_span)?;
    let filter = calculate_ema(&close, config.filter_span)?;
    debug!(
        fast = %fast.indicator_type,
        slow = %slow.indicator_type,
        filter = %filter.indicator_type,
        "indicators computed"
    );

    let signal = crossover_signal(&close, &fast.values, &slow.values)?;
    let mask = trend_ok(&close, &filter.values)?;
    let gated = gate(&signal.intended, &mask)?;

    let trail = run_trailing_stop(&gated, &close, config.stop_pct)?;
    debug!(
        stops = trail.stopped.iter().filter(|&&s| s).count(),
        "trailing stop applied"
    );

    let curve = accumulate(&close, &trail.position, config.initial_capital)?;

    let rows = build_rows(series, [&fast, &slow, &filter], &signal, &mask, &gated, &trail, &curve);

    let result = BacktestResult {
        symbol: series.symbol().to_string(),
        config: config.clone(),
        rows,
    };
    info!(
        final_value = result.final_value(),
        total_return = result.total_return(),
        "backtest complete"
    );
    Ok(result)
}

fn build_rows(
    series: &PriceSeries,
    [fast, slow, filter]: [&IndicatorSeries; 3],
    signal: &CrossoverSignal,
    mask: &[bool],
    gated: &[Exposure],
    trail: &TrailingStopPass,
    curve: &EquityCurve,
) -> Vec<BacktestRow> {
    series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| BacktestRow {
            date: bar.date,
            close: bar.close,
            ema_fast: fast.values[i],
            ema_slow: slow.values[i],
            ema_filter: filter.values[i],
            raw_signal: signal.raw[i],
            intended: signal.intended[i],
            trend_ok: mask[i],
            gated: gated[i],
            trail_peak: trail.peak[i],
            stopped: trail.stopped[i],
            position: trail.position[i],
            bar_return: curve.bar_returns[i],
            strategy_return: curve.strategy_returns[i],
            equity_multiplier: curve.multiplier[i],
            equity_value: curve.value[i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_relative_eq;
    use Exposure::{Flat, Long};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn short_config() -> StrategyConfig {
        StrategyConfig {
            fast_span: 2,
            slow_span: 4,
            filter_span: 6,
            stop_pct: 0.05,
            initial_capital: 10_000.0,
        }
    }

    #[test]
    fn rows_align_with_bars() {
        let s = series(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let result = run_backtest(&s, &short_config()).unwrap();
        assert_eq!(result.rows.len(), 5);
        assert_eq!(result.symbol, "TEST");
        assert_eq!(result.start_date(), Some(s.first_date()));
        assert_eq!(result.end_date(), Some(s.last_date()));
    }

    #[test]
    fn steady_uptrend_goes_long_after_lag() {
        let s = series(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = run_backtest(&s, &short_config()).unwrap();

        // bar 0: EMAs equal, flat; bar 1 raw long; bar 2 first lagged long
        assert_eq!(result.rows[0].raw_signal, Flat);
        assert_eq!(result.rows[1].raw_signal, Long);
        assert_eq!(result.rows[1].position, Flat);
        assert_eq!(result.rows[2].position, Long);
        assert!(result.rows[2..].iter().all(|r| r.position == Long));
        // bar 2 is held, so its 101 -> 102 move counts
        assert_relative_eq!(result.total_return(), 105.0 / 101.0 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            result.final_value(),
            10_000.0 * 105.0 / 101.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn flat_prices_never_trade() {
        let s = series(&[100.0; 10]);
        let result = run_backtest(&s, &short_config()).unwrap();
        assert!(result.positions().iter().all(|&p| p == Flat));
        assert_eq!(result.total_return(), 0.0);
        assert_eq!(result.final_value(), 10_000.0);
    }

    #[test]
    fn stop_forces_exit_in_uptrend_pullback() {
        let s = series(&[100.0, 102.0, 104.0, 110.0, 103.0, 104.0]);
        let result = run_backtest(&s, &short_config()).unwrap();
        // peak 110 on bar 3, stop level 104.5 breached at 103
        assert!(result.rows[4].stopped);
        assert_eq!(result.rows[4].position, Flat);
        assert_eq!(result.rows[3].trail_peak, Some(110.0));
    }

    #[test]
    fn invalid_config_fails_before_processing() {
        let s = series(&[100.0, 101.0]);
        let config = StrategyConfig {
            stop_pct: 1.5,
            ..short_config()
        };
        let err = run_backtest(&s, &config).unwrap_err();
        assert!(matches!(err, EmatrailError::InvalidStopPercent { .. }));
    }

    #[test]
    fn single_bar_series() {
        let s = series(&[100.0]);
        let result = run_backtest(&s, &StrategyConfig::default()).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].position, Flat);
        assert_eq!(result.final_value(), 100_000.0);
    }
}
