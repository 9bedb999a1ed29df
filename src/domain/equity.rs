//! Performance accumulator: per-bar returns compounded into an equity curve.

use crate::domain::error::EmatrailError;
use crate::domain::signal::Exposure;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityCurve {
    pub initial_capital: f64,
    /// close[i] / close[i-1] - 1, zero on the first bar.
    pub bar_returns: Vec<f64>,
    /// Realized position times bar return. No extra lag: the position
    /// series already reflects the previous bar's signal.
    pub strategy_returns: Vec<f64>,
    /// Running product of (1 + strategy return).
    pub multiplier: Vec<f64>,
    /// `multiplier * initial_capital`.
    pub value: Vec<f64>,
}

impl EquityCurve {
    pub fn len(&self) -> usize {
        self.multiplier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.multiplier.is_empty()
    }

    pub fn total_return(&self) -> f64 {
        self.multiplier.last().map(|m| m - 1.0).unwrap_or(0.0)
    }

    pub fn final_value(&self) -> f64 {
        self.value.last().copied().unwrap_or(self.initial_capital)
    }
}

pub fn validate_initial_capital(initial_capital: f64) -> Result<(), EmatrailError> {
    if initial_capital > 0.0 && initial_capital.is_finite() {
        Ok(())
    } else {
        Err(EmatrailError::NonPositiveCapital {
            capital: initial_capital,
        })
    }
}

pub fn accumulate(
    close: &[f64],
    position: &[Exposure],
    initial_capital: f64,
) -> Result<EquityCurve, EmatrailError> {
    if close.is_empty() {
        return Err(EmatrailError::EmptySeries);
    }
    validate_initial_capital(initial_capital)?;
    if position.len() != close.len() {
        return Err(EmatrailError::misaligned(
            "position",
            close.len(),
            position.len(),
        ));
    }
    if let Some((i, c)) = close
        .iter()
        .enumerate()
        .find(|&(_, c)| !(c.is_finite() && *c > 0.0))
    {
        return Err(EmatrailError::DataIntegrity {
            reason: format!("close at bar {i} is {c}; closes must be finite and positive"),
        });
    }

    let bar_returns: Vec<f64> = std::iter::once(0.0)
        .chain(close.windows(2).map(|w| w[1] / w[0] - 1.0))
        .collect();

    let strategy_returns: Vec<f64> = position
        .iter()
        .zip(&bar_returns)
        .map(|(pos, r)| pos.value() * r)
        .collect();

    let multiplier: Vec<f64> = strategy_returns
        .iter()
        .scan(1.0, |acc, r| {
            *acc *= 1.0 + r;
            Some(*acc)
        })
        .collect();

    let value = multiplier.iter().map(|m| m * initial_capital).collect();

    Ok(EquityCurve {
        initial_capital,
        bar_returns,
        strategy_returns,
        multiplier,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use Exposure::{Flat, Long};

    #[test]
    fn first_bar_return_is_zero() {
        let curve = accumulate(&[100.0, 110.0], &[Long, Long], 1000.0).unwrap();
        assert_eq!(curve.bar_returns[0], 0.0);
        assert_relative_eq!(curve.bar_returns[1], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn flat_position_earns_nothing() {
        let curve = accumulate(&[100.0, 120.0, 90.0], &[Flat, Flat, Flat], 1000.0).unwrap();
        assert_eq!(curve.strategy_returns, vec![0.0, 0.0, 0.0]);
        assert_eq!(curve.multiplier, vec![1.0, 1.0, 1.0]);
        assert_eq!(curve.final_value(), 1000.0);
    }

    #[test]
    fn compounds_long_returns() {
        let curve =
            accumulate(&[100.0, 110.0, 99.0, 108.9], &[Flat, Long, Long, Flat], 100_000.0)
                .unwrap();
        // 1.1 * 0.9 = 0.99; last bar flat
        assert_relative_eq!(curve.multiplier[1], 1.1, epsilon = 1e-12);
        assert_relative_eq!(curve.multiplier[2], 0.99, epsilon = 1e-12);
        assert_relative_eq!(curve.multiplier[3], 0.99, epsilon = 1e-12);
        assert_relative_eq!(curve.final_value(), 99_000.0, epsilon = 1e-6);
        assert_relative_eq!(curve.total_return(), -0.01, epsilon = 1e-12);
    }

    #[test]
    fn same_inputs_same_curve() {
        let close = [100.0, 101.0, 99.5, 102.0];
        let pos = [Flat, Long, Long, Long];
        let a = accumulate(&close, &pos, 5000.0).unwrap();
        let b = accumulate(&close, &pos, 5000.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_series_rejected() {
        let err = accumulate(&[], &[], 100_000.0).unwrap_err();
        assert!(matches!(err, EmatrailError::EmptySeries));
    }

    #[test]
    fn non_positive_capital_rejected() {
        for bad in [0.0, -1.0, f64::NAN] {
            let err = accumulate(&[100.0], &[Flat], bad).unwrap_err();
            assert!(matches!(err, EmatrailError::NonPositiveCapital { .. }));
        }
    }

    #[test]
    fn zero_close_is_integrity_error() {
        let err = accumulate(&[100.0, 0.0, 50.0], &[Flat, Long, Long], 1.0).unwrap_err();
        assert!(matches!(err, EmatrailError::DataIntegrity { .. }));
    }

    #[test]
    fn misaligned_position_rejected() {
        let err = accumulate(&[100.0, 101.0], &[Long], 1.0).unwrap_err();
        assert!(matches!(err, EmatrailError::DataIntegrity { .. }));
    }
}
