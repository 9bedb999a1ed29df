//! Strategy parameters for the EMA crossover + trend filter + trailing stop variant.

use crate::domain::equity::validate_initial_capital;
use crate::domain::error::EmatrailError;
use crate::domain::trailing_stop::validate_stop_pct;

pub const DEFAULT_FAST_SPAN: usize = 20;
pub const DEFAULT_SLOW_SPAN: usize = 100;
pub const DEFAULT_FILTER_SPAN: usize = 200;
pub const DEFAULT_STOP_PCT: f64 = 0.01;
pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub fast_span: usize,
    pub slow_span: usize,
    pub filter_span: usize,
    pub stop_pct: f64,
    pub initial_capital: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            fast_span: DEFAULT_FAST_SPAN,
            slow_span: DEFAULT_SLOW_SPAN,
            filter_span: DEFAULT_FILTER_SPAN,
            stop_pct: DEFAULT_STOP_PCT,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
        }
    }
}

impl StrategyConfig {
    /// Checks every parameter before any bar is processed.
    pub fn validate(&self) -> Result<(), EmatrailError> {
        for span in [self.fast_span, self.slow_span, self.filter_span] {
            if span < 1 {
                return Err(EmatrailError::InvalidSpan { span });
            }
        }
        validate_stop_pct(self.stop_pct)?;
        validate_initial_capital(self.initial_capital)
    }

    /// e.g. "EMA 20/100 + 200 EMA filter + 1% trailing stop"
    pub fn label(&self) -> String {
        format!(
            "EMA {}/{} + {} EMA filter + {}% trailing stop",
            self.fast_span,
            self.slow_span,
            self.filter_span,
            format_percent(self.stop_pct)
        )
    }
}

/// Fraction as a percentage, rounded to 4 decimals with trailing zeros trimmed.
fn format_percent(fraction: f64) -> String {
    let fixed = format!("{:.4}", fraction * 100.0);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_variant() {
        let c = StrategyConfig::default();
        assert_eq!(c.fast_span, 20);
        assert_eq!(c.slow_span, 100);
        assert_eq!(c.filter_span, 200);
        assert_eq!(c.stop_pct, 0.01);
        assert_eq!(c.initial_capital, 100_000.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn label_default() {
        assert_eq!(
            StrategyConfig::default().label(),
            "EMA 20/100 + 200 EMA filter + 1% trailing stop"
        );
    }

    #[test]
    fn label_fractional_stop() {
        let c = StrategyConfig {
            stop_pct: 0.025,
            ..StrategyConfig::default()
        };
        assert_eq!(c.label(), "EMA 20/100 + 200 EMA filter + 2.5% trailing stop");

        for (stop_pct, shown) in [(0.07, "7%"), (0.035, "3.5%"), (0.29, "29%"), (0.001, "0.1%")] {
            let c = StrategyConfig {
                stop_pct,
                ..StrategyConfig::default()
            };
            assert_eq!(
                c.label(),
                format!("EMA 20/100 + 200 EMA filter + {shown} trailing stop")
            );
        }
    }

    #[test]
    fn zero_span_rejected() {
        let c = StrategyConfig {
            filter_span: 0,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            c.validate(),
            Err(EmatrailError::InvalidSpan { span: 0 })
        ));
    }

    #[test]
    fn bad_stop_rejected() {
        let c = StrategyConfig {
            stop_pct: 1.5,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            c.validate(),
            Err(EmatrailError::InvalidStopPercent { .. })
        ));
    }

    #[test]
    fn bad_capital_rejected() {
        let c = StrategyConfig {
            initial_capital: 0.0,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            c.validate(),
            Err(EmatrailError::NonPositiveCapital { .. })
        ));
    }
}
