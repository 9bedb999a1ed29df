//! OHLCV bar and validated price series.

use crate::domain::error::EmatrailError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Time-ordered bars for a single instrument.
///
/// Non-empty, strictly increasing dates. Indicator and signal series are
/// aligned to it by position.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, EmatrailError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(EmatrailError::NoData {
                symbol,
                reason: "price series is empty".into(),
            });
        }

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(EmatrailError::DataIntegrity {
                    reason: format!(
                        "{symbol}: dates not strictly increasing ({} then {})",
                        pair[0].date, pair[1].date
                    ),
                });
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn new_accepts_increasing_dates() {
        let series = PriceSeries::new("NSEI", vec![bar(1, 100.0), bar(2, 101.0), bar(5, 99.0)])
            .unwrap();
        assert_eq!(series.symbol(), "NSEI");
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![100.0, 101.0, 99.0]);
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn new_rejects_empty() {
        let err = PriceSeries::new("NSEI", vec![]).unwrap_err();
        assert!(matches!(err, EmatrailError::NoData { .. }));
    }

    #[test]
    fn new_rejects_duplicate_dates() {
        let err = PriceSeries::new("NSEI", vec![bar(1, 100.0), bar(1, 101.0)]).unwrap_err();
        assert!(matches!(err, EmatrailError::DataIntegrity { .. }));
    }

    #[test]
    fn new_rejects_out_of_order_dates() {
        let err = PriceSeries::new("NSEI", vec![bar(3, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, EmatrailError::DataIntegrity { .. }));
    }

    #[test]
    fn dates_align_with_closes() {
        let series = PriceSeries::new("X", vec![bar(1, 10.0), bar(2, 20.0)]).unwrap();
        assert_eq!(series.dates().len(), series.closes().len());
    }
}
