//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close (no SMA warmup), then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). Every output value is valid.

use crate::domain::error::EmatrailError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn ema(prices: &[f64], span: usize) -> Result<Vec<f64>, EmatrailError> {
    if span < 1 {
        return Err(EmatrailError::InvalidSpan { span });
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut values = Vec::with_capacity(prices.len());
    let mut prev: Option<f64> = None;

    for &price in prices {
        let next = match prev {
            None => price,
            Some(p) => price * k + p * (1.0 - k),
        };
        values.push(next);
        prev = Some(next);
    }

    Ok(values)
}

pub fn calculate_ema(closes: &[f64], span: usize) -> Result<IndicatorSeries, EmatrailError> {
    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values: ema(closes, span)?,
    })
}
