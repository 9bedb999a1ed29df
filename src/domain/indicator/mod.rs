//! Technical indicator implementations.
//!
//! Indicator values are aligned 1:1 with the price series by position, not by
//! date lookup:
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: one value per bar, tagged with its type

pub mod ema;

pub use ema::{calculate_ema, ema};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<f64>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(span) => write!(f, "EMA({})", span),
        }
    }
}
