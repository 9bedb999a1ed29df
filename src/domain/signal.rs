//! EMA crossover signal and one-bar execution lag.

use crate::domain::error::EmatrailError;

/// Binary long/flat exposure for a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Exposure {
    #[default]
    Flat,
    Long,
}

impl Exposure {
    pub fn from_bool(long: bool) -> Self {
        if long { Exposure::Long } else { Exposure::Flat }
    }

    pub fn is_long(self) -> bool {
        self == Exposure::Long
    }

    /// 0.0 when flat, 1.0 when long.
    pub fn value(self) -> f64 {
        match self {
            Exposure::Flat => 0.0,
            Exposure::Long => 1.0,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Exposure::Flat => 0,
            Exposure::Long => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverSignal {
    /// Long iff fast EMA is strictly above slow EMA on the same bar.
    pub raw: Vec<Exposure>,
    /// `raw` shifted forward one bar; always flat on bar 0.
    pub intended: Vec<Exposure>,
}

pub fn crossover_signal(
    close: &[f64],
    ema_fast: &[f64],
    ema_slow: &[f64],
) -> Result<CrossoverSignal, EmatrailError> {
    let n = close.len();
    if ema_fast.len() != n {
        return Err(EmatrailError::misaligned("fast EMA", n, ema_fast.len()));
    }
    if ema_slow.len() != n {
        return Err(EmatrailError::misaligned("slow EMA", n, ema_slow.len()));
    }

    let raw: Vec<Exposure> = ema_fast
        .iter()
        .zip(ema_slow)
        .map(|(fast, slow)| Exposure::from_bool(fast > slow))
        .collect();

    let intended = std::iter::once(Exposure::Flat)
        .chain(raw.iter().copied())
        .take(n)
        .collect();

    Ok(CrossoverSignal { raw, intended })
}
