//! Long-horizon EMA trend filter and elementwise position gating.

use crate::domain::error::EmatrailError;
use crate::domain::signal::Exposure;

/// True where close is strictly above the filter EMA.
pub fn trend_ok(close: &[f64], ema_filter: &[f64]) -> Result<Vec<bool>, EmatrailError> {
    if ema_filter.len() != close.len() {
        return Err(EmatrailError::misaligned(
            "filter EMA",
            close.len(),
            ema_filter.len(),
        ));
    }

    Ok(close.iter().zip(ema_filter).map(|(c, f)| c > f).collect())
}

/// Memoryless AND of the intended position with the trend mask.
pub fn gate(intended: &[Exposure], trend_ok: &[bool]) -> Result<Vec<Exposure>, EmatrailError> {
    if trend_ok.len() != intended.len() {
        return Err(EmatrailError::misaligned(
            "trend mask",
            intended.len(),
            trend_ok.len(),
        ));
    }

    Ok(intended
        .iter()
        .zip(trend_ok)
        .map(|(&pos, &ok)| Exposure::from_bool(pos.is_long() && ok))
        .collect())
}
