//! Trailing-stop engine.
//!
//! A single left-to-right fold over the bars. The only state carried between
//! bars is [`TradeState`]; each bar is resolved by [`step`] in this order:
//!
//! 1. entry: gated long while not in a trade opens one with `peak = close`
//! 2. trail: while in a trade, raise `peak` to `close`, then stop out if
//!    `close <= peak * (1 - stop_pct)`
//! 3. a flat gate closes the trade regardless of the stop outcome
//!
//! Re-entry after any flat bar seeds a fresh peak at that bar's close.

use crate::domain::error::EmatrailError;
use crate::domain::signal::Exposure;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeState {
    pub in_trade: bool,
    pub peak: f64,
}

impl TradeState {
    pub const FLAT: TradeState = TradeState {
        in_trade: false,
        peak: 0.0,
    };
}

impl Default for TradeState {
    fn default() -> Self {
        TradeState::FLAT
    }
}

/// Result of resolving one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: TradeState,
    pub position: Exposure,
    pub stopped: bool,
    /// Peak used for this bar's stop check, if a trade was open.
    pub peak: Option<f64>,
}

pub fn validate_stop_pct(stop_pct: f64) -> Result<(), EmatrailError> {
    if stop_pct > 0.0 && stop_pct < 1.0 {
        Ok(())
    } else {
        Err(EmatrailError::InvalidStopPercent { stop_pct })
    }
}

pub fn step(state: TradeState, gated: Exposure, close: f64, stop_pct: f64) -> Step {
    let mut next = state;
    let mut position = gated;
    let mut stopped = false;
    let mut peak = None;

    if gated.is_long() && !next.in_trade {
        next = TradeState {
            in_trade: true,
            peak: close,
        };
    }

    if next.in_trade {
        if close > next.peak {
            next.peak = close;
        }
        peak = Some(next.peak);
        if close <= next.peak * (1.0 - stop_pct) {
            position = Exposure::Flat;
            next.in_trade = false;
            stopped = true;
        }
    }

    if position == Exposure::Flat {
        next.in_trade = false;
    }

    Step {
        state: next,
        position,
        stopped,
        peak,
    }
}

/// Per-bar output of a full trailing-stop pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailingStopPass {
    pub position: Vec<Exposure>,
    pub stopped: Vec<bool>,
    pub peak: Vec<Option<f64>>,
}

pub fn run_trailing_stop(
    gated: &[Exposure],
    close: &[f64],
    stop_pct: f64,
) -> Result<TrailingStopPass, EmatrailError> {
    validate_stop_pct(stop_pct)?;
    if close.len() != gated.len() {
        return Err(EmatrailError::misaligned("close", gated.len(), close.len()));
    }

    let steps: Vec<Step> = gated
        .iter()
        .zip(close)
        .scan(TradeState::FLAT, |state, (&g, &c)| {
            let s = step(*state, g, c, stop_pct);
            *state = s.state;
            Some(s)
        })
        .collect();

    Ok(TrailingStopPass {
        position: steps.iter().map(|s| s.position).collect(),
        stopped: steps.iter().map(|s| s.stopped).collect(),
        peak: steps.iter().map(|s| s.peak).collect(),
    })
}

pub fn apply_trailing_stop(
    gated: &[Exposure],
    close: &[f64],
    stop_pct: f64,
) -> Result<Vec<Exposure>, EmatrailError> {
    run_trailing_stop(gated, close, stop_pct).map(|pass| pass.position)
}
