// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators drawn on the
// charts. Every series is index-aligned with its input and uses `None` as the
// "undefined" marker, so callers never mistake missing history for a zero.

pub mod ema;
pub mod rsi;

use serde::Serialize;

use crate::types::PriceSeries;

pub use ema::{calculate_ema, DEFAULT_EMA_SPAN};
pub use rsi::{calculate_rsi, DEFAULT_RSI_WINDOW};

/// EMA and RSI derived from one [`PriceSeries`], positionally aligned with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub ema: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// Derive both indicators from the closes of `series`.
    pub fn compute(series: &PriceSeries, ema_span: usize, rsi_window: usize) -> Self {
        let closes = series.closes();
        Self {
            ema: calculate_ema(&closes, ema_span),
            rsi: calculate_rsi(&closes, rsi_window),
        }
    }
}
