// =============================================================================
// Chart Data Preparation
// =============================================================================
//
// Builds the two figures the renderer draws, in Plotly's figure JSON shape
// (`{ data: [traces], layout }`):
//
//   Price chart — Close and EMA traces on one y-axis scaled to
//                 [min - p*range, max + p*range], p = axis padding (0.1).
//   RSI chart   — RSI trace on a fixed [0, 100] y-axis.
//
// Undefined indicator values serialise as `null`, which Plotly draws as gaps.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::indicators::IndicatorSeries;
use crate::types::PriceSeries;

/// Fixed y-axis for RSI.
pub const RSI_AXIS_RANGE: [f64; 2] = [0.0, 100.0];

/// One line trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub name: String,
    pub x: Vec<NaiveDate>,
    pub y: Vec<Option<f64>>,
}

impl Trace {
    fn line(name: impl Into<String>, x: Vec<NaiveDate>, y: Vec<Option<f64>>) -> Self {
        Self { kind: "scatter", mode: "lines", name: name.into(), x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

/// A complete figure ready for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// Padded y-axis range over the defined closes.
///
/// `[90, 100]` with padding 0.1 gives `[89, 101]`. Returns `None` when no
/// close is defined. A constant series yields a zero-width range.
pub fn price_axis_range(closes: &[Option<f64>], padding: f64) -> Option<[f64; 2]> {
    let mut defined = closes.iter().flatten().copied().filter(|c| c.is_finite());
    let first = defined.next()?;
    let (min, max) = defined.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c)));
    let pad = (max - min) * padding;
    Some([min - pad, max + pad])
}

/// Close + EMA figure. `None` when the series has no defined close.
pub fn price_chart(
    symbol: &str,
    series: &PriceSeries,
    indicators: &IndicatorSeries,
    ema_span: usize,
    padding: f64,
) -> Option<Figure> {
    let closes = series.closes();
    let range = price_axis_range(&closes, padding)?;
    let dates = series.dates();

    Some(Figure {
        data: vec![
            Trace::line("Close", dates.clone(), closes),
            Trace::line(format!("EMA {ema_span}"), dates, indicators.ema.clone()),
        ],
        layout: Layout {
            title: format!("{symbol} Price Chart with EMA"),
            xaxis: Axis { title: "Date".into(), range: None },
            yaxis: Axis { title: "Price".into(), range: Some(range) },
        },
    })
}

/// RSI figure on the fixed 0–100 axis.
pub fn rsi_chart(symbol: &str, series: &PriceSeries, indicators: &IndicatorSeries) -> Figure {
    Figure {
        data: vec![Trace::line("RSI", series.dates(), indicators.rsi.clone())],
        layout: Layout {
            title: format!("{symbol} RSI"),
            xaxis: Axis { title: "Date".into(), range: None },
            yaxis: Axis { title: "RSI".into(), range: Some(RSI_AXIS_RANGE) },
        },
    }
}
