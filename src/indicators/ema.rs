// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   alpha  = 2 / (span + 1)
//   EMA_0  = close_0
//   EMA_t  = alpha * close_t + (1 - alpha) * EMA_{t-1}
//
// No bias adjustment and no warm-up: the series is defined from the first
// close onwards.
//
// Missing closes:
//   - A missing or non-finite close yields an undefined (`None`) EMA at that
//     index. It is never treated as zero.
//   - The recurrence state survives the gap: the next defined close is blended
//     into the last defined EMA value.
//   - A leading run of missing closes stays undefined; the first defined close
//     seeds the average.
// =============================================================================

/// Default EMA span used by the price chart.
pub const DEFAULT_EMA_SPAN: usize = 20;

/// Compute the EMA series for `closes` with the given `span`.
///
/// The output has exactly `closes.len()` entries, index-aligned with the
/// input. `span == 0` has no meaningful smoothing factor and yields an
/// all-undefined series.
pub fn calculate_ema(closes: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; closes.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;

    closes
        .iter()
        .map(|close| {
            let close = close.filter(|c| c.is_finite())?;
            let ema = match prev {
                Some(p) => alpha * close + (1.0 - alpha) * p,
                None => close,
            };
            prev = Some(ema);
            Some(ema)
        })
        .collect()
}
