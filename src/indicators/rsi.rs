// =============================================================================
// Relative Strength Index (RSI) — simple rolling averages
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — delta_i = close_i - close_{i-1}; delta_0 is undefined.
// Step 2 — gain_i = max(delta_i, 0), loss_i = max(-delta_i, 0).
// Step 3 — avg_gain / avg_loss are the simple means of the trailing `window`
//          gains / losses ending at i (not Wilder's smoothing).
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// The output is index-aligned with the input. The first `window` entries are
// undefined because the window needs `window` deltas and delta_0 does not
// exist. A missing close makes the two deltas touching it undefined, and any
// window containing an undefined delta is itself undefined.
// =============================================================================

/// Default RSI look-back window.
pub const DEFAULT_RSI_WINDOW: usize = 14;

/// Compute the full RSI series for `closes` over `window` samples.
///
/// # Edge cases
/// - `window == 0` => every entry is `None`
/// - `closes.len() <= window` => every entry is `None`
/// - average loss zero with gains => 100.0
/// - flat window (no gains, no losses) => 50.0
pub fn calculate_rsi(closes: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if window == 0 || closes.len() <= window {
        return result;
    }

    // --- Price deltas, aligned so that deltas[i] belongs to closes[i] --------
    let deltas: Vec<Option<f64>> = std::iter::once(None)
        .chain(closes.windows(2).map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) if prev.is_finite() && curr.is_finite() => {
                Some(curr - prev)
            }
            _ => None,
        }))
        .collect();

    let window_f = window as f64;

    // Each window is summed from scratch. Series are a few hundred rows at
    // most, and a running sum would carry rounding error across windows.
    for i in window..closes.len() {
        let Some((sum_gain, sum_loss)) = deltas[i + 1 - window..=i].iter().try_fold(
            (0.0_f64, 0.0_f64),
            |(g, l), delta| delta.map(|d| (g + d.max(0.0), l + (-d).max(0.0))),
        ) else {
            continue;
        };

        result[i] = rsi_from_averages(sum_gain / window_f, sum_loss / window_f);
    }

    result
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// - If both averages are zero, RSI is 50.0 (no movement).
/// - If average loss is zero (only gains), RSI is 100.0.
/// - Returns `None` when the result is non-finite.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then_some(rsi)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn defined(values: impl IntoIterator<Item = f64>) -> Vec<Option<f64>> {
        values.into_iter().map(Some).collect()
    }

    fn assert_leading_undefined(series: &[Option<f64>], window: usize) {
        for (i, v) in series.iter().take(window).enumerate() {
            assert!(v.is_none(), "index {i} should be undefined, got {v:?}");
        }
    }

    // ---- calculate_rsi ---------------------------------------------------

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_window_zero() {
        assert_eq!(calculate_rsi(&defined([1.0, 2.0, 3.0]), 0), vec![None; 3]);
    }

    #[test]
    fn rsi_insufficient_data_keeps_length() {
        // 14 closes => 13 deltas < 14.
        let closes = defined((1..=14).map(f64::from));
        let series = calculate_rsi(&closes, 14);
        assert_eq!(series.len(), 14);
        assert!(series.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_all_gains() {
        let closes = defined((1..=30).map(f64::from));
        let series = calculate_rsi(&closes, 14);
        assert_eq!(series.len(), 30);
        assert_leading_undefined(&series, 14);
        for v in &series[14..] {
            assert_eq!(*v, Some(100.0));
        }
    }

    #[test]
    fn rsi_all_losses() {
        let closes = defined((1..=30).rev().map(f64::from));
        let series = calculate_rsi(&closes, 14);
        assert_leading_undefined(&series, 14);
        for v in &series[14..] {
            let v = v.expect("defined");
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_flat_market_is_neutral() {
        let closes = defined([100.0; 30]);
        let series = calculate_rsi(&closes, 14);
        assert_leading_undefined(&series, 14);
        for v in &series[14..] {
            assert_eq!(*v, Some(50.0));
        }
    }

    #[test]
    fn rsi_known_value() {
        // window 4, deltas +2, -1, +1, -2 => avg_gain 0.75, avg_loss 0.75.
        let closes = defined([10.0, 12.0, 11.0, 12.0, 10.0, 13.0]);
        let series = calculate_rsi(&closes, 4);
        assert_eq!(series[3], None);
        assert_eq!(series[4], Some(50.0));
        // Next window: -1, +1, -2, +3 => gain 1.0, loss 0.75, rs = 4/3.
        let expected = 100.0 - 100.0 / (1.0 + 4.0 / 3.0);
        assert!((series[5].unwrap() - expected).abs() < 1e-10);
    }

    #[test]
    fn rsi_range_check() {
        let closes = defined([
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ]);
        let series = calculate_rsi(&closes, 14);
        for v in series.iter().flatten() {
            assert!((0.0..=100.0).contains(v), "RSI {v} out of range");
        }
    }

    #[test]
    fn rsi_missing_close_propagates_for_one_window() {
        let mut closes = defined((1..=20).map(f64::from));
        closes[16] = None;
        let series = calculate_rsi(&closes, 3);
        // Deltas 16 and 17 are undefined, so every window touching them is too.
        assert_eq!(series[15], Some(100.0));
        for i in 16..=19 {
            assert_eq!(series[i], None, "index {i}");
        }
        let mut longer = closes.clone();
        longer.extend(defined([21.0, 22.0]));
        let series = calculate_rsi(&longer, 3);
        assert_eq!(series[20], Some(100.0));
    }

    // ---- rsi_from_averages -----------------------------------------------

    #[test]
    fn averages_clamp_and_neutral() {
        assert_eq!(rsi_from_averages(0.0, 0.0), Some(50.0));
        assert_eq!(rsi_from_averages(1.5, 0.0), Some(100.0));
        assert_eq!(rsi_from_averages(0.0, 1.5), Some(0.0));
        assert_eq!(rsi_from_averages(f64::NAN, 1.0), None);
    }
}
