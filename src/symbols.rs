// =============================================================================
// Symbol Resolution & Finance Formula
// =============================================================================
//
// Typed text wins over the dropdown selection. The resolved ticker is spliced
// into a GOOGLEFINANCE formula that the sheet backend evaluates on its own
// schedule.
// =============================================================================

/// Popular NSE tickers offered in the selection list.
pub const DEFAULT_TICKERS: [&str; 11] = [
    "INFY", "TCS", "RELIANCE", "HDFCBANK", "ICICIBANK", "SBIN", "WIPRO", "HCLTECH", "ITC",
    "LT", "AXISBANK",
];

/// Pick the ticker to request.
///
/// Non-blank typed text is trimmed and upper-cased; otherwise the dropdown
/// `default` is used as-is.
pub fn resolve_symbol(typed: Option<&str>, default: &str) -> String {
    match typed.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_uppercase(),
        None => default.to_string(),
    }
}

/// Return `selected` when it is one of `tickers`, else the first ticker.
///
/// Returns `None` only when `tickers` is empty, which config validation
/// rules out.
pub fn select_default<'a>(selected: Option<&str>, tickers: &'a [String]) -> Option<&'a str> {
    selected
        .and_then(|s| tickers.iter().find(|t| t.as_str() == s))
        .or_else(|| tickers.first())
        .map(String::as_str)
}

/// Build the formula requesting every field for `lookback_days` trailing
/// calendar days, ending today.
///
/// Double quotes in the symbol are doubled so the string literal stays
/// well-formed; the data source decides whether the ticker exists.
pub fn finance_formula(exchange: &str, symbol: &str, lookback_days: u32) -> String {
    let quoted = format!("{exchange}:{symbol}").replace('"', "\"\"");
    format!(r#"=GOOGLEFINANCE("{quoted}","all",TODAY()-{lookback_days},TODAY())"#)
}
