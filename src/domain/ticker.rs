//! Ticker symbols and ticker-list parsing.

use crate::domain::error::PlotterError;
use std::collections::HashSet;

/// Maximum number of tickers in one comparison.
pub const MAX_COMPARE_TICKERS: usize = 5;

/// Checks that a ticker is non-empty and only uses `[A-Za-z0-9._-]`.
///
/// Tickers name files in the data directory, so path separators and `..`
/// must never get through.
pub fn validate_ticker(ticker: &str) -> Result<(), PlotterError> {
    if ticker.is_empty() {
        return Err(PlotterError::validation("ticker must not be empty"));
    }
    if ticker.starts_with('.') {
        return Err(PlotterError::validation(format!(
            "invalid ticker {ticker:?}"
        )));
    }
    if !ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(PlotterError::validation(format!(
            "invalid ticker {ticker:?}"
        )));
    }
    Ok(())
}

/// Parses a comma-separated ticker list, rejecting blanks and duplicates.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, PlotterError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let ticker = token.trim();
        if ticker.is_empty() {
            return Err(PlotterError::validation("empty token in ticker list"));
        }
        validate_ticker(ticker)?;
        if !seen.insert(ticker.to_string()) {
            return Err(PlotterError::validation(format!(
                "duplicate ticker: {ticker}"
            )));
        }
        tickers.push(ticker.to_string());
    }

    Ok(tickers)
}
