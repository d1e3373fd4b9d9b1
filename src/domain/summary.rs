//! Price summaries over a recent window, and side-by-side comparison.

use crate::domain::error::PlotterError;
use crate::domain::price::{PricePoint, PriceRow};
use crate::domain::ticker::{MAX_COMPARE_TICKERS, validate_ticker};
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    /// Rows as stored, newest first.
    pub prices: Vec<PriceRow>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub price_change: Option<f64>,
    pub change_percentage: Option<f64>,
    pub start_price: Option<f64>,
    pub end_price: Option<f64>,
}

impl PriceSummary {
    fn empty() -> Self {
        Self {
            prices: Vec::new(),
            start_date: None,
            end_date: None,
            price_change: None,
            change_percentage: None,
            start_price: None,
            end_price: None,
        }
    }

    /// Summarises a newest-first window: the last row is the start, the first
    /// row the end.
    pub fn from_rows(ticker: &str, rows: Vec<PriceRow>) -> Result<Self, PlotterError> {
        let (newest, oldest) = match (rows.first(), rows.last()) {
            (Some(newest), Some(oldest)) => (
                PricePoint::from_row(ticker, newest)?,
                PricePoint::from_row(ticker, oldest)?,
            ),
            _ => return Ok(Self::empty()),
        };

        let price_change = newest.close - oldest.close;
        let change_percentage = if oldest.close != 0.0 {
            Some(price_change / oldest.close * 100.0)
        } else {
            None
        };

        Ok(Self {
            prices: rows,
            start_date: Some(oldest.date),
            end_date: Some(newest.date),
            price_change: Some(price_change),
            change_percentage,
            start_price: Some(oldest.close),
            end_price: Some(newest.close),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSummary {
    pub ticker: String,
    #[serde(flatten)]
    pub summary: PriceSummary,
}

/// Resolves the caller's window, falling back to `default_months` when the
/// value is missing or not positive.
pub fn resolve_months(requested: Option<i64>, default_months: usize) -> usize {
    match requested {
        Some(m) if m > 0 => m as usize,
        _ => default_months,
    }
}

pub async fn price_summary(
    store: &dyn PricePort,
    ticker: &str,
    months: usize,
) -> Result<PriceSummary, PlotterError> {
    validate_ticker(ticker)?;
    let rows = store.get_recent_prices(ticker, months).await?;
    PriceSummary::from_rows(ticker, rows)
}

/// Summaries for up to five tickers, fetched concurrently, in request order.
pub async fn compare(
    store: &dyn PricePort,
    tickers: &[String],
    months: usize,
) -> Result<Vec<TickerSummary>, PlotterError> {
    if tickers.is_empty() || tickers.len() > MAX_COMPARE_TICKERS {
        return Err(PlotterError::validation(format!(
            "compare takes 1 to {MAX_COMPARE_TICKERS} tickers, got {}",
            tickers.len()
        )));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = tickers.iter().find(|t| !seen.insert(t.as_str())) {
        return Err(PlotterError::validation(format!("duplicate ticker: {dup}")));
    }

    try_join_all(tickers.iter().map(|ticker| async move {
        let summary = price_summary(store, ticker, months).await?;
        Ok::<_, PlotterError>(TickerSummary {
            ticker: ticker.clone(),
            summary,
        })
    }))
    .await
}
