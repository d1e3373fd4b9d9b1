//! Buy-and-hold investment projection over historical closing prices.
//!
//! A projection buys as many (fractional) shares as the initial investment
//! affords at the first close of the window, never trades again, and values
//! that fixed holding at every later close.

use crate::domain::error::PlotterError;
use crate::domain::price::{PricePoint, PriceRow, ascending_window};
use crate::domain::ticker::validate_ticker;
use crate::ports::price_port::PricePort;
use chrono::{Months, NaiveDate};
use serde::Serialize;

pub const DEFAULT_ALLOWED_DURATIONS: [u32; 3] = [1, 3, 5];
pub const DEFAULT_HISTORY_MONTHS: usize = 60;
/// Longest holding period a projection accepts.
pub const MAX_DURATION_YEARS: u32 = 100;

/// Knobs for the projection window.
///
/// The number of months requested from the store and the holding period
/// filtered out of it are kept apart, so calendar skew can be absorbed with
/// `history_padding_months` instead of surfacing as `InsufficientData`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    pub allowed_durations: Vec<u32>,
    pub months_per_year: u32,
    pub history_padding_months: u32,
    /// Window used by price summaries when the caller gives none.
    pub default_history_months: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            allowed_durations: DEFAULT_ALLOWED_DURATIONS.to_vec(),
            months_per_year: 12,
            history_padding_months: 0,
            default_history_months: DEFAULT_HISTORY_MONTHS,
        }
    }
}

impl ProjectionConfig {
    pub fn validate_duration(&self, duration_years: u32) -> Result<(), PlotterError> {
        if duration_years > MAX_DURATION_YEARS {
            return Err(PlotterError::validation(format!(
                "duration must be at most {MAX_DURATION_YEARS} years, got {duration_years}"
            )));
        }
        if self.allowed_durations.contains(&duration_years) {
            Ok(())
        } else {
            Err(PlotterError::validation(format!(
                "duration must be one of {:?} years, got {}",
                self.allowed_durations, duration_years
            )))
        }
    }

    /// Months of history to request from the store for a holding period.
    pub fn history_months(&self, duration_years: u32) -> Result<usize, PlotterError> {
        duration_years
            .checked_mul(self.months_per_year)
            .and_then(|m| m.checked_add(self.history_padding_months))
            .map(|m| m as usize)
            .ok_or_else(|| {
                PlotterError::validation(format!(
                    "history for {duration_years} years at {} months per year overflows",
                    self.months_per_year
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentStep {
    pub date: NaiveDate,
    pub stock_price: f64,
    pub shares_owned: f64,
    pub investment_value: f64,
    pub total_return: f64,
    pub return_percentage: f64,
}

impl InvestmentStep {
    fn value(date: NaiveDate, close: f64, shares_owned: f64, initial_investment: f64) -> Self {
        let investment_value = shares_owned * close;
        let total_return = investment_value - initial_investment;
        Self {
            date,
            stock_price: close,
            shares_owned,
            investment_value,
            total_return,
            return_percentage: total_return / initial_investment * 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentProjection {
    pub ticker: String,
    pub initial_investment: f64,
    pub duration: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub final_value: f64,
    pub total_return: f64,
    pub total_return_percentage: f64,
    pub steps: Vec<InvestmentStep>,
}

impl InvestmentProjection {
    pub fn shares_owned(&self) -> f64 {
        self.steps.first().map(|s| s.shares_owned).unwrap_or(0.0)
    }
}

pub fn validate_investment(amount: f64) -> Result<(), PlotterError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PlotterError::validation(format!(
            "investment amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

/// Fetches the ticker's recent history and projects a buy-and-hold position.
pub async fn project(
    store: &dyn PricePort,
    config: &ProjectionConfig,
    ticker: &str,
    initial_investment: f64,
    duration_years: u32,
) -> Result<InvestmentProjection, PlotterError> {
    validate_ticker(ticker)?;
    validate_investment(initial_investment)?;
    config.validate_duration(duration_years)?;

    let months = config.history_months(duration_years)?;
    let rows = store.get_recent_prices(ticker, months).await?;
    tracing::debug!(ticker, months, rows = rows.len(), "fetched projection history");

    simulate(ticker, initial_investment, duration_years, &rows)
}

/// Runs the simulation over rows in either date order.
pub fn simulate(
    ticker: &str,
    initial_investment: f64,
    duration_years: u32,
    rows: &[PriceRow],
) -> Result<InvestmentProjection, PlotterError> {
    if rows.is_empty() {
        return Err(PlotterError::not_found(ticker));
    }

    let points = ascending_window(ticker, rows)?;
    let window_start = points[0].date;
    let holding_months = duration_years.checked_mul(12).ok_or_else(|| {
        PlotterError::validation(format!("duration of {duration_years} years is too long"))
    })?;
    let window_end = window_start
        .checked_add_months(Months::new(holding_months))
        .unwrap_or(NaiveDate::MAX);

    let window: Vec<&PricePoint> = points
        .iter()
        .filter(|p| p.date >= window_start && p.date <= window_end)
        .collect();

    let (first, last) = match (window.first(), window.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(PlotterError::InsufficientData {
                ticker: ticker.to_string(),
                start: window_start.to_string(),
                end: window_end.to_string(),
            });
        }
    };

    if first.close <= 0.0 {
        return Err(PlotterError::DataParse {
            ticker: ticker.to_string(),
            field: format!("close on {}", first.date),
            value: first.close.to_string(),
            reason: "purchase price must be positive".into(),
        });
    }

    let shares_owned = initial_investment / first.close;
    let steps: Vec<InvestmentStep> = window
        .iter()
        .map(|p| InvestmentStep::value(p.date, p.close, shares_owned, initial_investment))
        .collect();

    let (final_value, total_return, total_return_percentage) = steps
        .last()
        .map(|s| (s.investment_value, s.total_return, s.return_percentage))
        .unwrap_or((initial_investment, 0.0, 0.0));

    Ok(InvestmentProjection {
        ticker: ticker.to_string(),
        initial_investment,
        duration: duration_years,
        start_date: first.date,
        end_date: last.date,
        final_value,
        total_return,
        total_return_percentage,
        steps,
    })
}
