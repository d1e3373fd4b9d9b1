//! Price rows as stored on disk and their parsed form.

use crate::domain::error::PlotterError;
use chrono::NaiveDate;
use serde::Serialize;

/// A row exactly as the price store hands it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceRow {
    pub date: String,
    pub close: String,
}

impl PriceRow {
    pub fn new(date: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            close: close.into(),
        }
    }
}

/// A parsed price row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn from_row(ticker: &str, row: &PriceRow) -> Result<Self, PlotterError> {
        let date = parse_date(&row.date).ok_or_else(|| PlotterError::DataParse {
            ticker: ticker.to_string(),
            field: "date".into(),
            value: row.date.clone(),
            reason: "unrecognised date format".into(),
        })?;
        let close = parse_price(&row.close).map_err(|reason| PlotterError::DataParse {
            ticker: ticker.to_string(),
            field: format!("close on {}", row.date),
            value: row.close.clone(),
            reason,
        })?;
        Ok(Self { date, close })
    }
}

/// Parses a decimal price, ignoring thousands separators and stray whitespace.
///
/// Anything that does not end up as a finite number is an error; there is no
/// fallback to zero.
pub fn parse_price(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | '\'') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err("empty value".into());
    }
    let value: f64 = cleaned.parse().map_err(|_| "not a number".to_string())?;
    if !value.is_finite() {
        return Err("not a finite number".into());
    }
    Ok(value)
}

/// Parses the date forms found in processed and raw price files.
///
/// Month-only forms (`2024-07`, `Jul 2024`) resolve to the first of the month.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Some(d);
    }
    NaiveDate::parse_from_str(&format!("{s} 01"), "%b %Y %d").ok()
}

/// Parses every row and returns them oldest first.
///
/// The sort is stable, so rows sharing a date keep their relative order.
pub fn ascending_window(ticker: &str, rows: &[PriceRow]) -> Result<Vec<PricePoint>, PlotterError> {
    let mut points = rows
        .iter()
        .map(|row| PricePoint::from_row(ticker, row))
        .collect::<Result<Vec<_>, _>>()?;
    points.sort_by_key(|p| p.date);
    Ok(points)
}
