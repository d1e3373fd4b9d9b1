#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use std::collections::HashMap;
use std::time::Duration;
use stockplotter::domain::error::PlotterError;
use stockplotter::domain::pagination::{Page, Record, paginate};
pub use stockplotter::domain::price::PriceRow;
use stockplotter::ports::price_port::PricePort;

/// In-memory price store. Rows are kept newest first, the same order the
/// CSV store returns them in.
pub struct MockPricePort {
    pub data: HashMap<String, Vec<PriceRow>>,
    pub errors: HashMap<String, String>,
    pub delays: HashMap<String, Duration>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            delays: HashMap::new(),
        }
    }

    pub fn with_rows(mut self, ticker: &str, rows: Vec<PriceRow>) -> Self {
        self.data.insert(ticker.to_string(), rows);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn with_delay(mut self, ticker: &str, delay: Duration) -> Self {
        self.delays.insert(ticker.to_string(), delay);
        self
    }

    async fn rows(&self, ticker: &str) -> Result<&Vec<PriceRow>, PlotterError> {
        if let Some(delay) = self.delays.get(ticker) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(reason) = self.errors.get(ticker) {
            return Err(PlotterError::Storage {
                reason: reason.clone(),
            });
        }
        self.data
            .get(ticker)
            .ok_or_else(|| PlotterError::not_found(ticker))
    }
}

#[async_trait]
impl PricePort for MockPricePort {
    async fn list_tickers(&self) -> Result<Vec<String>, PlotterError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    async fn get_page(
        &self,
        ticker: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page, PlotterError> {
        let records: Vec<Record> = self
            .rows(ticker)
            .await?
            .iter()
            .map(|r| Record::from_iter([("Date", r.date.as_str()), ("Close", r.close.as_str())]))
            .collect();
        paginate(records, page, page_size)
    }

    async fn get_recent_prices(
        &self,
        ticker: &str,
        months: usize,
    ) -> Result<Vec<PriceRow>, PlotterError> {
        let rows = self.rows(ticker).await?;
        Ok(rows.iter().take(months).cloned().collect())
    }
}

/// `count` monthly closes starting at `start`, newest first. The close grows
/// by `step` each month.
pub fn monthly_rows(start: &str, count: usize, first_close: f64, step: f64) -> Vec<PriceRow> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    let mut rows: Vec<PriceRow> = (0..count)
        .map(|i| {
            let date = start.checked_add_months(Months::new(i as u32)).unwrap();
            let close = first_close + step * i as f64;
            PriceRow::new(date.to_string(), format!("{close:.2}"))
        })
        .collect();
    rows.reverse();
    rows
}

pub fn row(date: &str, close: &str) -> PriceRow {
    PriceRow::new(date, close)
}
