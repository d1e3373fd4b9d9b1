//! Price store port trait.

use crate::domain::error::PlotterError;
use crate::domain::pagination::Page;
use crate::domain::price::PriceRow;
use async_trait::async_trait;

/// Read-only access to historical price series, one series per ticker.
#[async_trait]
pub trait PricePort: Send + Sync {
    /// All known tickers, sorted ascending.
    async fn list_tickers(&self) -> Result<Vec<String>, PlotterError>;

    /// One page of the ticker's full table, newest rows first.
    ///
    /// Fails with `NotFound` for an unknown ticker and `InvalidPage` when
    /// `page` is outside `1..=total_pages`.
    async fn get_page(
        &self,
        ticker: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page, PlotterError>;

    /// The newest `months` rows for the ticker, newest first.
    ///
    /// Fails with `NotFound` for an unknown ticker; an empty series yields an
    /// empty list.
    async fn get_recent_prices(
        &self,
        ticker: &str,
        months: usize,
    ) -> Result<Vec<PriceRow>, PlotterError>;
}
