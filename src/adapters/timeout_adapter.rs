//! Per-read timeout around any price store.

use crate::domain::error::PlotterError;
use crate::domain::pagination::Page;
use crate::domain::price::PriceRow;
use crate::ports::price_port::PricePort;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(5000);

pub struct TimeoutPriceStore<P> {
    inner: P,
    timeout: Duration,
}

impl<P: PricePort> TimeoutPriceStore<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        label: &str,
        read: impl Future<Output = Result<T, PlotterError>>,
    ) -> Result<T, PlotterError> {
        match tokio::time::timeout(self.timeout, read).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    ticker = label,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "price store read timed out"
                );
                Err(PlotterError::Timeout {
                    ticker: label.to_string(),
                    millis: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[async_trait]
impl<P: PricePort> PricePort for TimeoutPriceStore<P> {
    async fn list_tickers(&self) -> Result<Vec<String>, PlotterError> {
        self.bounded("*", self.inner.list_tickers()).await
    }

    async fn get_page(
        &self,
        ticker: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page, PlotterError> {
        self.bounded(ticker, self.inner.get_page(ticker, page, page_size))
            .await
    }

    async fn get_recent_prices(
        &self,
        ticker: &str,
        months: usize,
    ) -> Result<Vec<PriceRow>, PlotterError> {
        self.bounded(ticker, self.inner.get_recent_prices(ticker, months))
            .await
    }
}
