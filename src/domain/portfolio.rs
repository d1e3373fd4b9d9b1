//! Portfolio projections: a starting sum split across several tickers.

use crate::domain::error::PlotterError;
use crate::domain::projection::{InvestmentProjection, ProjectionConfig, project, validate_investment};
use crate::domain::ticker::validate_ticker;
use crate::ports::price_port::PricePort;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Allowed drift of the percentage sum away from 100.
pub const PERCENTAGE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAllocation {
    pub ticker: String,
    pub percentage: f64,
}

impl StockAllocation {
    pub fn new(ticker: impl Into<String>, percentage: f64) -> Self {
        Self {
            ticker: ticker.into(),
            percentage,
        }
    }

    pub fn amount_of(&self, total_investment: f64) -> f64 {
        total_investment * self.percentage / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub initial_investment: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub total_return_percentage: f64,
}

impl PortfolioSummary {
    pub fn from_projections(total_investment: f64, projections: &[InvestmentProjection]) -> Self {
        let final_value: f64 = projections.iter().map(|p| p.final_value).sum();
        let total_return: f64 = projections.iter().map(|p| p.total_return).sum();
        Self {
            initial_investment: total_investment,
            final_value,
            total_return,
            total_return_percentage: total_return / total_investment * 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioProjection {
    pub per_ticker: Vec<InvestmentProjection>,
    pub totals: PortfolioSummary,
}

pub fn validate_allocations(allocations: &[StockAllocation]) -> Result<(), PlotterError> {
    if allocations.is_empty() {
        return Err(PlotterError::validation("at least one allocation is required"));
    }

    let mut seen = HashSet::new();
    for a in allocations {
        validate_ticker(&a.ticker)?;
        if !seen.insert(a.ticker.as_str()) {
            return Err(PlotterError::validation(format!(
                "duplicate ticker: {}",
                a.ticker
            )));
        }
        if !a.percentage.is_finite() || a.percentage <= 0.0 {
            return Err(PlotterError::validation(format!(
                "allocation for {} must be a positive percentage, got {}",
                a.ticker, a.percentage
            )));
        }
    }

    let sum: f64 = allocations.iter().map(|a| a.percentage).sum();
    if (sum - 100.0).abs() > PERCENTAGE_TOLERANCE {
        return Err(PlotterError::validation(format!(
            "allocations must sum to 100%, got {sum}%"
        )));
    }
    Ok(())
}

/// Parses `TICKER:PERCENT` pairs separated by commas, e.g. `AAPL:60,MSFT:40`.
pub fn parse_allocations(input: &str) -> Result<Vec<StockAllocation>, PlotterError> {
    input
        .split(',')
        .map(|token| {
            let token = token.trim();
            let (ticker, pct) = token.split_once(':').ok_or_else(|| {
                PlotterError::validation(format!("expected TICKER:PERCENT, got {token:?}"))
            })?;
            let percentage: f64 = pct.trim().parse().map_err(|_| {
                PlotterError::validation(format!("invalid percentage in {token:?}"))
            })?;
            Ok(StockAllocation::new(ticker.trim(), percentage))
        })
        .collect()
}

/// Projects every allocation concurrently and folds them into totals.
///
/// Results keep the allocation order. The first failing ticker aborts the
/// whole batch.
pub async fn project_portfolio(
    store: &dyn PricePort,
    config: &ProjectionConfig,
    total_investment: f64,
    allocations: &[StockAllocation],
    duration_years: u32,
) -> Result<PortfolioProjection, PlotterError> {
    validate_investment(total_investment)?;
    config.validate_duration(duration_years)?;
    validate_allocations(allocations)?;

    let per_ticker = try_join_all(allocations.iter().map(|allocation| async move {
        let amount = allocation.amount_of(total_investment);
        project(store, config, &allocation.ticker, amount, duration_years)
            .await
            .map_err(|e| {
                tracing::warn!(ticker = %allocation.ticker, error = %e, "allocation projection failed");
                PlotterError::Allocation {
                    ticker: allocation.ticker.clone(),
                    source: Box::new(e),
                }
            })
    }))
    .await?;

    let totals = PortfolioSummary::from_projections(total_investment, &per_ticker);
    tracing::debug!(
        tickers = per_ticker.len(),
        final_value = totals.final_value,
        "portfolio projected"
    );
    Ok(PortfolioProjection { per_ticker, totals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn allocation_amount() {
        let a = StockAllocation::new("AAPL", 25.0);
        assert_relative_eq!(a.amount_of(10_000.0), 2_500.0);
    }

    #[test]
    fn allocations_must_sum_to_100() {
        let ok = vec![
            StockAllocation::new("AAPL", 60.0),
            StockAllocation::new("MSFT", 40.0),
        ];
        assert!(validate_allocations(&ok).is_ok());

        let short = vec![
            StockAllocation::new("AAPL", 60.0),
            StockAllocation::new("MSFT", 30.0),
        ];
        let err = validate_allocations(&short).unwrap_err();
        assert!(err.to_string().contains("sum to 100%"));
    }

    #[test]
    fn thirds_pass_within_tolerance() {
        let third = 100.0 / 3.0;
        let allocs = vec![
            StockAllocation::new("A", third),
            StockAllocation::new("B", third),
            StockAllocation::new("C", third),
        ];
        assert!(validate_allocations(&allocs).is_ok());
    }

    #[test]
    fn zero_and_duplicate_allocations_are_rejected() {
        let zero = vec![
            StockAllocation::new("AAPL", 100.0),
            StockAllocation::new("MSFT", 0.0),
        ];
        assert!(validate_allocations(&zero).is_err());

        let dup = vec![
            StockAllocation::new("AAPL", 50.0),
            StockAllocation::new("AAPL", 50.0),
        ];
        assert!(validate_allocations(&dup).is_err());
        assert!(validate_allocations(&[]).is_err());
    }

    #[test]
    fn parse_allocations_pairs() {
        let allocs = parse_allocations("AAPL:60, MSFT : 40").unwrap();
        assert_eq!(
            allocs,
            vec![
                StockAllocation::new("AAPL", 60.0),
                StockAllocation::new("MSFT", 40.0)
            ]
        );
    }

    #[test]
    fn parse_allocations_rejects_malformed() {
        assert!(parse_allocations("AAPL").is_err());
        assert!(parse_allocations("AAPL:lots").is_err());
    }

    #[test]
    fn summary_from_no_projections_is_flat_zero() {
        let s = PortfolioSummary::from_projections(1_000.0, &[]);
        assert_relative_eq!(s.final_value, 0.0);
        assert_relative_eq!(s.total_return, 0.0);
    }
}
