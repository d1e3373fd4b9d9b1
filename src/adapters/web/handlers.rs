//! HTTP request handlers for web adapter.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::domain::pagination::Page;
use crate::domain::portfolio::{PortfolioProjection, StockAllocation, project_portfolio};
use crate::domain::projection::{InvestmentProjection, project};
use crate::domain::summary::{PriceSummary, TickerSummary, compare, price_summary, resolve_months};
use crate::domain::ticker::parse_tickers;

use super::{AppState, WebError};

pub async fn index() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Stock Plotter API!" }))
}

pub async fn not_found() -> WebError {
    WebError::not_found("Not found")
}

#[derive(Debug, Serialize)]
pub struct StockList {
    pub stocks: Vec<String>,
}

pub async fn list_stocks(State(state): State<Arc<AppState>>) -> Result<Json<StockList>, WebError> {
    let stocks = state.store.list_tickers().await.map_err(|e| {
        tracing::error!(error = %e, "failed to list tickers");
        WebError::internal("Unable to read processed directory")
    })?;
    Ok(Json(StockList { stocks }))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// The integer at the start of `raw`, ignoring whatever follows it:
/// `"3.7"` and `"3abc"` both read as 3.
fn leading_int(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let n: i64 = rest[..end].parse().ok()?;
    Some(if negative { -n } else { n })
}

/// Missing, unparseable or zero page numbers fall back to page 1.
fn resolve_page(raw: Option<&str>) -> Result<usize, WebError> {
    match raw.and_then(leading_int) {
        Some(n) if n < 0 => Err(WebError::bad_request("Invalid page number")),
        Some(n) if n > 0 => Ok(n as usize),
        _ => Ok(1),
    }
}

pub async fn stock_page(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page>, WebError> {
    let page = resolve_page(query.page.as_deref())?;
    let result = state.store.get_page(&ticker, page, state.page_size).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricesQuery {
    pub duration_months: Option<String>,
}

fn parse_months(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|m| m.is_finite())
        .map(|m| m.floor() as i64)
}

pub async fn stock_prices(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<PricesQuery>,
) -> Result<Json<PriceSummary>, WebError> {
    let months = resolve_months(
        parse_months(query.duration_months.as_deref()),
        state.projection.default_history_months,
    );
    let summary = price_summary(state.store.as_ref(), &ticker, months).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareQuery {
    pub tickers: Option<String>,
    pub duration_months: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Comparison {
    pub summaries: Vec<TickerSummary>,
}

pub async fn compare_stocks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<Comparison>, WebError> {
    let raw = query
        .tickers
        .as_deref()
        .ok_or_else(|| WebError::bad_request("Missing tickers parameter"))?;
    let tickers = parse_tickers(raw)?;
    let months = resolve_months(
        parse_months(query.duration_months.as_deref()),
        state.projection.default_history_months,
    );
    let summaries = compare(state.store.as_ref(), &tickers, months).await?;
    Ok(Json(Comparison { summaries }))
}

#[derive(Debug, Deserialize)]
pub struct ProjectionQuery {
    pub investment: Option<String>,
    pub duration: Option<String>,
}

fn required<T: std::str::FromStr>(raw: Option<&str>, name: &str) -> Result<T, WebError> {
    let raw = raw.ok_or_else(|| WebError::bad_request(format!("Missing {name} parameter")))?;
    raw.trim()
        .parse()
        .map_err(|_| WebError::bad_request(format!("Invalid {name}: {raw:?}")))
}

pub async fn stock_projection(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<ProjectionQuery>,
) -> Result<Json<InvestmentProjection>, WebError> {
    let investment: f64 = required(query.investment.as_deref(), "investment")?;
    let duration: u32 = required(query.duration.as_deref(), "duration")?;
    let projection = project(
        state.store.as_ref(),
        &state.projection,
        &ticker,
        investment,
        duration,
    )
    .await?;
    Ok(Json(projection))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRequest {
    pub total_investment: f64,
    pub duration: u32,
    pub allocations: Vec<StockAllocation>,
}

pub async fn portfolio_projection(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PortfolioRequest>, JsonRejection>,
) -> Result<Json<PortfolioProjection>, WebError> {
    let Json(request) = body.map_err(|e| WebError::bad_request(e.body_text()))?;
    let result = project_portfolio(
        state.store.as_ref(),
        &state.projection,
        request.total_investment,
        &request.allocations,
        request.duration,
    )
    .await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_page_defaults_to_first() {
        assert_eq!(resolve_page(None).unwrap(), 1);
        assert_eq!(resolve_page(Some("abc")).unwrap(), 1);
        assert_eq!(resolve_page(Some("0")).unwrap(), 1);
        assert_eq!(resolve_page(Some("3")).unwrap(), 3);
        assert!(resolve_page(Some("-2")).is_err());
    }

    #[test]
    fn resolve_page_reads_the_leading_integer() {
        assert_eq!(resolve_page(Some("3.7")).unwrap(), 3);
        assert_eq!(resolve_page(Some("2abc")).unwrap(), 2);
        assert_eq!(resolve_page(Some(" 4")).unwrap(), 4);
        assert_eq!(resolve_page(Some("+5")).unwrap(), 5);
        assert_eq!(resolve_page(Some(".5")).unwrap(), 1);
        assert!(resolve_page(Some("-1x")).is_err());
    }

    #[test]
    fn parse_months_floors_fractions() {
        assert_eq!(parse_months(Some("12.7")), Some(12));
        assert_eq!(parse_months(Some("x")), None);
        assert_eq!(parse_months(None), None);
    }

    #[test]
    fn required_reports_missing_and_invalid() {
        let missing = required::<f64>(None, "investment").unwrap_err();
        assert_eq!(missing.message, "Missing investment parameter");
        let invalid = required::<u32>(Some("two"), "duration").unwrap_err();
        assert!(invalid.message.starts_with("Invalid duration"));
    }
}
