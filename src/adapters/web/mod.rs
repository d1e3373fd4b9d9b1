//! Web server adapter.
//!
//! Axum JSON API over the price store and the analytics in [`crate::domain`].
//! Every request reads fresh data; nothing is cached between requests.

mod error;
mod handlers;

pub use error::{WebError, status_from_error};
pub use handlers::*;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::domain::pagination::DEFAULT_PAGE_SIZE;
use crate::domain::projection::ProjectionConfig;
use crate::ports::price_port::PricePort;

pub struct AppState {
    pub store: Arc<dyn PricePort>,
    pub projection: ProjectionConfig,
    pub page_size: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn PricePort>) -> Self {
        Self {
            store,
            projection: ProjectionConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Only the listed origins get CORS headers; requests without an `Origin`
/// header are served as usual.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Logs one line per request at INFO: method, URI, status and latency.
pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/stocks", get(handlers::list_stocks))
        .route("/stocks/compare", get(handlers::compare_stocks))
        .route("/stocks/{ticker}", get(handlers::stock_page))
        .route("/stocks/{ticker}/prices", get(handlers::stock_prices))
        .route("/stocks/{ticker}/projection", get(handlers::stock_projection))
        .route("/portfolio/projection", post(handlers::portfolio_projection))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer())
                .layer(cors_layer(allowed_origins)),
        )
        .with_state(Arc::new(state))
}
