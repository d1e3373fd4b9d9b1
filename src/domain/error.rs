//! Domain error types.

/// Top-level error type for stockplotter.
#[derive(Debug, thiserror::Error)]
pub enum PlotterError {
    #[error("invalid input: {reason}")]
    Validation { reason: String },

    #[error("no price data for {ticker}")]
    NotFound { ticker: String },

    #[error("insufficient data for {ticker}: no rows between {start} and {end}")]
    InsufficientData {
        ticker: String,
        start: String,
        end: String,
    },

    #[error("price store read for {ticker} timed out after {millis}ms")]
    Timeout { ticker: String, millis: u64 },

    #[error("unparseable {field} for {ticker} ({value:?}): {reason}")]
    DataParse {
        ticker: String,
        field: String,
        value: String,
        reason: String,
    },

    #[error("invalid page number {page} (total pages: {total_pages})")]
    InvalidPage { page: usize, total_pages: usize },

    #[error("projection for {ticker} failed: {source}")]
    Allocation {
        ticker: String,
        #[source]
        source: Box<PlotterError>,
    },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlotterError {
    pub fn validation(reason: impl Into<String>) -> Self {
        PlotterError::Validation {
            reason: reason.into(),
        }
    }

    pub fn not_found(ticker: impl Into<String>) -> Self {
        PlotterError::NotFound {
            ticker: ticker.into(),
        }
    }

    /// The innermost error, looking through `Allocation` wrappers.
    pub fn root(&self) -> &PlotterError {
        match self {
            PlotterError::Allocation { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<&PlotterError> for std::process::ExitCode {
    fn from(err: &PlotterError) -> Self {
        let code: u8 = match err.root() {
            PlotterError::Io(_) | PlotterError::Storage { .. } => 1,
            PlotterError::ConfigParse { .. }
            | PlotterError::ConfigMissing { .. }
            | PlotterError::ConfigInvalid { .. } => 2,
            PlotterError::Validation { .. } | PlotterError::InvalidPage { .. } => 3,
            PlotterError::NotFound { .. } | PlotterError::InsufficientData { .. } => 4,
            PlotterError::DataParse { .. } => 5,
            PlotterError::Timeout { .. } => 6,
            PlotterError::Allocation { .. } => 1,
        };
        std::process::ExitCode::from(code)
    }
}
