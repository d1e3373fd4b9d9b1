//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvPriceStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::timeout_adapter::{DEFAULT_READ_TIMEOUT, TimeoutPriceStore};
use crate::domain::config_validation::{
    validate_data_config, validate_projection_config, validate_server_config,
};
use crate::domain::error::PlotterError;
use crate::domain::format::{format_currency, format_percentage};
use crate::domain::pagination::DEFAULT_PAGE_SIZE;
use crate::domain::portfolio::{PortfolioProjection, parse_allocations, project_portfolio};
use crate::domain::projection::{InvestmentProjection, ProjectionConfig, project};
use crate::domain::summary::{PriceSummary, compare, price_summary, resolve_months};
use crate::domain::ticker::parse_tickers;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(
    name = "stockplotter",
    about = "Historical stock prices, summaries and buy-and-hold projections"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List available tickers
    Tickers {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print one page of a ticker's price table
    Page {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Summarise recent price movement for a ticker
    Summary {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        months: Option<i64>,
    },
    /// Compare recent price movement across up to five tickers
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated, e.g. AAPL,MSFT
        #[arg(long)]
        tickers: String,
        #[arg(long)]
        months: Option<i64>,
    },
    /// Project a buy-and-hold investment in one ticker
    Project {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        years: u32,
    },
    /// Project a starting sum split across several tickers
    Portfolio {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        amount: f64,
        /// TICKER:PERCENT pairs, e.g. AAPL:60,MSFT:40
        #[arg(long)]
        allocations: String,
        #[arg(long)]
        years: u32,
    },
    /// Convert raw exports into processed price files
    Convert {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything a command needs to read prices and run projections.
pub struct Services {
    pub store: Arc<dyn PricePort>,
    pub projection: ProjectionConfig,
    pub page_size: usize,
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing();
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Tickers { config } => run_tickers(&config),
        Command::Page {
            config,
            ticker,
            page,
        } => run_page(&config, &ticker, page),
        Command::Summary {
            config,
            ticker,
            months,
        } => run_summary(&config, &ticker, months),
        Command::Compare {
            config,
            tickers,
            months,
        } => run_compare(&config, &tickers, months),
        Command::Project {
            config,
            ticker,
            amount,
            years,
        } => run_project(&config, &ticker, amount, years),
        Command::Portfolio {
            config,
            amount,
            allocations,
            years,
        } => run_portfolio(&config, amount, &allocations, years),
        Command::Convert { config } => run_convert(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| report(&e))
}

fn report(err: &PlotterError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn build_projection_config(adapter: &dyn ConfigPort) -> Result<ProjectionConfig, PlotterError> {
    validate_projection_config(adapter)?;
    let defaults = ProjectionConfig::default();

    let allowed_durations = match adapter.get_list("projection", "allowed_durations") {
        Some(items) => items
            .iter()
            .map(|s| {
                s.parse::<u32>().map_err(|_| PlotterError::ConfigInvalid {
                    section: "projection".into(),
                    key: "allowed_durations".into(),
                    reason: format!("{s:?} is not a number of years"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => defaults.allowed_durations,
    };

    Ok(ProjectionConfig {
        allowed_durations,
        months_per_year: config_u32(
            adapter,
            "projection",
            "months_per_year",
            defaults.months_per_year,
        )?,
        history_padding_months: config_u32(
            adapter,
            "projection",
            "history_padding_months",
            defaults.history_padding_months,
        )?,
        default_history_months: config_u32(
            adapter,
            "projection",
            "default_history_months",
            defaults.default_history_months as u32,
        )? as usize,
    })
}

/// Reads an integer key that must fit a `u32`, rejecting rather than
/// truncating out-of-range values.
fn config_u32(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: u32,
) -> Result<u32, PlotterError> {
    let raw = adapter.get_int(section, key, i64::from(default));
    u32::try_from(raw).map_err(|_| PlotterError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: format!("{raw} is out of range"),
    })
}

pub fn build_store(adapter: &dyn ConfigPort) -> Result<TimeoutPriceStore<CsvPriceStore>, PlotterError> {
    validate_data_config(adapter)?;
    let dir = adapter
        .get_string("data", "processed_dir")
        .ok_or_else(|| PlotterError::ConfigMissing {
            section: "data".into(),
            key: "processed_dir".into(),
        })?;
    let timeout_ms = config_u32(
        adapter,
        "data",
        "read_timeout_ms",
        DEFAULT_READ_TIMEOUT.as_millis() as u32,
    )?;
    Ok(TimeoutPriceStore::new(
        CsvPriceStore::new(PathBuf::from(dir.trim())),
        Duration::from_millis(u64::from(timeout_ms)),
    ))
}

pub fn build_services(adapter: &dyn ConfigPort) -> Result<Services, PlotterError> {
    let store = build_store(adapter)?;
    Ok(Services {
        store: Arc::new(store),
        projection: build_projection_config(adapter)?,
        page_size: config_u32(adapter, "data", "page_size", DEFAULT_PAGE_SIZE as u32)? as usize,
    })
}

fn prepare(config_path: &PathBuf) -> Result<Services, ExitCode> {
    let adapter = load_config(config_path)?;
    build_services(&adapter).map_err(|e| report(&e))
}

fn block_on<F: Future>(future: F) -> Result<F::Output, ExitCode> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| {
        eprintln!("error: failed to start async runtime: {e}");
        ExitCode::from(1)
    })?;
    Ok(runtime.block_on(future))
}

/// Prepares services, runs one async command and reports its error, if any.
fn execute<T, F, Fut>(config_path: &PathBuf, command: F, print: impl FnOnce(T)) -> ExitCode
where
    F: FnOnce(Arc<Services>) -> Fut,
    Fut: Future<Output = Result<T, PlotterError>>,
{
    let services = match prepare(config_path) {
        Ok(s) => Arc::new(s),
        Err(code) => return code,
    };
    match block_on(command(services)) {
        Ok(Ok(value)) => {
            print(value);
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => report(&e),
        Err(code) => code,
    }
}

fn run_tickers(config_path: &PathBuf) -> ExitCode {
    execute(
        config_path,
        |s| async move { s.store.list_tickers().await },
        |tickers| {
            for ticker in &tickers {
                println!("{ticker}");
            }
            eprintln!("{} tickers found", tickers.len());
        },
    )
}

fn run_page(config_path: &PathBuf, ticker: &str, page: usize) -> ExitCode {
    execute(
        config_path,
        |s| async move { s.store.get_page(ticker, page, s.page_size).await },
        |result| {
            println!(
                "{} page {}/{} ({} rows)",
                ticker, result.page, result.total_pages, result.total_items
            );
            for record in &result.data {
                let cells: Vec<String> = record.iter().map(|(k, v)| format!("{k}={v}")).collect();
                println!("  {}", cells.join("  "));
            }
        },
    )
}

fn print_summary(ticker: &str, summary: &PriceSummary) {
    match (summary.start_date, summary.end_date) {
        (Some(start), Some(end)) => println!(
            "{:<8} {} -> {}  {} -> {}  {}",
            ticker,
            start,
            end,
            summary.start_price.map(format_currency).unwrap_or_else(|| "-".into()),
            summary.end_price.map(format_currency).unwrap_or_else(|| "-".into()),
            summary
                .change_percentage
                .map(format_percentage)
                .unwrap_or_else(|| "-".into()),
        ),
        _ => println!("{:<8} no prices", ticker),
    }
}

fn run_summary(config_path: &PathBuf, ticker: &str, months: Option<i64>) -> ExitCode {
    execute(
        config_path,
        |s| async move {
            let months = resolve_months(months, s.projection.default_history_months);
            price_summary(s.store.as_ref(), ticker, months).await
        },
        |summary| print_summary(ticker, &summary),
    )
}

fn run_compare(config_path: &PathBuf, tickers: &str, months: Option<i64>) -> ExitCode {
    let tickers = match parse_tickers(tickers) {
        Ok(t) => t,
        Err(e) => return report(&e),
    };
    execute(
        config_path,
        |s| async move {
            let months = resolve_months(months, s.projection.default_history_months);
            compare(s.store.as_ref(), &tickers, months).await
        },
        |summaries| {
            for entry in &summaries {
                print_summary(&entry.ticker, &entry.summary);
            }
        },
    )
}

pub fn print_projection(projection: &InvestmentProjection) {
    println!(
        "{}: {} for {} year(s), {} to {}",
        projection.ticker,
        format_currency(projection.initial_investment),
        projection.duration,
        projection.start_date,
        projection.end_date
    );
    println!(
        "  final value {}  return {} ({})",
        format_currency(projection.final_value),
        format_currency(projection.total_return),
        format_percentage(projection.total_return_percentage)
    );
    println!(
        "  {:<12} {:>12} {:>12} {:>14} {:>14} {:>9}",
        "date", "price", "shares", "value", "return", "return %"
    );
    for step in &projection.steps {
        println!(
            "  {:<12} {:>12.2} {:>12.4} {:>14} {:>14} {:>9}",
            step.date.to_string(),
            step.stock_price,
            step.shares_owned,
            format_currency(step.investment_value),
            format_currency(step.total_return),
            format_percentage(step.return_percentage)
        );
    }
}

fn run_project(config_path: &PathBuf, ticker: &str, amount: f64, years: u32) -> ExitCode {
    execute(
        config_path,
        |s| async move { project(s.store.as_ref(), &s.projection, ticker, amount, years).await },
        |projection| print_projection(&projection),
    )
}

pub fn print_portfolio(result: &PortfolioProjection) {
    for projection in &result.per_ticker {
        print_projection(projection);
        println!();
    }
    let totals = &result.totals;
    println!("=== Portfolio Summary ===");
    println!("Initial Investment: {}", format_currency(totals.initial_investment));
    println!("Final Value:        {}", format_currency(totals.final_value));
    println!("Total Return:       {}", format_currency(totals.total_return));
    println!("Return %:           {}", format_percentage(totals.total_return_percentage));
}

fn run_portfolio(config_path: &PathBuf, amount: f64, allocations: &str, years: u32) -> ExitCode {
    let allocations = match parse_allocations(allocations) {
        Ok(a) => a,
        Err(e) => return report(&e),
    };
    execute(
        config_path,
        |s| async move {
            project_portfolio(s.store.as_ref(), &s.projection, amount, &allocations, years).await
        },
        |result| print_portfolio(&result),
    )
}

fn run_convert(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let store = match build_store(&adapter) {
        Ok(s) => s,
        Err(e) => return report(&e),
    };
    let Some(raw_dir) = adapter.get_string("data", "raw_dir") else {
        return report(&PlotterError::ConfigMissing {
            section: "data".into(),
            key: "raw_dir".into(),
        });
    };

    match store.inner().import_raw_dir(&PathBuf::from(raw_dir.trim())) {
        Ok(converted) => {
            for (ticker, conversion) in &converted {
                println!(
                    "Converted {ticker}.raw -> {ticker}.csv ({} rows, {} skipped)",
                    conversion.rows, conversion.skipped
                );
            }
            eprintln!("{} files converted", converted.len());
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    eprintln!("Validating config: {}", adapter.origin());
    let checks: [(&str, fn(&dyn ConfigPort) -> Result<(), PlotterError>); 3] = [
        ("data", validate_data_config),
        ("server", validate_server_config),
        ("projection", validate_projection_config),
    ];
    for (section, check) in checks {
        if let Err(e) = check(&adapter) {
            eprintln!("  [{section}] invalid");
            return report(&e);
        }
        eprintln!("  [{section}] ok");
    }
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::net::SocketAddr;

        let adapter = match load_config(config_path) {
            Ok(a) => a,
            Err(code) => return code,
        };
        if let Err(e) = validate_server_config(&adapter) {
            return report(&e);
        }
        let services = match build_services(&adapter) {
            Ok(s) => s,
            Err(e) => return report(&e),
        };

        let listen = adapter
            .get_string("server", "listen")
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let addr: SocketAddr = match listen.trim().parse() {
            Ok(a) => a,
            Err(_) => {
                return report(&PlotterError::ConfigInvalid {
                    section: "server".into(),
                    key: "listen".into(),
                    reason: format!("{listen:?} is not a socket address"),
                });
            }
        };
        let allowed_origins = adapter
            .get_list("server", "allowed_origins")
            .unwrap_or_default();

        let state = AppState {
            store: services.store,
            projection: services.projection,
            page_size: services.page_size,
        };
        let router = build_router(state, &allowed_origins);

        let served = block_on(async move {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, origins = ?allowed_origins, "web server listening");
            axum::serve(listener, router).await
        });
        match served {
            Ok(Ok(())) => ExitCode::SUCCESS,
            Ok(Err(e)) => report(&PlotterError::Io(e)),
            Err(code) => code,
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
