//! CLI integration tests for config loading and command orchestration.
//!
//! Tests cover:
//! - Projection config parsing and defaults (build_projection_config)
//! - Store and service wiring from INI files (build_store, build_services)
//! - Raw-to-processed conversion on disk
//! - End-to-end projections through the CSV store on a temp directory

use approx::assert_relative_eq;
use std::fs;
use std::io::Write;
use std::time::Duration;
use stockplotter::adapters::csv_adapter::CsvPriceStore;
use stockplotter::adapters::file_config_adapter::FileConfigAdapter;
use stockplotter::cli;
use stockplotter::domain::error::PlotterError;
use stockplotter::domain::portfolio::{parse_allocations, project_portfolio};
use stockplotter::domain::projection::{ProjectionConfig, project};
use stockplotter::ports::price_port::PricePort;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn ini_for(dir: &std::path::Path, extra: &str) -> String {
    format!(
        "[data]\nprocessed_dir = {}\nraw_dir = {}\n{extra}",
        dir.join("processed").display(),
        dir.join("raw").display()
    )
}

const AAPL_CSV: &str = "Date|Open|Close\n\
2024-01-01|99|100\n\
2024-12-01|149|150\n\
2024-06-01|119|120\n";

const MSFT_CSV: &str = "Date|Close\n\
2024-01-01|300\n\
2024-12-01|330\n";

mod config_loading {
    use super::*;

    #[test]
    fn projection_defaults_when_section_missing() {
        let adapter = FileConfigAdapter::from_string("[data]\nprocessed_dir = x\n").unwrap();
        let config = cli::build_projection_config(&adapter).unwrap();
        assert_eq!(config, ProjectionConfig::default());
    }

    #[test]
    fn projection_values_are_read() {
        let adapter = FileConfigAdapter::from_string(
            "[projection]\nallowed_durations = 2, 10\nmonths_per_year = 12\nhistory_padding_months = 3\ndefault_history_months = 24\n",
        )
        .unwrap();
        let config = cli::build_projection_config(&adapter).unwrap();
        assert_eq!(config.allowed_durations, vec![2, 10]);
        assert_eq!(config.history_padding_months, 3);
        assert_eq!(config.default_history_months, 24);
        assert_eq!(config.history_months(2).unwrap(), 27);
    }

    #[test]
    fn bad_duration_list_is_config_invalid() {
        let adapter =
            FileConfigAdapter::from_string("[projection]\nallowed_durations = 1,two\n").unwrap();
        let err = cli::build_projection_config(&adapter).unwrap_err();
        assert!(matches!(err, PlotterError::ConfigInvalid { key, .. } if key == "allowed_durations"));
    }

    #[test]
    fn out_of_range_counts_are_config_invalid() {
        for key in ["months_per_year", "history_padding_months", "default_history_months"] {
            let ini = format!("[projection]\n{key} = 4294967296\n");
            let adapter = FileConfigAdapter::from_string(&ini).unwrap();
            let err = cli::build_projection_config(&adapter).unwrap_err();
            assert!(matches!(err, PlotterError::ConfigInvalid { key: k, .. } if k == key));
        }
    }

    #[test]
    fn oversized_duration_is_config_invalid() {
        let adapter =
            FileConfigAdapter::from_string("[projection]\nallowed_durations = 400000000\n")
                .unwrap();
        let err = cli::build_projection_config(&adapter).unwrap_err();
        assert!(matches!(err, PlotterError::ConfigInvalid { key, .. } if key == "allowed_durations"));
    }

    #[test]
    fn oversized_page_size_is_config_invalid() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nprocessed_dir = /tmp/prices\npage_size = 4294967296\n",
        )
        .unwrap();
        assert!(matches!(
            cli::build_services(&adapter).err().unwrap(),
            PlotterError::ConfigInvalid { .. }
        ));
    }

    #[test]
    fn store_requires_processed_dir() {
        let adapter = FileConfigAdapter::from_string("[data]\npage_size = 10\n").unwrap();
        let err = cli::build_store(&adapter).err().unwrap();
        assert!(matches!(err, PlotterError::ConfigMissing { key, .. } if key == "processed_dir"));
    }

    #[test]
    fn services_pick_up_page_size() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nprocessed_dir = /tmp/prices\npage_size = 10\nread_timeout_ms = 250\n",
        )
        .unwrap();
        let services = cli::build_services(&adapter).unwrap();
        assert_eq!(services.page_size, 10);
        assert_eq!(services.projection, ProjectionConfig::default());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let adapter =
            FileConfigAdapter::from_string("[data]\nprocessed_dir = x\nread_timeout_ms = 0\n")
                .unwrap();
        assert!(matches!(
            cli::build_store(&adapter).err().unwrap(),
            PlotterError::ConfigInvalid { .. }
        ));
    }

    #[test]
    fn load_config_from_disk() {
        let file = write_temp_ini("[data]\nprocessed_dir = data/processed\n");
        let adapter = cli::load_config(&file.path().to_path_buf()).unwrap();
        assert!(cli::build_store(&adapter).is_ok());
    }

    #[test]
    fn load_config_missing_file() {
        assert!(cli::load_config(&"/definitely/not/here.ini".into()).is_err());
    }
}

mod convert_tests {
    use super::*;

    #[test]
    fn converts_every_raw_file() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        fs::create_dir_all(&raw).unwrap();
        fs::write(
            raw.join("AAPL.raw"),
            "Date\tOpen\tClose\nJul 2025\t200\t210\nAug 2025\t210\nSep 2025\t215\t220\n",
        )
        .unwrap();
        fs::write(raw.join("EMPTY.raw"), "").unwrap();
        fs::write(raw.join("notes.txt"), "ignore me").unwrap();

        let store = CsvPriceStore::new(dir.path().join("processed"));
        let converted = store.import_raw_dir(&raw).unwrap();

        assert_eq!(converted.len(), 1);
        let (ticker, conversion) = &converted[0];
        assert_eq!(ticker, "AAPL");
        assert_eq!(conversion.rows, 2);
        assert_eq!(conversion.skipped, 1);

        let written = fs::read_to_string(dir.path().join("processed/AAPL.csv")).unwrap();
        assert_eq!(
            written,
            "Date|Open|Close\n2025-07-01|200|210\n2025-09-01|215|220"
        );
    }

    #[test]
    fn missing_raw_dir_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvPriceStore::new(dir.path().join("processed"));
        let err = store.import_raw_dir(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PlotterError::Storage { .. }));
    }
}

mod pipeline_tests {
    use super::*;

    fn processed_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let processed = dir.path().join("processed");
        fs::create_dir_all(&processed).unwrap();
        fs::write(processed.join("AAPL.csv"), AAPL_CSV).unwrap();
        fs::write(processed.join("MSFT.csv"), MSFT_CSV).unwrap();
        dir
    }

    #[tokio::test]
    async fn project_through_csv_store() {
        let dir = processed_dir();
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path(), "")).unwrap();
        let services = cli::build_services(&adapter).unwrap();

        let p = project(services.store.as_ref(), &services.projection, "AAPL", 10_000.0, 1)
            .await
            .unwrap();
        assert_eq!(p.steps.len(), 3);
        assert_relative_eq!(p.final_value, 15_000.0);
        assert_relative_eq!(p.total_return_percentage, 50.0);
    }

    #[tokio::test]
    async fn portfolio_through_csv_store() {
        let dir = processed_dir();
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path(), "")).unwrap();
        let services = cli::build_services(&adapter).unwrap();
        let allocations = parse_allocations("AAPL:50, MSFT:50").unwrap();

        let result = project_portfolio(
            services.store.as_ref(),
            &services.projection,
            10_000.0,
            &allocations,
            1,
        )
        .await
        .unwrap();
        assert_relative_eq!(result.totals.final_value, 13_000.0, epsilon = 1e-6);
    }

    #[tokio::test]
    async fn lists_and_pages_through_csv_store() {
        let dir = processed_dir();
        let adapter =
            FileConfigAdapter::from_string(&ini_for(dir.path(), "page_size = 2\n")).unwrap();
        let services = cli::build_services(&adapter).unwrap();

        let tickers = services.store.list_tickers().await.unwrap();
        assert_eq!(tickers, ["AAPL", "MSFT"]);

        let page = services.store.get_page("AAPL", 1, services.page_size).await.unwrap();
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data[0]["Date"], "2024-12-01");
        assert_eq!(page.data[1]["Date"], "2024-06-01");
    }

    #[tokio::test]
    async fn missing_ticker_file_is_not_found() {
        let dir = processed_dir();
        let adapter = FileConfigAdapter::from_string(&ini_for(dir.path(), "")).unwrap();
        let services = cli::build_services(&adapter).unwrap();
        let err = services
            .store
            .get_recent_prices("GOOG", 12)
            .await
            .unwrap_err();
        assert!(matches!(err, PlotterError::NotFound { .. }));
    }

    #[tokio::test]
    async fn store_timeout_comes_from_config() {
        let dir = processed_dir();
        let adapter =
            FileConfigAdapter::from_string(&ini_for(dir.path(), "read_timeout_ms = 1500\n"))
                .unwrap();
        let store = cli::build_store(&adapter).unwrap();
        assert_eq!(store.timeout(), Duration::from_millis(1500));
    }
}
