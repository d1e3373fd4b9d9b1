//! Pipe-delimited CSV price store.
//!
//! One `<TICKER>.csv` file per ticker in a single directory. The first line
//! is the header; the date column is `Date` (or the first column when there
//! is no such header) and the close price lives in `Close`.

use crate::domain::error::PlotterError;
use crate::domain::pagination::{Page, Record, paginate};
use crate::domain::price::{PriceRow, parse_date};
use crate::domain::raw_import::{Conversion, convert_raw};
use crate::domain::ticker::validate_ticker;
use crate::ports::price_port::PricePort;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct CsvPriceStore {
    base_path: PathBuf,
}

/// A parsed price file with rows sorted newest first.
#[derive(Debug, Clone)]
pub struct PriceTable {
    pub headers: Vec<String>,
    pub rows: Vec<csv::StringRecord>,
    date_idx: usize,
}

impl PriceTable {
    pub fn parse(content: &str) -> Result<Self, PlotterError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.trim().as_bytes());

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| PlotterError::Storage {
                reason: format!("CSV header error: {}", e),
            })?
            .iter()
            .map(String::from)
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| PlotterError::Storage {
                reason: format!("CSV parse error: {}", e),
            })?;
            rows.push(record);
        }

        let date_idx = column(&headers, "Date").unwrap_or(0);
        rows.sort_by_cached_key(|r| {
            let raw = r.get(date_idx).unwrap_or("");
            Reverse((parse_date(raw), raw.to_string()))
        });

        Ok(Self {
            headers,
            rows,
            date_idx,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (h.clone(), row.get(i).unwrap_or("").to_string()))
                    .collect()
            })
            .collect()
    }

    /// The newest `limit` rows as date/close pairs.
    pub fn recent(&self, limit: usize) -> Result<Vec<PriceRow>, PlotterError> {
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }
        let close_idx = column(&self.headers, "Close").ok_or_else(|| PlotterError::Storage {
            reason: "missing Close column".into(),
        })?;
        Ok(self
            .rows
            .iter()
            .take(limit)
            .map(|r| {
                PriceRow::new(
                    r.get(self.date_idx).unwrap_or(""),
                    r.get(close_idx).unwrap_or(""),
                )
            })
            .collect())
    }
}

fn column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

impl CsvPriceStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    async fn read_table(&self, ticker: &str) -> Result<PriceTable, PlotterError> {
        validate_ticker(ticker)?;
        let path = self.csv_path(ticker);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PlotterError::not_found(ticker)
            } else {
                PlotterError::Storage {
                    reason: format!("failed to read {}: {}", path.display(), e),
                }
            }
        })?;
        let table = PriceTable::parse(&content)?;
        tracing::debug!(ticker, rows = table.len(), "read price file");
        Ok(table)
    }

    /// Converts every `*.raw` file in `raw_dir` into `<stem>.csv` in the
    /// store directory. Empty raw files are left alone.
    pub fn import_raw_dir(&self, raw_dir: &Path) -> Result<Vec<(String, Conversion)>, PlotterError> {
        let entries = fs::read_dir(raw_dir).map_err(|e| PlotterError::Storage {
            reason: format!("failed to read directory {}: {}", raw_dir.display(), e),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PlotterError::Storage {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "raw") {
                paths.push(path);
            }
        }
        paths.sort();

        fs::create_dir_all(&self.base_path)?;
        let mut converted = Vec::new();
        for path in paths {
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let raw = fs::read_to_string(&path)?;
            let Some(conversion) = convert_raw(&raw) else {
                continue;
            };
            fs::write(self.csv_path(&stem), &conversion.content)?;
            tracing::info!(
                file = %path.display(),
                rows = conversion.rows,
                skipped = conversion.skipped,
                "converted raw price file"
            );
            converted.push((stem, conversion));
        }
        Ok(converted)
    }
}

#[async_trait]
impl PricePort for CsvPriceStore {
    async fn list_tickers(&self) -> Result<Vec<String>, PlotterError> {
        let mut entries = tokio::fs::read_dir(&self.base_path).await.map_err(|e| {
            PlotterError::Storage {
                reason: format!(
                    "failed to read directory {}: {}",
                    self.base_path.display(),
                    e
                ),
            }
        })?;

        let mut tickers = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| PlotterError::Storage {
            reason: format!("directory entry error: {}", e),
        })? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    async fn get_page(
        &self,
        ticker: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Page, PlotterError> {
        let table = self.read_table(ticker).await?;
        paginate(table.records(), page, page_size)
    }

    async fn get_recent_prices(
        &self,
        ticker: &str,
        months: usize,
    ) -> Result<Vec<PriceRow>, PlotterError> {
        self.read_table(ticker).await?.recent(months)
    }
}
