//! # Journal CSV Importer
//!
//! Reads broker trade exports (NinjaTrader's trade list and simpler generic layouts)
//! and maps them onto `NewTrade` rows ready for the record store.
//!
//! Rows that cannot be mapped are reported back as `SkippedRow`s instead of
//! aborting the whole file.

pub mod columns;
pub mod error;
pub mod values;

pub use columns::{ActionColumn, ColumnMap};
pub use error::ImportError;

use core_types::{NewTrade, normalize_action, validate_trade};
use csv::StringRecord;
use std::io;
use std::path::Path;

/// A row that was left out of the import, with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

/// The outcome of reading one export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportBatch {
    pub trades: Vec<NewTrade>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Default)]
pub struct CsvImporter {}

impl CsvImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that `path` exists and has a `.csv` extension.
    pub fn validate_path(&self, path: &Path) -> Result<(), ImportError> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(ImportError::NotCsv(path.display().to_string()));
        }
        Ok(())
    }

    pub fn read_path(&self, path: &Path) -> Result<ImportBatch, ImportError> {
        self.validate_path(path)?;
        let file = std::fs::File::open(path)?;
        let batch = self.read(file)?;
        tracing::info!(
            path = %path.display(),
            trades = batch.trades.len(),
            skipped = batch.skipped.len(),
            "Read trade export."
        );
        Ok(batch)
    }

    /// Reads an export from any reader. Header problems fail the whole read.
    pub fn read<R: io::Read>(&self, reader: R) -> Result<ImportBatch, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = ColumnMap::from_headers(csv_reader.headers()?)?;
        let mut batch = ImportBatch::default();

        for record in csv_reader.records() {
            // Undecodable rows are skipped like any other bad row; only I/O ends the read.
            let record = match record {
                Ok(record) => record,
                Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
                Err(err) => {
                    let line = err.position().map_or(0, |p| p.line());
                    let reason = err.to_string();
                    tracing::warn!(line, reason = %reason, "Skipping CSV row.");
                    batch.skipped.push(SkippedRow { line, reason });
                    continue;
                }
            };
            let line = record.position().map_or(0, |p| p.line());

            match map_row(&columns, &record) {
                Ok(trade) => batch.trades.push(trade),
                Err(reason) => {
                    tracing::warn!(line, reason = %reason, "Skipping CSV row.");
                    batch.skipped.push(SkippedRow { line, reason });
                }
            }
        }

        Ok(batch)
    }
}

fn map_row(columns: &ColumnMap, record: &StringRecord) -> Result<NewTrade, String> {
    let cell = |index: usize| record.get(index).unwrap_or("");
    let optional = |index: Option<usize>| index.map(cell).unwrap_or("");

    let raw_timestamp = cell(columns.timestamp);
    let (date, time) = values::split_timestamp(raw_timestamp)
        .ok_or_else(|| format!("unrecognised timestamp '{raw_timestamp}'"))?;

    let raw_quantity = cell(columns.quantity);
    let quantity = values::parse_count(raw_quantity)
        .ok_or_else(|| format!("invalid quantity '{raw_quantity}'"))?;

    let raw_price = cell(columns.price);
    let price = values::parse_money(raw_price)
        .ok_or_else(|| format!("invalid price '{raw_price}'"))?;

    let money = |name: &str, index: Option<usize>| {
        let raw = optional(index);
        values::parse_money(raw).ok_or_else(|| format!("invalid {name} '{raw}'"))
    };
    let commission = money("commission", columns.commission)?;
    let mae = money("MAE", columns.mae)?;
    let mfe = money("MFE", columns.mfe)?;

    let raw_bars = optional(columns.bars);
    let bars = if raw_bars.is_empty() {
        0
    } else {
        values::parse_count(raw_bars).ok_or_else(|| format!("invalid bars '{raw_bars}'"))?
    };

    let trade = NewTrade {
        date,
        time,
        instrument: cell(columns.instrument).to_string(),
        action: normalize_action(cell(columns.action.index())),
        quantity,
        price,
        commission,
        mae,
        mfe,
        bars,
        entry_strategy: optional(columns.strategy).to_string(),
        notes: String::new(),
    };

    validate_trade(&trade).map_err(|e| e.to_string())?;
    Ok(trade)
}
