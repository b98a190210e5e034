//! CSV loader for fund-published backing tables.
//!
//! Metals ETF sponsors publish a per-day table alongside their tax
//! worksheets: the date, the ounces of metal backing one share, and the
//! per-share dollar proceeds of that day's expense sale. This crate turns
//! one such file into a [`BackingSeries`] for the allocator.
//!
//! Columns are addressed by header name, not position:
//!
//! - `Date` (required)
//! - `OuncesPerShare` (required)
//! - `ProceedsPerShare` (optional column; rows without it can still answer
//!   as-of queries but not proceeds sums)
//!
//! Unknown columns (the published files also carry `OuncesSold` and
//! similar) are ignored.
//!
//! # Example
//!
//! ```ignore
//! use metalbasis_loader::load_series;
//! use std::path::Path;
//!
//! let series = load_series("GLD", Path::new("gld.csv"))?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::NaiveDate;
use metalbasis_core::{AllocError, BackingRow, BackingSeries};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Date formats accepted in the `Date` column. The published files use
/// month/day/year; ISO dates are accepted for hand-built files.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

/// Errors that can occur while loading a backing table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// IO error reading the file.
    #[error("failed to read file {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV itself could not be parsed.
    #[error("malformed CSV: {source}")]
    Csv {
        /// The underlying CSV error.
        #[from]
        source: csv::Error,
    },

    /// A required header is missing.
    #[error("missing required column {name:?}")]
    MissingColumn {
        /// The header that was not found.
        name: &'static str,
    },

    /// A date cell could not be parsed with any accepted format.
    #[error("row {row}: unparseable date {value:?}")]
    InvalidDate {
        /// 1-based data row number.
        row: usize,
        /// The offending cell.
        value: String,
    },

    /// A numeric cell could not be parsed as a decimal.
    #[error("row {row}: column {column} has unparseable number {value:?}")]
    InvalidNumber {
        /// 1-based data row number.
        row: usize,
        /// The column the cell belongs to.
        column: &'static str,
        /// The offending cell.
        value: String,
    },

    /// The parsed rows violate the series invariants.
    #[error(transparent)]
    Series(#[from] AllocError),
}

/// Load a ticker's backing table from a CSV file.
pub fn load_series(ticker: &str, path: &Path) -> Result<BackingSeries, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_series_from_reader(ticker, file)
}

/// Load a ticker's backing table from any reader.
pub fn load_series_from_reader<R: Read>(
    ticker: &str,
    reader: R,
) -> Result<BackingSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_idx = find_column(&headers, "Date")?;
    let ounces_idx = find_column(&headers, "OuncesPerShare")?;
    let proceeds_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("ProceedsPerShare"));

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result?;

        let date_cell = record.get(date_idx).unwrap_or_default();
        if date_cell.is_empty() {
            debug!(row, "skipping row with empty date");
            continue;
        }
        let date = parse_date(date_cell).ok_or_else(|| LoadError::InvalidDate {
            row,
            value: date_cell.to_string(),
        })?;

        let ounces_per_share = parse_decimal(&record, ounces_idx, "OuncesPerShare", row)?;
        let proceeds_per_share = match proceeds_idx {
            Some(idx) if !record.get(idx).unwrap_or_default().is_empty() => {
                Some(parse_decimal(&record, idx, "ProceedsPerShare", row)?)
            }
            _ => None,
        };

        rows.push(BackingRow::new(date, ounces_per_share, proceeds_per_share));
    }

    debug!(ticker, rows = rows.len(), "loaded backing table");
    Ok(BackingSeries::new(ticker, rows)?)
}

fn find_column(headers: &csv::StringRecord, name: &'static str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or(LoadError::MissingColumn { name })
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
}

fn parse_decimal(
    record: &csv::StringRecord,
    idx: usize,
    column: &'static str,
    row: usize,
) -> Result<Decimal, LoadError> {
    let cell = record.get(idx).unwrap_or_default();
    Decimal::from_str(cell).map_err(|_| LoadError::InvalidNumber {
        row,
        column,
        value: cell.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_loads_published_layout() {
        let csv = "\
Date,OuncesPerShare,OuncesSold,ProceedsPerShare
1/2/2020,0.09400,0.00001,0.0125
1/3/2020,0.09399,0.00001,0.0126
";
        let series = load_series_from_reader("GLD", csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.as_of(date(2020, 1, 2)).unwrap(), dec!(0.09400));
        assert_eq!(
            series.proceeds_in(date(2020, 1, 2), date(2020, 1, 3)).unwrap(),
            dec!(0.0251)
        );
    }

    #[test]
    fn test_iso_dates_and_reordered_columns() {
        let csv = "\
OuncesPerShare,Date
0.0092,2020-01-02
0.0091,2020-01-03
";
        let series = load_series_from_reader("IAU", csv.as_bytes()).unwrap();
        assert_eq!(series.first_date(), Some(date(2020, 1, 2)));
        assert_eq!(series.as_of(date(2020, 1, 3)).unwrap(), dec!(0.0091));
    }

    #[test]
    fn test_missing_proceeds_column_loads_without_proceeds() {
        let csv = "Date,OuncesPerShare\n1/2/2020,0.0940\n1/3/2020,0.0939\n";
        let series = load_series_from_reader("GLD", csv.as_bytes()).unwrap();
        assert!(series
            .proceeds_in(date(2020, 1, 2), date(2020, 1, 3))
            .is_err());
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "Date,Close\n1/2/2020,150.00\n";
        let err = load_series_from_reader("GLD", csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                name: "OuncesPerShare"
            }
        ));
    }

    #[test]
    fn test_unparseable_date_is_an_error() {
        let csv = "Date,OuncesPerShare\nJanuary 2nd,0.0940\n";
        let err = load_series_from_reader("GLD", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn test_unparseable_number_is_an_error() {
        let csv = "Date,OuncesPerShare\n1/2/2020,n/a\n";
        let err = load_series_from_reader("GLD", csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidNumber {
                row: 1,
                column: "OuncesPerShare",
                ..
            }
        ));
    }

    #[test]
    fn test_blank_date_rows_skipped() {
        let csv = "Date,OuncesPerShare\n1/2/2020,0.0940\n,\n1/3/2020,0.0939\n";
        let series = load_series_from_reader("GLD", csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_non_positive_backing_rejected() {
        let csv = "Date,OuncesPerShare\n1/2/2020,0\n";
        let err = load_series_from_reader("GLD", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Series(_)));
    }

    #[test]
    fn test_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gld.csv");
        std::fs::write(&path, "Date,OuncesPerShare\n1/2/2020,0.0940\n").unwrap();
        let series = load_series("GLD", &path).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.ticker(), "GLD");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_series("GLD", Path::new("/nonexistent/gld.csv")).unwrap_err();
        match err {
            LoadError::Io { path, .. } => assert_eq!(path, PathBuf::from("/nonexistent/gld.csv")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
