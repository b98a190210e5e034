//! Backing time series: per-day ounces of metal behind one share.
//!
//! Precious-metals ETFs publish a per-day table of how many bullion ounces
//! back a single share. The number only shrinks: every month the sponsor
//! sells a sliver of metal to pay fund expenses. [`BackingSeries`] holds
//! one ticker's table sorted by date and answers as-of queries; a
//! [`SeriesSet`] maps tickers to their series so one loaded dataset can
//! serve many lots.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::allocate::AllocError;

/// One row of a fund's published backing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackingRow {
    /// Trading day the row describes.
    pub date: NaiveDate,
    /// Ounces of metal represented by one share on that day.
    pub ounces_per_share: Decimal,
    /// Per-share dollar proceeds of that day's expense sale, when the
    /// source file carries the column. `None` means the feed did not
    /// publish proceeds for the day.
    pub proceeds_per_share: Option<Decimal>,
}

impl BackingRow {
    /// Row with a published proceeds figure.
    #[must_use]
    pub const fn new(
        date: NaiveDate,
        ounces_per_share: Decimal,
        proceeds_per_share: Option<Decimal>,
    ) -> Self {
        Self {
            date,
            ounces_per_share,
            proceeds_per_share,
        }
    }
}

/// Date-sorted backing rows for a single ticker.
///
/// Rows are sorted at construction; lookups scan from the most recent row
/// backwards, mirroring how prices are resolved at-or-before a date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackingSeries {
    ticker: String,
    rows: Vec<BackingRow>,
}

impl BackingSeries {
    /// Build a series from unordered rows. Rows are sorted by date; a
    /// non-positive `ounces_per_share` anywhere fails with
    /// [`AllocError::InconsistentSeries`].
    pub fn new(ticker: impl Into<String>, mut rows: Vec<BackingRow>) -> Result<Self, AllocError> {
        let ticker = ticker.into();
        rows.sort_by_key(|r| r.date);
        if let Some(bad) = rows.iter().find(|r| r.ounces_per_share <= Decimal::ZERO) {
            return Err(AllocError::InconsistentSeries {
                ticker,
                detail: format!(
                    "ounces per share must be positive, got {} on {}",
                    bad.ounces_per_share, bad.date
                ),
            });
        }
        Ok(Self { ticker, rows })
    }

    /// Ticker this series describes.
    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the series has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First date covered by the series, if any.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    /// Last date covered by the series, if any.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Ounces per share as of `date`: the most recent row with
    /// `row.date <= date`.
    ///
    /// Fails with [`AllocError::DataUnavailable`] when no row exists at or
    /// before the date; a default is never substituted.
    pub fn as_of(&self, date: NaiveDate) -> Result<Decimal, AllocError> {
        self.rows
            .iter()
            .rev()
            .find(|r| r.date <= date)
            .map(|r| r.ounces_per_share)
            .ok_or_else(|| AllocError::DataUnavailable {
                ticker: self.ticker.clone(),
                detail: format!("no backing data at or before {date}"),
            })
    }

    /// Sum of per-share proceeds over the closed range `[start, end]`.
    ///
    /// Fails with [`AllocError::DataUnavailable`] if any row inside the
    /// range lacks a proceeds figure: the gain/loss computation sums
    /// published daily proceeds and never invents a blended price for
    /// missing days.
    pub fn proceeds_in(&self, start: NaiveDate, end: NaiveDate) -> Result<Decimal, AllocError> {
        let mut total = Decimal::ZERO;
        for row in self.rows.iter().filter(|r| r.date >= start && r.date <= end) {
            match row.proceeds_per_share {
                Some(p) => total += p,
                None => {
                    return Err(AllocError::DataUnavailable {
                        ticker: self.ticker.clone(),
                        detail: format!("no proceeds per share published for {}", row.date),
                    })
                }
            }
        }
        Ok(total)
    }

    /// Iterate the rows in date order.
    pub fn rows(&self) -> impl Iterator<Item = &BackingRow> {
        self.rows.iter()
    }
}

/// A set of backing series keyed by ticker.
///
/// Tickers are case-insensitive: `GLD` and `gld` name the same series,
/// matching how the published CSV files are named.
#[derive(Debug, Clone, Default)]
pub struct SeriesSet {
    series: HashMap<String, BackingSeries>,
}

impl SeriesSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a series, replacing any existing series for the ticker.
    pub fn insert(&mut self, series: BackingSeries) {
        self.series
            .insert(series.ticker().to_lowercase(), series);
    }

    /// Look up the series for a ticker.
    pub fn get(&self, ticker: &str) -> Result<&BackingSeries, AllocError> {
        self.series
            .get(&ticker.to_lowercase())
            .ok_or_else(|| AllocError::DataUnavailable {
                ticker: ticker.to_string(),
                detail: "no backing series loaded for ticker".to_string(),
            })
    }

    /// Tickers with a loaded series.
    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Whether the set has no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
