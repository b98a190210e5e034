//! Core types for metalbasis
//!
//! This crate provides the pure computation behind metalbasis: tax-lot
//! accounting for precious-metals ETF shares whose sponsor sells small
//! fractions of the underlying bullion to pay fund expenses.
//!
//! - [`Lot`] - A single purchase of ETF shares
//! - [`BackingSeries`] - Per-day ounces-per-share table with as-of lookup
//! - [`HoldingWindow`] - The date range dispositions accumulate over
//! - [`allocate`] - Apportion cost basis across expense-driven dispositions
//! - [`carry_forward`] - Roll a lot through prior years, then allocate
//! - [`Report`] - The six disposition/adjustment figures
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use metalbasis_core::{allocate, BackingRow, BackingSeries, HoldingWindow, Lot};
//! use rust_decimal_macros::dec;
//!
//! let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
//! let series = BackingSeries::new(
//!     "GLD",
//!     vec![
//!         BackingRow::new(date(2020, 1, 1), dec!(0.0940), Some(dec!(0))),
//!         BackingRow::new(date(2021, 12, 31), dec!(0.0915), Some(dec!(38.10))),
//!     ],
//! )?;
//!
//! let lot = Lot::new("GLD", date(2020, 1, 1), dec!(10), dec!(150.00))?;
//! let window = HoldingWindow::for_tax_year(lot.date_acquired, 2021, None)?;
//! let report = allocate(&lot, &window, &series)?;
//!
//! assert_eq!(report.initial_ounces, dec!(0.940));
//! assert_eq!(report.rounded().adjusted_basis, dec!(1460.11));
//! # Ok::<(), metalbasis_core::AllocError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod allocate;
pub mod lot;
pub mod report;
pub mod series;
pub mod window;

pub use allocate::{allocate, carry_forward, AllocError, YearAllocation};
pub use lot::{AdjustedLot, Lot};
pub use report::Report;
pub use series::{BackingRow, BackingSeries, SeriesSet};
pub use window::HoldingWindow;

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
