//! Holding window: the date range a lot is evaluated over.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::allocate::AllocError;

/// The closed date range `[start, end]` over which dispositions are
/// accumulated.
///
/// The start is the acquisition date (or the carried-forward January 1 for
/// lots held across year boundaries); the end is the sale date if the lot
/// was sold, otherwise December 31 of the tax year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl HoldingWindow {
    /// Create a window from explicit bounds.
    ///
    /// Fails with [`AllocError::InvalidWindow`] if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AllocError> {
        if start > end {
            return Err(AllocError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window from `start` through December 31 of `year`, or through
    /// `date_sold` when the lot was sold during the year.
    pub fn for_tax_year(
        start: NaiveDate,
        year: i32,
        date_sold: Option<NaiveDate>,
    ) -> Result<Self, AllocError> {
        // Dec 31 exists in every year, so the unwrap_or is unreachable in
        // practice; fall back to start to keep the constructor total.
        let year_end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(start);
        Self::new(start, date_sold.unwrap_or(year_end))
    }

    /// First date of the window.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date of the window, inclusive.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether the window covers a single day.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for HoldingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_for_tax_year_defaults_to_year_end() {
        let w = HoldingWindow::for_tax_year(date(2020, 3, 15), 2021, None).unwrap();
        assert_eq!(w.start(), date(2020, 3, 15));
        assert_eq!(w.end(), date(2021, 12, 31));
    }

    #[test]
    fn test_sale_date_overrides_year_end() {
        let sold = date(2021, 7, 2);
        let w = HoldingWindow::for_tax_year(date(2020, 3, 15), 2021, Some(sold)).unwrap();
        assert_eq!(w.end(), sold);
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = HoldingWindow::new(date(2021, 1, 1), date(2020, 1, 1)).unwrap_err();
        assert!(matches!(err, AllocError::InvalidWindow { .. }));
    }

    #[test]
    fn test_single_day_window() {
        let w = HoldingWindow::new(date(2020, 1, 1), date(2020, 1, 1)).unwrap();
        assert!(w.is_degenerate());
    }

    #[test]
    fn test_sale_before_acquisition_rejected() {
        let err =
            HoldingWindow::for_tax_year(date(2021, 6, 1), 2021, Some(date(2021, 5, 1))).unwrap_err();
        assert!(matches!(err, AllocError::InvalidWindow { .. }));
    }
}
