//! The lot allocator: apportioning cost basis across expense-driven
//! bullion dispositions.
//!
//! A grantor-trust metals ETF sells a small fraction of its bullion every
//! month to pay expenses; each shareholder must report their pro rata
//! slice of those sales. [`allocate`] maps the fund's per-share backing
//! series onto one lot over one window. [`carry_forward`] rolls a lot
//! acquired in an earlier year through each intervening year before
//! allocating the requested tax year.
//!
//! Both are pure functions of their inputs: no I/O, no shared state, and
//! identical inputs produce identical output.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::lot::{AdjustedLot, Lot};
use crate::report::Report;
use crate::series::BackingSeries;
use crate::window::HoldingWindow;

/// Errors surfaced by lot allocation.
///
/// All variants are local validation failures: bad input stays bad, none
/// are retryable, and no partial report is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The lot itself is malformed (non-positive shares or price).
    #[error("invalid lot: {reason}")]
    InvalidLot {
        /// Which constraint the lot violated.
        reason: String,
    },

    /// The holding window is inverted.
    #[error("invalid holding window: {start} is after {end}")]
    InvalidWindow {
        /// Window start.
        start: NaiveDate,
        /// Window end.
        end: NaiveDate,
    },

    /// The series cannot answer a required query.
    #[error("no data for {ticker}: {detail}")]
    DataUnavailable {
        /// Ticker the query was for.
        ticker: String,
        /// What was missing.
        detail: String,
    },

    /// The series contradicts the expense-drag model (backing grew).
    #[error("inconsistent series for {ticker}: {detail}")]
    InconsistentSeries {
        /// Ticker the series describes.
        ticker: String,
        /// What the contradiction was.
        detail: String,
    },
}

/// Allocate one lot's dispositions over a holding window.
///
/// Resolves ounces-per-share as of the window bounds, derives the ounce
/// shrinkage scaled to the lot's share count, apportions the lot's cost
/// basis proportionally to ounces sold versus retained, and prices the
/// dispositions from the fund's published per-day proceeds.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use metalbasis_core::{allocate, BackingRow, BackingSeries, HoldingWindow, Lot};
/// use rust_decimal_macros::dec;
///
/// let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
/// let series = BackingSeries::new(
///     "GLD",
///     vec![
///         BackingRow::new(date(2020, 1, 1), dec!(0.0940), Some(dec!(0))),
///         BackingRow::new(date(2021, 12, 31), dec!(0.0915), Some(dec!(38.10))),
///     ],
/// )
/// .unwrap();
/// let lot = Lot::new("GLD", date(2020, 1, 1), dec!(10), dec!(150.00)).unwrap();
/// let window = HoldingWindow::for_tax_year(lot.date_acquired, 2021, None).unwrap();
///
/// let report = allocate(&lot, &window, &series).unwrap();
/// assert_eq!(report.initial_ounces, dec!(0.940));
/// assert_eq!(report.rounded().basis_of_ounces_sold, dec!(39.89));
/// ```
pub fn allocate(
    lot: &Lot,
    window: &HoldingWindow,
    series: &BackingSeries,
) -> Result<Report, AllocError> {
    allocate_span(lot.shares(), lot.cost_basis(), window, series)
}

/// Allocation over a window with an explicit starting basis.
///
/// Shared by [`allocate`] (basis = the lot's original cost) and
/// [`carry_forward`] (basis = what prior years left behind). `shares` is
/// positive by `Lot` construction, and ounces-per-share is positive by
/// `BackingSeries` construction, so `initial_ounces` never divides by
/// zero.
fn allocate_span(
    shares: Decimal,
    basis: Decimal,
    window: &HoldingWindow,
    series: &BackingSeries,
) -> Result<Report, AllocError> {
    let ops_start = series.as_of(window.start())?;
    let ops_end = series.as_of(window.end())?;

    let initial_ounces = shares * ops_start;
    let shrink_ratio = ops_end / ops_start;
    if shrink_ratio > Decimal::ONE {
        return Err(AllocError::InconsistentSeries {
            ticker: series.ticker().to_string(),
            detail: format!(
                "ounces per share grew from {ops_start} to {ops_end} over {window}"
            ),
        });
    }

    let remaining_ounces = initial_ounces * shrink_ratio;
    let ounces_sold = initial_ounces - remaining_ounces;
    let basis_of_ounces_sold = basis * ounces_sold / initial_ounces;
    let adjusted_basis = basis - basis_of_ounces_sold;

    // Per-day proceeds granularity: sum the fund's published daily
    // proceeds-per-share over the window. A single-day window has no
    // dispositions, so the proceeds columns are not consulted at all.
    let proceeds = if window.is_degenerate() {
        Decimal::ZERO
    } else {
        shares * series.proceeds_in(window.start(), window.end())?
    };

    Ok(Report {
        initial_ounces,
        ounces_sold_to_cover_expenses: ounces_sold,
        basis_of_ounces_sold,
        proceeds,
        gain_or_loss: proceeds - basis_of_ounces_sold,
        adjusted_basis,
        remaining_ounces,
    })
}

/// A tax-year allocation for a lot that may have been held across year
/// boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearAllocation {
    /// Basis and ounces carried into the reported year after prior-year
    /// dispositions. Equals the lot's original figures when the lot was
    /// acquired in the reported year.
    pub carried: AdjustedLot,
    /// The window the report covers.
    pub window: HoldingWindow,
    /// Allocation for the reported tax year only.
    pub report: Report,
}

/// Roll a lot forward to `year` and allocate that year's dispositions.
///
/// For each calendar year between acquisition and the reported year, the
/// year's dispositions are allocated and the adjusted basis and remaining
/// ounces are chained into the next year, exactly as the worksheet method
/// walks year by year. The returned report covers only the reported year,
/// starting from January 1 with the carried-in basis (or from the
/// acquisition date when the lot was bought during the year).
pub fn carry_forward(
    lot: &Lot,
    year: i32,
    date_sold: Option<NaiveDate>,
    series: &BackingSeries,
) -> Result<YearAllocation, AllocError> {
    let mut start = lot.date_acquired;
    let mut basis = lot.cost_basis();
    let mut ounces = lot.shares() * series.as_of(start)?;

    for y in lot.date_acquired.year()..year {
        let year_end = NaiveDate::from_ymd_opt(y, 12, 31).unwrap_or(start);
        let span = HoldingWindow::new(start, year_end)?;
        let prior = allocate_span(lot.shares(), basis, &span, series)?;
        basis = prior.adjusted_basis;
        ounces = prior.remaining_ounces;
        start = NaiveDate::from_ymd_opt(y + 1, 1, 1).unwrap_or(year_end);
    }

    let carried = AdjustedLot {
        basis,
        ounces,
        from: start,
    };
    let window = HoldingWindow::for_tax_year(start, year, date_sold)?;
    let report = allocate_span(lot.shares(), basis, &window, series)?;

    Ok(YearAllocation {
        carried,
        window,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::BackingRow;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(rows: Vec<BackingRow>) -> BackingSeries {
        BackingSeries::new("GLD", rows).unwrap()
    }

    fn two_point_series() -> BackingSeries {
        series(vec![
            BackingRow::new(date(2020, 1, 1), dec!(0.0940), Some(dec!(0))),
            BackingRow::new(date(2021, 12, 31), dec!(0.0915), Some(dec!(3.81))),
        ])
    }

    fn gld_lot() -> Lot {
        Lot::new("GLD", date(2020, 1, 1), dec!(10), dec!(150.00)).unwrap()
    }

    #[test]
    fn test_worksheet_scenario() {
        let lot = gld_lot();
        let window = HoldingWindow::for_tax_year(lot.date_acquired, 2021, None).unwrap();
        let report = allocate(&lot, &window, &two_point_series()).unwrap();

        assert_eq!(report.initial_ounces, dec!(0.940));
        assert_eq!(report.remaining_ounces, dec!(0.915000));
        assert_eq!(report.ounces_sold_to_cover_expenses, dec!(0.025000));
        let rounded = report.rounded();
        assert_eq!(rounded.basis_of_ounces_sold, dec!(39.89));
        assert_eq!(rounded.adjusted_basis, dec!(1460.11));
        // proceeds: 10 shares x $3.81 of published daily proceeds
        assert_eq!(rounded.proceeds, dec!(38.10));
        assert_eq!(rounded.gain_or_loss, dec!(-1.79));
    }

    #[test]
    fn test_basis_conserved_full_precision() {
        let lot = gld_lot();
        let window = HoldingWindow::for_tax_year(lot.date_acquired, 2021, None).unwrap();
        let report = allocate(&lot, &window, &two_point_series()).unwrap();
        assert_eq!(
            report.adjusted_basis + report.basis_of_ounces_sold,
            lot.cost_basis()
        );
        assert_eq!(
            report.remaining_ounces + report.ounces_sold_to_cover_expenses,
            report.initial_ounces
        );
    }

    #[test]
    fn test_deterministic() {
        let lot = gld_lot();
        let window = HoldingWindow::for_tax_year(lot.date_acquired, 2021, None).unwrap();
        let s = two_point_series();
        assert_eq!(allocate(&lot, &window, &s), allocate(&lot, &window, &s));
    }

    #[test]
    fn test_degenerate_window_no_dispositions() {
        // proceeds column deliberately missing: a one-day window must not
        // consult it
        let s = series(vec![BackingRow::new(date(2020, 1, 1), dec!(0.0940), None)]);
        let lot = gld_lot();
        let window = HoldingWindow::new(date(2020, 1, 1), date(2020, 1, 1)).unwrap();
        let report = allocate(&lot, &window, &s).unwrap();
        assert_eq!(report.ounces_sold_to_cover_expenses, Decimal::ZERO);
        assert_eq!(report.adjusted_basis, lot.cost_basis());
        assert_eq!(report.proceeds, Decimal::ZERO);
        assert_eq!(report.gain_or_loss, Decimal::ZERO);
    }

    #[test]
    fn test_growing_backing_rejected() {
        let s = series(vec![
            BackingRow::new(date(2020, 1, 1), dec!(0.0915), Some(dec!(0))),
            BackingRow::new(date(2020, 6, 1), dec!(0.0940), Some(dec!(0))),
        ]);
        let lot = gld_lot();
        let window = HoldingWindow::new(date(2020, 1, 1), date(2020, 6, 1)).unwrap();
        let err = allocate(&lot, &window, &s).unwrap_err();
        assert!(matches!(err, AllocError::InconsistentSeries { .. }));
    }

    #[test]
    fn test_window_before_series_fails() {
        let lot = Lot::new("GLD", date(2019, 6, 1), dec!(10), dec!(150.00)).unwrap();
        let window = HoldingWindow::for_tax_year(lot.date_acquired, 2021, None).unwrap();
        let err = allocate(&lot, &window, &two_point_series()).unwrap_err();
        assert!(matches!(err, AllocError::DataUnavailable { .. }));
    }

    #[test]
    fn test_missing_proceeds_inside_window_fails() {
        let s = series(vec![
            BackingRow::new(date(2020, 1, 1), dec!(0.0940), Some(dec!(0.01))),
            BackingRow::new(date(2020, 6, 1), dec!(0.0930), None),
            BackingRow::new(date(2020, 12, 31), dec!(0.0920), Some(dec!(0.02))),
        ]);
        let lot = gld_lot();
        let window = HoldingWindow::for_tax_year(lot.date_acquired, 2020, None).unwrap();
        let err = allocate(&lot, &window, &s).unwrap_err();
        assert!(matches!(err, AllocError::DataUnavailable { .. }));
    }

    #[test]
    fn test_carry_forward_same_year_is_plain_allocation() {
        let lot = gld_lot();
        let s = series(vec![
            BackingRow::new(date(2020, 1, 1), dec!(0.0940), Some(dec!(0))),
            BackingRow::new(date(2020, 12, 31), dec!(0.0930), Some(dec!(1.90))),
        ]);
        let ya = carry_forward(&lot, 2020, None, &s).unwrap();
        assert_eq!(ya.carried.basis, lot.cost_basis());
        assert_eq!(ya.carried.from, lot.date_acquired);

        let window = HoldingWindow::for_tax_year(lot.date_acquired, 2020, None).unwrap();
        assert_eq!(ya.report, allocate(&lot, &window, &s).unwrap());
    }

    #[test]
    fn test_carry_forward_chains_prior_years() {
        let s = series(vec![
            BackingRow::new(date(2020, 1, 1), dec!(0.1000), Some(dec!(0))),
            BackingRow::new(date(2020, 12, 31), dec!(0.0950), Some(dec!(2.00))),
            BackingRow::new(date(2021, 12, 31), dec!(0.0912), Some(dec!(1.60))),
        ]);
        let lot = Lot::new("GLD", date(2020, 1, 1), dec!(10), dec!(100.00)).unwrap();
        let ya = carry_forward(&lot, 2021, None, &s).unwrap();

        // 2020 consumed 5% of the ounces, so 5% of the $1000 basis
        assert_eq!(ya.carried.basis, dec!(950.0000));
        assert_eq!(ya.carried.ounces, dec!(0.950000));
        assert_eq!(ya.carried.from, date(2021, 1, 1));

        // 2021 starts from the carried basis: ratio 0.0912/0.0950 = 0.96
        assert_eq!(ya.report.initial_ounces, dec!(0.950));
        assert_eq!(ya.report.remaining_ounces, dec!(0.912000));
        assert_eq!(ya.report.rounded().basis_of_ounces_sold, dec!(38.00));
        assert_eq!(ya.report.rounded().adjusted_basis, dec!(912.00));
        // 2021 proceeds only: 10 x 1.60
        assert_eq!(ya.report.proceeds, dec!(16.00));
    }

    #[test]
    fn test_carry_forward_matches_one_shot_in_exact_arithmetic() {
        let s = series(vec![
            BackingRow::new(date(2020, 1, 1), dec!(0.1000), Some(dec!(0))),
            BackingRow::new(date(2020, 12, 31), dec!(0.0950), Some(dec!(2.00))),
            BackingRow::new(date(2021, 12, 31), dec!(0.0912), Some(dec!(1.60))),
        ]);
        let lot = Lot::new("GLD", date(2020, 1, 1), dec!(10), dec!(100.00)).unwrap();
        let ya = carry_forward(&lot, 2021, None, &s).unwrap();

        let full = HoldingWindow::new(date(2020, 1, 1), date(2021, 12, 31)).unwrap();
        let one_shot = allocate(&lot, &full, &s).unwrap();
        // proportional allocation is multiplicative, so the ending basis
        // agrees between the year-walk and the single window
        assert_eq!(ya.report.adjusted_basis, one_shot.adjusted_basis);
        assert_eq!(ya.report.remaining_ounces, one_shot.remaining_ounces);
    }

    #[test]
    fn test_carry_forward_year_before_acquisition_fails() {
        let lot = gld_lot();
        let err = carry_forward(&lot, 2019, None, &two_point_series()).unwrap_err();
        assert!(matches!(err, AllocError::InvalidWindow { .. }));
    }

    #[test]
    fn test_sale_date_clips_window() {
        let s = series(vec![
            BackingRow::new(date(2020, 1, 1), dec!(0.0940), Some(dec!(0))),
            BackingRow::new(date(2020, 6, 30), dec!(0.0930), Some(dec!(1.00))),
            BackingRow::new(date(2020, 12, 31), dec!(0.0920), Some(dec!(1.00))),
        ]);
        let lot = gld_lot();
        let ya = carry_forward(&lot, 2020, Some(date(2020, 6, 30)), &s).unwrap();
        assert_eq!(ya.window.end(), date(2020, 6, 30));
        assert_eq!(ya.report.remaining_ounces, dec!(0.930000));
        // the December row is outside the clipped window
        assert_eq!(ya.report.proceeds, dec!(10.00));
    }
}
