//! Allocation report: the six disposition/adjustment figures for one lot.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dollar figures are displayed at cent precision.
const DOLLAR_DP: u32 = 2;
/// Ounce figures are displayed at the precision the fund worksheets use.
const OUNCE_DP: u32 = 8;

/// Result of allocating one lot over one holding window.
///
/// All fields are exact decimals at full precision; nothing is rounded
/// mid-computation. Use [`Report::rounded`] at the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Ounces of bullion attributable to the lot at the window start.
    pub initial_ounces: Decimal,
    /// Ounces disposed of by the fund to cover expenses over the window.
    pub ounces_sold_to_cover_expenses: Decimal,
    /// Cost basis consumed by the expense-driven dispositions.
    pub basis_of_ounces_sold: Decimal,
    /// Dollar proceeds of the dispositions attributed to the lot.
    pub proceeds: Decimal,
    /// Schedule-D-style gain or loss: proceeds minus basis of ounces sold.
    pub gain_or_loss: Decimal,
    /// Cost basis remaining at the window end.
    pub adjusted_basis: Decimal,
    /// Bullion ounces remaining at the window end.
    pub remaining_ounces: Decimal,
}

impl Report {
    /// Presentation view: dollars at 2 places, ounces at 8 places, halves
    /// rounded away from zero. The full-precision report stays available
    /// for chaining.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            initial_ounces: round_oz(self.initial_ounces),
            ounces_sold_to_cover_expenses: round_oz(self.ounces_sold_to_cover_expenses),
            basis_of_ounces_sold: round_usd(self.basis_of_ounces_sold),
            proceeds: round_usd(self.proceeds),
            gain_or_loss: round_usd(self.gain_or_loss),
            adjusted_basis: round_usd(self.adjusted_basis),
            remaining_ounces: round_oz(self.remaining_ounces),
        }
    }
}

fn round_usd(n: Decimal) -> Decimal {
    n.round_dp_with_strategy(DOLLAR_DP, RoundingStrategy::MidpointAwayFromZero)
}

fn round_oz(n: Decimal) -> Decimal {
    n.round_dp_with_strategy(OUNCE_DP, RoundingStrategy::MidpointAwayFromZero)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.rounded();
        writeln!(f, "Pro rata ounces at start: {} oz", r.initial_ounces)?;
        writeln!(
            f,
            "Ounces sold to cover expenses: {} oz",
            r.ounces_sold_to_cover_expenses
        )?;
        writeln!(f, "Cost of ounces sold: ${}", r.basis_of_ounces_sold)?;
        writeln!(f, "Proceeds of ounces sold: ${}", r.proceeds)?;
        writeln!(f, "Gain/Loss: ${}", r.gain_or_loss)?;
        writeln!(f, "Adjusted basis: ${}", r.adjusted_basis)?;
        write!(f, "Remaining ounces: {} oz", r.remaining_ounces)
    }
}
