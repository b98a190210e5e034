//! Lot type representing a single tax-relevant purchase of ETF shares.
//!
//! A [`Lot`] pairs a share count with the price paid for it on one date.
//! Its cost basis is fixed at construction and is apportioned across
//! bullion ounces by the allocator. [`AdjustedLot`] is the rolled-forward
//! state of a lot after prior tax years have consumed part of the basis.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::allocate::AllocError;

/// A single purchase of ETF shares at one price on one date.
///
/// # Examples
///
/// ```
/// use metalbasis_core::Lot;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let lot = Lot::new(
///     "GLD",
///     NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
///     dec!(10),
///     dec!(150.00),
/// )
/// .unwrap();
/// assert_eq!(lot.cost_basis(), dec!(1500.00));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Ticker of the fund, selects which backing series applies.
    pub ticker: String,
    /// Purchase date.
    pub date_acquired: NaiveDate,
    /// Number of shares purchased. Always positive.
    shares: Decimal,
    /// Price paid per share. Always positive.
    price_per_share: Decimal,
}

impl Lot {
    /// Create a new lot.
    ///
    /// Fails with [`AllocError::InvalidLot`] if `shares` or
    /// `price_per_share` is not strictly positive.
    pub fn new(
        ticker: impl Into<String>,
        date_acquired: NaiveDate,
        shares: Decimal,
        price_per_share: Decimal,
    ) -> Result<Self, AllocError> {
        if shares <= Decimal::ZERO {
            return Err(AllocError::InvalidLot {
                reason: format!("share count must be positive, got {shares}"),
            });
        }
        if price_per_share <= Decimal::ZERO {
            return Err(AllocError::InvalidLot {
                reason: format!("price per share must be positive, got {price_per_share}"),
            });
        }
        Ok(Self {
            ticker: ticker.into(),
            date_acquired,
            shares,
            price_per_share,
        })
    }

    /// Number of shares in the lot.
    #[must_use]
    pub const fn shares(&self) -> Decimal {
        self.shares
    }

    /// Purchase price per share.
    #[must_use]
    pub const fn price_per_share(&self) -> Decimal {
        self.price_per_share
    }

    /// Original dollar cost of the lot, fixed for its life.
    #[must_use]
    pub fn cost_basis(&self) -> Decimal {
        self.shares * self.price_per_share
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} @ {} acquired {}",
            self.shares, self.ticker, self.price_per_share, self.date_acquired
        )
    }
}

/// The carried-forward state of a lot after prior-year dispositions.
///
/// Produced by [`carry_forward`](crate::allocate::carry_forward) when a lot
/// was acquired before the reported tax year: each intervening year's
/// expense sales reduce the basis and the ounce count, and the remainder is
/// what the tax-year allocation starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedLot {
    /// Cost basis remaining after prior-year dispositions.
    pub basis: Decimal,
    /// Bullion ounces remaining after prior-year dispositions.
    pub ounces: Decimal,
    /// First date the carried state is valid for.
    pub from: NaiveDate,
}
