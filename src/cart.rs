//! Cart

use rusty_money::{Money, iso::Currency};
use uuid::Uuid;

use crate::pricing::{PricingError, subtotal};

/// A single line of a cart snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    /// Cart item identifier.
    pub uuid: Uuid,

    /// Product the line refers to.
    pub product: Uuid,

    /// Requested quantity. Always positive.
    pub quantity: u32,

    /// Unit price at the time the cart was read.
    pub unit_price: Money<'static, Currency>,
}

/// Aggregate figures for a cart snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSummary {
    /// Number of distinct lines.
    pub lines: usize,

    /// Total units across all lines.
    pub items: u64,

    /// Sum of unit price × quantity.
    pub subtotal: Money<'static, Currency>,
}

impl CartSummary {
    /// Summarise a cart snapshot priced in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a line is priced in another currency or the subtotal overflows.
    pub fn of(lines: &[CartLine], currency: &'static Currency) -> Result<Self, PricingError> {
        let subtotal = subtotal(
            lines.iter().map(|line| (&line.unit_price, line.quantity)),
            currency,
        )?;

        Ok(Self {
            lines: lines.len(),
            items: lines.iter().map(|line| u64::from(line.quantity)).sum(),
            subtotal,
        })
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    fn line(price: i64, quantity: u32) -> CartLine {
        CartLine {
            uuid: Uuid::now_v7(),
            product: Uuid::now_v7(),
            quantity,
            unit_price: Money::from_minor(price, USD),
        }
    }

    #[test]
    fn summary_counts_lines_and_items() -> TestResult {
        let summary = CartSummary::of(&[line(10_00, 3), line(1_50, 2)], USD)?;

        assert_eq!(summary.lines, 2);
        assert_eq!(summary.items, 5);
        assert_eq!(summary.subtotal, Money::from_minor(33_00, USD));

        Ok(())
    }

    #[test]
    fn empty_cart_summary_is_zero() -> TestResult {
        let summary = CartSummary::of(&[], USD)?;

        assert_eq!(summary.lines, 0);
        assert_eq!(summary.items, 0);
        assert_eq!(summary.subtotal, Money::from_minor(0, USD));

        Ok(())
    }
}
