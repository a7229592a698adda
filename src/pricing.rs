//! Pricing

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors that can occur while pricing cart lines or orders.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A line price was in a different currency to the order.
    #[error("price in {found} does not match order currency {expected}")]
    CurrencyMismatch {
        /// Order currency code.
        expected: &'static str,

        /// Currency code of the offending price.
        found: &'static str,
    },

    /// An amount could not be represented in minor units.
    #[error("amount overflowed")]
    Overflow,

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A tax rate applied to an order subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// No tax.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Returns the rate as a fraction (`0.08` for 8%).
    pub fn as_fraction(&self) -> Decimal {
        self.0
    }

    /// Tax owed on `amount`, rounded half-up to currency precision.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the result does not fit in minor units.
    pub fn tax_on(
        &self,
        amount: &Money<'static, Currency>,
    ) -> Result<Money<'static, Currency>, PricingError> {
        let minor = fraction_of_minor(self.0, amount.to_minor_units())?;

        Ok(Money::from_minor(minor, amount.currency()))
    }
}

impl From<Percentage> for TaxRate {
    fn from(value: Percentage) -> Self {
        Self(value * Decimal::ONE)
    }
}

/// Multiplies a unit price by a quantity.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the line total does not fit in minor units.
pub fn line_total(
    unit_price: &Money<'static, Currency>,
    quantity: u32,
) -> Result<Money<'static, Currency>, PricingError> {
    let minor = unit_price
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, unit_price.currency()))
}

/// Sums `unit price × quantity` over a set of lines.
///
/// The sum is accumulated exactly and rounded once, at the end, to the
/// currency's precision.
///
/// # Errors
///
/// - [`PricingError::CurrencyMismatch`]: a line is priced in another currency.
/// - [`PricingError::Overflow`]: the sum does not fit in minor units.
pub fn subtotal<'a, I>(
    lines: I,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError>
where
    I: IntoIterator<Item = (&'a Money<'static, Currency>, u32)>,
{
    let sum = lines
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, (price, quantity)| {
            ensure_currency(price, currency)?;

            let line = price
                .amount()
                .checked_mul(Decimal::from(quantity))
                .ok_or(PricingError::Overflow)?;

            acc.checked_add(line).ok_or(PricingError::Overflow)
        })?;

    let rounded = sum.round_dp_with_strategy(currency.exponent, RoundingStrategy::MidpointAwayFromZero);

    Ok(Money::from_decimal(rounded, currency))
}

/// Adds two amounts, surfacing currency mismatches as errors.
///
/// # Errors
///
/// Returns [`PricingError::Money`] when the currencies differ.
pub fn add(
    lhs: Money<'static, Currency>,
    rhs: Money<'static, Currency>,
) -> Result<Money<'static, Currency>, PricingError> {
    Ok(lhs.add(rhs)?)
}

/// Returns an error if `price` is not in `currency`.
///
/// # Errors
///
/// Returns [`PricingError::CurrencyMismatch`] when the currencies differ.
pub fn ensure_currency(
    price: &Money<'static, Currency>,
    currency: &'static Currency,
) -> Result<(), PricingError> {
    if price.currency() == currency {
        Ok(())
    } else {
        Err(PricingError::CurrencyMismatch {
            expected: currency.iso_alpha_code,
            found: price.currency().iso_alpha_code,
        })
    }
}

/// Apply a fraction to a minor unit amount, rounding half away from zero.
fn fraction_of_minor(fraction: Decimal, minor: i64) -> Result<i64, PricingError> {
    let Some(minor) = Decimal::from_i64(minor) else {
        return Err(PricingError::Overflow);
    };

    let applied = fraction.checked_mul(minor).ok_or(PricingError::Overflow)?;

    applied
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::Overflow)
}
