//! Shipping Policies

use std::fmt::Debug;

use rusty_money::{Money, iso::Currency};

use crate::pricing::{PricingError, ensure_currency};

/// Decides the shipping charge for an order from its subtotal.
pub trait ShippingPolicy: Debug + Send + Sync {
    /// Shipping amount owed on an order with the given subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the policy is priced in a different currency to the order.
    fn shipping_for(
        &self,
        subtotal: &Money<'static, Currency>,
    ) -> Result<Money<'static, Currency>, PricingError>;
}

/// Every order ships for free.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeShipping;

impl ShippingPolicy for FreeShipping {
    fn shipping_for(
        &self,
        subtotal: &Money<'static, Currency>,
    ) -> Result<Money<'static, Currency>, PricingError> {
        Ok(Money::from_minor(0, subtotal.currency()))
    }
}

/// Every order pays the same fee.
#[derive(Debug, Clone)]
pub struct FlatRateShipping {
    fee: Money<'static, Currency>,
}

impl FlatRateShipping {
    /// Create a flat rate policy charging `fee`.
    pub fn new(fee: Money<'static, Currency>) -> Self {
        Self { fee }
    }
}

impl ShippingPolicy for FlatRateShipping {
    fn shipping_for(
        &self,
        subtotal: &Money<'static, Currency>,
    ) -> Result<Money<'static, Currency>, PricingError> {
        ensure_currency(&self.fee, subtotal.currency())?;

        Ok(self.fee)
    }
}

/// Orders at or above a threshold ship free, everything else pays a fee.
#[derive(Debug, Clone)]
pub struct FreeOverThresholdShipping {
    fee: Money<'static, Currency>,
    threshold: Money<'static, Currency>,
}

impl FreeOverThresholdShipping {
    /// Create a threshold policy.
    pub fn new(fee: Money<'static, Currency>, threshold: Money<'static, Currency>) -> Self {
        Self { fee, threshold }
    }
}

impl ShippingPolicy for FreeOverThresholdShipping {
    fn shipping_for(
        &self,
        subtotal: &Money<'static, Currency>,
    ) -> Result<Money<'static, Currency>, PricingError> {
        ensure_currency(&self.fee, subtotal.currency())?;
        ensure_currency(&self.threshold, subtotal.currency())?;

        if subtotal.to_minor_units() >= self.threshold.to_minor_units() {
            Ok(Money::from_minor(0, subtotal.currency()))
        } else {
            Ok(self.fee)
        }
    }
}
