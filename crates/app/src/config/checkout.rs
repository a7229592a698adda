//! Checkout Config

use std::sync::Arc;

use clap::Args;
use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use storefront::{
    assembly::PricingRules,
    pricing::TaxRate,
    shipping::{FlatRateShipping, FreeOverThresholdShipping, FreeShipping, ShippingPolicy},
};

use super::ConfigError;

/// Pricing settings.
#[derive(Debug, Args)]
pub(crate) struct CheckoutConfig {
    /// Tax rate applied to order subtotals, as a fraction (0.08 is 8%)
    #[arg(long, env = "CHECKOUT_TAX_RATE", default_value = "0.08")]
    pub(crate) tax_rate: Decimal,

    /// ISO 4217 code of the store currency
    #[arg(long, env = "CHECKOUT_CURRENCY", default_value = "USD")]
    pub(crate) currency: String,

    /// Flat shipping fee in minor units; shipping is free when unset
    #[arg(long, env = "CHECKOUT_FLAT_SHIPPING")]
    pub(crate) flat_shipping: Option<i64>,

    /// Subtotal in minor units from which the flat fee is waived
    #[arg(long, env = "CHECKOUT_FREE_SHIPPING_THRESHOLD", requires = "flat_shipping")]
    pub(crate) free_shipping_threshold: Option<i64>,
}

impl CheckoutConfig {
    /// Build the pricing rules orders are assembled with.
    pub(crate) fn pricing_rules(&self) -> Result<PricingRules, ConfigError> {
        let currency = iso::find(&self.currency.to_ascii_uppercase())
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))?;

        if self.tax_rate.is_sign_negative() || self.tax_rate > Decimal::ONE {
            return Err(ConfigError::InvalidTaxRate(self.tax_rate));
        }

        let tax_rate = TaxRate::from(Percentage::from(self.tax_rate));

        Ok(PricingRules::new(currency, tax_rate).with_shipping(self.shipping(currency)?))
    }

    fn shipping(
        &self,
        currency: &'static Currency,
    ) -> Result<Arc<dyn ShippingPolicy>, ConfigError> {
        let Some(fee) = self.flat_shipping else {
            return Ok(Arc::new(FreeShipping));
        };

        let fee = Money::from_minor(non_negative("flat shipping", fee)?, currency);

        Ok(match self.free_shipping_threshold {
            Some(threshold) => Arc::new(FreeOverThresholdShipping::new(
                fee,
                Money::from_minor(non_negative("free shipping threshold", threshold)?, currency),
            )),
            None => Arc::new(FlatRateShipping::new(fee)),
        })
    }
}

fn non_negative(name: &'static str, value: i64) -> Result<i64, ConfigError> {
    if value < 0 {
        Err(ConfigError::NegativeAmount { name, value })
    } else {
        Ok(value)
    }
}
