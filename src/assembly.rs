//! Order Assembly
//!
//! Turns a validated cart into the totals and line items of a new order. Nothing
//! here touches storage; the caller decides how and when to persist the result.

use std::{fmt::Debug, sync::Arc};

use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    pricing::{PricingError, TaxRate, add, ensure_currency, subtotal},
    shipping::{FreeShipping, ShippingPolicy},
    status::{OrderStatus, PaymentStatus},
    validation::ValidatedCart,
};

/// Errors raised while assembling an order.
#[derive(Debug, Error, PartialEq)]
pub enum AssemblyError {
    /// The cart had no lines.
    #[error("cannot assemble an order from an empty cart")]
    EmptyCart,

    /// Money arithmetic failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Store-wide rules used to price an order.
#[derive(Debug, Clone)]
pub struct PricingRules {
    /// Currency every order is priced in.
    pub currency: &'static Currency,

    /// Tax applied to the subtotal.
    pub tax_rate: TaxRate,

    /// Shipping charged on the subtotal.
    pub shipping: Arc<dyn ShippingPolicy>,
}

impl PricingRules {
    /// Rules with the given currency and tax rate and free shipping.
    pub fn new(currency: &'static Currency, tax_rate: TaxRate) -> Self {
        Self {
            currency,
            tax_rate,
            shipping: Arc::new(FreeShipping),
        }
    }

    /// Replace the shipping policy.
    #[must_use]
    pub fn with_shipping(mut self, shipping: Arc<dyn ShippingPolicy>) -> Self {
        self.shipping = shipping;
        self
    }
}

/// Monetary totals of an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotals {
    /// Sum of line prices.
    pub subtotal: Money<'static, Currency>,

    /// Tax on the subtotal.
    pub tax: Money<'static, Currency>,

    /// Shipping charge.
    pub shipping: Money<'static, Currency>,

    /// `subtotal + tax + shipping`.
    pub total: Money<'static, Currency>,
}

impl OrderTotals {
    /// Whether `total == subtotal + tax + shipping`.
    pub fn is_balanced(&self) -> bool {
        let parts = self
            .subtotal
            .to_minor_units()
            .checked_add(self.tax.to_minor_units())
            .and_then(|sum| sum.checked_add(self.shipping.to_minor_units()));

        parts == Some(self.total.to_minor_units())
    }
}

/// A line of an assembled order. The price is fixed at assembly time.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledLine {
    /// Product ordered.
    pub product: Uuid,

    /// Units ordered.
    pub quantity: u32,

    /// Unit price captured from the product.
    pub price: Money<'static, Currency>,

    /// Whether the product's stock must be reserved.
    pub track_quantity: bool,
}

/// An order ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledOrder {
    /// Initial order status.
    pub status: OrderStatus,

    /// Initial payment status.
    pub payment_status: PaymentStatus,

    /// Totals.
    pub totals: OrderTotals,

    /// One line per cart line.
    pub lines: Vec<AssembledLine>,
}

/// Compute totals and build line items for a validated cart.
///
/// The subtotal is rounded once on the final sum. Tax is the subtotal times
/// the tax rate, rounded half-up. Shipping comes from the pricing rules.
///
/// # Errors
///
/// - [`AssemblyError::EmptyCart`]: the cart has no lines.
/// - [`AssemblyError::Pricing`]: a price is in the wrong currency or an amount overflowed.
pub fn assemble_order(
    cart: &ValidatedCart,
    rules: &PricingRules,
) -> Result<AssembledOrder, AssemblyError> {
    if cart.is_empty() {
        return Err(AssemblyError::EmptyCart);
    }

    let subtotal = subtotal(
        cart.lines().iter().map(|line| (&line.price, line.quantity)),
        rules.currency,
    )?;

    let tax = rules.tax_rate.tax_on(&subtotal)?;
    let shipping = rules.shipping.shipping_for(&subtotal)?;
    ensure_currency(&shipping, rules.currency)?;

    let total = add(add(subtotal, tax)?, shipping)?;

    let lines = cart
        .lines()
        .iter()
        .map(|line| AssembledLine {
            product: line.product,
            quantity: line.quantity,
            price: line.price,
            track_quantity: line.track_quantity,
        })
        .collect();

    Ok(AssembledOrder {
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        totals: OrderTotals {
            subtotal,
            tax,
            shipping,
            total,
        },
        lines,
    })
}
