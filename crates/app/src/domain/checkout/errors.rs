//! Checkout errors.

use sqlx::Error;
use storefront::{
    assembly::AssemblyError,
    pricing::PricingError,
    status::OrderStatus,
    validation::{IssueReason, ValidationIssue},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("address not found")]
    AddressNotFound,

    #[error("cart is empty")]
    EmptyCart,

    #[error("cart has {} invalid line(s)", .0.len())]
    CartInvalid(Vec<ValidationIssue>),

    #[error("insufficient stock for product {product}")]
    InsufficientStock { product: Uuid },

    #[error("order not found")]
    NotFound,

    #[error("order cannot be cancelled while {status}")]
    NotCancellable { status: OrderStatus },

    #[error("notes must be at most {max} characters")]
    InvalidNotes { max: usize },

    #[error("order could not be assembled")]
    Assembly(#[from] AssemblyError),

    #[error("cart could not be priced")]
    Pricing(#[from] PricingError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl CheckoutError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AddressNotFound => "ADDRESS_NOT_FOUND",
            Self::EmptyCart => "EMPTY_CART",
            Self::CartInvalid(_) => "CART_INVALID",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::NotFound => "NOT_FOUND",
            Self::NotCancellable { .. } => "NOT_CANCELLABLE",
            Self::InvalidNotes { .. } => "INVALID_NOTES",
            Self::Assembly(_) | Self::Pricing(_) => "PRICING_FAILED",
            Self::Sql(_) => "STORAGE_ERROR",
        }
    }

    /// Whether the checkout lost a race for stock and may succeed on retry
    /// with a smaller quantity.
    ///
    /// A competing checkout that commits first can surface either as a failed
    /// reservation or, when it commits before validation runs, as a cart whose
    /// only problems are stock shortfalls.
    pub fn is_stock_conflict(&self) -> bool {
        match self {
            Self::InsufficientStock { .. } => true,
            Self::CartInvalid(issues) => {
                !issues.is_empty()
                    && issues
                        .iter()
                        .all(|issue| matches!(issue.reason, IssueReason::InsufficientStock { .. }))
            }
            _ => false,
        }
    }
}

impl From<Error> for CheckoutError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            Self::NotFound
        } else {
            Self::Sql(error)
        }
    }
}
