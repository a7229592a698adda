//! Cart Validation

use std::fmt::{Display, Formatter, Result as FmtResult};

use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    cart::CartLine,
    products::{ProductCatalog, ProductState},
};

/// Why a cart line cannot be checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueReason {
    /// The product no longer exists.
    ProductMissing,

    /// The product exists but is not for sale.
    ProductInactive,

    /// The product tracks stock and has fewer units than requested.
    InsufficientStock {
        /// Units currently available.
        available: u32,
    },
}

impl IssueReason {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProductMissing => "PRODUCT_MISSING",
            Self::ProductInactive => "PRODUCT_INACTIVE",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
        }
    }
}

impl Display for IssueReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.code())
    }
}

/// A problem with one cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// The offending cart line.
    pub line: Uuid,

    /// The product the line refers to.
    pub product: Uuid,

    /// Reason code.
    pub reason: IssueReason,

    /// Human readable detail.
    pub detail: String,
}

impl ValidationIssue {
    fn new(line: &CartLine, reason: IssueReason) -> Self {
        let detail = match reason {
            IssueReason::ProductMissing => "Product no longer exists".to_string(),
            IssueReason::ProductInactive => "Product is no longer available".to_string(),
            IssueReason::InsufficientStock { available } => {
                format!("Only {available} items available")
            }
        };

        Self {
            line: line.uuid,
            product: line.product,
            reason,
            detail,
        }
    }
}

/// Outcome of validating a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("cart has {} invalid line(s)", .issues.len())]
pub struct CartValidation {
    issues: Vec<ValidationIssue>,
}

impl CartValidation {
    /// Whether the cart can be checked out.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues found, in cart line order.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consume the validation, returning its issues.
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

/// Checks every cart line against current product state.
///
/// Each line is checked for existence, then active status, then (for tracked
/// products) available stock. Only the first failing check is reported per line.
pub fn validate_cart<C>(lines: &[CartLine], catalog: &C) -> CartValidation
where
    C: ProductCatalog + ?Sized,
{
    let issues = lines
        .iter()
        .filter_map(|line| check_line(line, catalog.product(line.product)).err())
        .collect();

    CartValidation { issues }
}

fn check_line<'a>(
    line: &CartLine,
    product: Option<&'a ProductState>,
) -> Result<&'a ProductState, ValidationIssue> {
    let Some(product) = product else {
        return Err(ValidationIssue::new(line, IssueReason::ProductMissing));
    };

    if !product.is_active {
        return Err(ValidationIssue::new(line, IssueReason::ProductInactive));
    }

    if !product.has_stock_for(line.quantity) {
        return Err(ValidationIssue::new(
            line,
            IssueReason::InsufficientStock {
                available: product.quantity,
            },
        ));
    }

    Ok(product)
}

/// A cart line paired with the product state it was validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    /// Cart item identifier.
    pub line: Uuid,

    /// Product identifier.
    pub product: Uuid,

    /// Requested quantity.
    pub quantity: u32,

    /// Product price at validation time.
    pub price: Money<'static, Currency>,

    /// Whether stock must be reserved for this line.
    pub track_quantity: bool,
}

/// A cart that passed validation, priced from current product state.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCart {
    lines: Vec<PricedLine>,
}

impl ValidatedCart {
    /// Validate `lines` and, if every line passes, price them from `catalog`.
    ///
    /// # Errors
    ///
    /// Returns the [`CartValidation`] report when any line fails.
    pub fn try_new<C>(lines: &[CartLine], catalog: &C) -> Result<Self, CartValidation>
    where
        C: ProductCatalog + ?Sized,
    {
        let mut priced = Vec::with_capacity(lines.len());
        let mut issues = Vec::new();

        for line in lines {
            match check_line(line, catalog.product(line.product)) {
                Ok(product) => priced.push(PricedLine {
                    line: line.uuid,
                    product: line.product,
                    quantity: line.quantity,
                    price: product.price,
                    track_quantity: product.track_quantity,
                }),
                Err(issue) => issues.push(issue),
            }
        }

        if issues.is_empty() {
            Ok(Self { lines: priced })
        } else {
            Err(CartValidation { issues })
        }
    }

    /// Priced lines, in cart order.
    pub fn lines(&self) -> &[PricedLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashMap;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    fn product(quantity: u32) -> ProductState {
        ProductState {
            uuid: Uuid::now_v7(),
            price: Money::from_minor(10_00, USD),
            track_quantity: true,
            quantity,
            is_active: true,
        }
    }

    fn line_for(product: &ProductState, quantity: u32) -> CartLine {
        CartLine {
            uuid: Uuid::now_v7(),
            product: product.uuid,
            quantity,
            unit_price: product.price,
        }
    }

    fn catalog(products: &[ProductState]) -> FxHashMap<Uuid, ProductState> {
        products.iter().map(|p| (p.uuid, p.clone())).collect()
    }

    #[test]
    fn valid_cart_has_no_issues() {
        let a = product(5);
        let lines = [line_for(&a, 3)];

        let validation = validate_cart(&lines, &catalog(&[a]));

        assert!(validation.is_valid());
        assert!(validation.issues().is_empty());
    }

    #[test]
    fn missing_product_is_reported() {
        let a = product(5);
        let lines = [line_for(&a, 1)];

        let validation = validate_cart(&lines, &catalog(&[]));

        assert!(!validation.is_valid());
        assert_eq!(validation.issues().len(), 1);
        assert_eq!(
            validation.issues().first().map(|i| i.reason),
            Some(IssueReason::ProductMissing)
        );
    }

    #[test]
    fn inactive_is_reported_before_stock() {
        let mut a = product(0);
        a.is_active = false;
        let lines = [line_for(&a, 3)];

        let validation = validate_cart(&lines, &catalog(&[a]));

        assert_eq!(validation.issues().len(), 1, "one issue per line at most");
        assert_eq!(
            validation.issues().first().map(|i| i.reason),
            Some(IssueReason::ProductInactive)
        );
    }

    #[test]
    fn insufficient_stock_carries_available_quantity() {
        let a = product(2);
        let lines = [line_for(&a, 3)];

        let validation = validate_cart(&lines, &catalog(&[a]));
        let issue = validation.issues().first().cloned();

        assert_eq!(
            issue.as_ref().map(|i| i.reason),
            Some(IssueReason::InsufficientStock { available: 2 })
        );
        assert_eq!(
            issue.map(|i| i.detail),
            Some("Only 2 items available".to_string())
        );
    }

    #[test]
    fn untracked_products_skip_stock_check() {
        let mut a = product(0);
        a.track_quantity = false;
        let lines = [line_for(&a, 100)];

        assert!(validate_cart(&lines, &catalog(&[a])).is_valid());
    }

    #[test]
    fn every_failing_line_is_reported_in_order() {
        let a = product(1);
        let b = product(10);
        let lines = [line_for(&a, 2), line_for(&b, 1), line_for(&product(1), 1)];

        let validation = validate_cart(&lines, &catalog(&[a, b]));
        let reasons: Vec<_> = validation.issues().iter().map(|i| i.reason.code()).collect();

        assert_eq!(reasons, ["INSUFFICIENT_STOCK", "PRODUCT_MISSING"]);
    }

    #[test]
    fn validated_cart_uses_current_product_price() -> TestResult {
        let mut a = product(5);
        let mut line = line_for(&a, 2);
        line.unit_price = Money::from_minor(8_00, USD);
        a.price = Money::from_minor(12_00, USD);

        let cart = ValidatedCart::try_new(&[line], &catalog(&[a]))?;

        assert_eq!(
            cart.lines().first().map(|l| l.price),
            Some(Money::from_minor(12_00, USD))
        );

        Ok(())
    }

    #[test]
    fn validated_cart_rejects_invalid_lines() {
        let a = product(1);
        let lines = [line_for(&a, 2)];

        let result = ValidatedCart::try_new(&lines, &catalog(&[a]));

        assert!(
            matches!(&result, Err(validation) if validation.issues().len() == 1),
            "expected one issue, got {result:?}"
        );
    }
}
