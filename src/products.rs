//! Products

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use uuid::Uuid;

/// Authoritative state of a product, as seen at checkout time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductState {
    /// Product identifier.
    pub uuid: Uuid,

    /// Current price.
    pub price: Money<'static, Currency>,

    /// Whether stock is counted for this product.
    pub track_quantity: bool,

    /// Units available. Only meaningful when `track_quantity` is set.
    pub quantity: u32,

    /// Whether the product can currently be sold.
    pub is_active: bool,
}

impl ProductState {
    /// Whether `requested` units can be taken from stock.
    pub fn has_stock_for(&self, requested: u32) -> bool {
        !self.track_quantity || self.quantity >= requested
    }
}

/// Lookup of product state by identifier.
pub trait ProductCatalog {
    /// Returns the product, or `None` if it no longer exists.
    fn product(&self, uuid: Uuid) -> Option<&ProductState>;
}

impl ProductCatalog for FxHashMap<Uuid, ProductState> {
    fn product(&self, uuid: Uuid) -> Option<&ProductState> {
        self.get(&uuid)
    }
}

impl ProductCatalog for [ProductState] {
    fn product(&self, uuid: Uuid) -> Option<&ProductState> {
        self.iter().find(|product| product.uuid == uuid)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    fn product(track_quantity: bool, quantity: u32) -> ProductState {
        ProductState {
            uuid: Uuid::now_v7(),
            price: Money::from_minor(10_00, USD),
            track_quantity,
            quantity,
            is_active: true,
        }
    }

    #[test]
    fn tracked_product_needs_enough_stock() {
        let product = product(true, 5);

        assert!(product.has_stock_for(5));
        assert!(!product.has_stock_for(6));
    }

    #[test]
    fn untracked_product_always_has_stock() {
        let product = product(false, 0);

        assert!(product.has_stock_for(1_000));
    }

    #[test]
    fn slice_catalog_finds_by_uuid() -> TestResult {
        let products = [product(true, 1), product(true, 2)];
        let wanted = products.get(1).ok_or("missing product")?.uuid;

        assert_eq!(
            products.as_slice().product(wanted).map(|p| p.quantity),
            Some(2)
        );
        assert!(products.as_slice().product(Uuid::now_v7()).is_none());

        Ok(())
    }
}
