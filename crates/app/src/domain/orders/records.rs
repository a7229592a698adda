//! Order Records

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use storefront::{
    order_number::OrderNumber,
    pricing::{PricingError, add, line_total},
    status::{OrderStatus, PaymentStatus},
};
use uuid::Uuid;

use crate::{
    domain::{addresses::records::AddressUuid, users::UserUuid},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Record
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub order_number: OrderNumber,
    pub user: UserUuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Money<'static, Currency>,
    pub tax_amount: Money<'static, Currency>,
    pub shipping_amount: Money<'static, Currency>,
    pub total: Money<'static, Currency>,
    pub notes: Option<String>,
    pub shipping_address: AddressUuid,
    pub billing_address: AddressUuid,
    pub items: Vec<OrderItemRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrderRecord {
    /// Sum of `quantity × price` over the order's items.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`] if an item is in another currency or the sum overflows.
    pub fn items_subtotal(&self) -> Result<Money<'static, Currency>, PricingError> {
        self.items.iter().try_fold(
            Money::from_minor(0, self.total.currency()),
            |sum, item| add(sum, line_total(&item.price, item.quantity)?),
        )
    }
}

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItemRecord>;

/// Order Item Record
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemRecord {
    pub uuid: OrderItemUuid,
    pub order: OrderUuid,
    pub product: Uuid,
    pub quantity: u32,
    pub price: Money<'static, Currency>,
    pub created_at: Timestamp,
}
