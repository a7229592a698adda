//! Order Data

use rusty_money::{Money, iso::Currency};
use storefront::{
    assembly::OrderTotals,
    order_number::OrderNumber,
    status::{OrderStatus, PaymentStatus},
};
use uuid::Uuid;

use crate::domain::{
    addresses::records::AddressUuid,
    orders::records::{OrderItemUuid, OrderUuid},
    users::UserUuid,
};

const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 100;

/// A new order, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub order_number: OrderNumber,
    pub user: UserUuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub totals: OrderTotals,
    pub notes: Option<String>,
    pub shipping_address: AddressUuid,
    pub billing_address: AddressUuid,
}

/// A new order item, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub uuid: OrderItemUuid,
    pub product: Uuid,
    pub quantity: u32,
    pub price: Money<'static, Currency>,

    /// Whether stock was taken for this line when the order was placed.
    pub reserved: bool,
}

/// Page request. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u32,
    per_page: u32,
}

impl Page {
    /// Clamp `page` to at least 1 and `per_page` to `1..=100`.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// One page of results with pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub(crate) fn new(items: Vec<T>, page: Page, total: u64) -> Self {
        Self {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
            total_pages: total.div_ceil(u64::from(page.per_page)),
        }
    }
}

/// Filters for the administrative order listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Administrative status change. `None` leaves a field unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderStatusUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Store-wide order counters.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,

    /// Sum of totals of delivered orders.
    pub revenue: Money<'static, Currency>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_is_clamped() {
        assert_eq!(Page::new(0, 0), Page::new(1, 1));
        assert_eq!(Page::new(3, 1_000).per_page(), MAX_PER_PAGE);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let page = Page::new(3, 20);

        assert_eq!(page.limit(), 20);
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn total_pages_rounds_up() {
        let paginated = Paginated::new(vec![(); 10], Page::new(1, 10), 21);

        assert_eq!(paginated.total_pages, 3);
        assert_eq!(Paginated::<()>::new(Vec::new(), Page::default(), 0).total_pages, 0);
    }
}
