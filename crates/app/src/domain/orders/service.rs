//! Orders service.

use async_trait::async_trait;
use mockall::automock;
use rusty_money::iso::Currency;
use storefront::order_number::OrderNumber;
use tracing::{info, instrument};

use crate::{
    database::Db,
    domain::{
        inventory::PgInventoryRepository,
        orders::{
            data::{OrderFilter, OrderStats, OrderStatusUpdate, Page, Paginated},
            errors::OrdersServiceError,
            records::{OrderRecord, OrderUuid},
            repository::PgOrdersRepository,
        },
        users::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    currency: &'static Currency,
    repository: PgOrdersRepository,
    inventory: PgInventoryRepository,
}

impl PgOrdersService {
    /// `currency` is the store currency that revenue is reported in.
    #[must_use]
    pub fn new(db: Db, currency: &'static Currency) -> Self {
        Self {
            db,
            currency,
            repository: PgOrdersRepository::new(),
            inventory: PgInventoryRepository::new(),
        }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.repository.get_order(&mut tx, order, Some(user)).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_order_by_number(
        &self,
        user: UserUuid,
        number: OrderNumber,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self
            .repository
            .get_order_by_number(&mut tx, user, &number)
            .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_orders(
        &self,
        user: UserUuid,
        page: Page,
    ) -> Result<Paginated<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let (records, total) = self.repository.list_orders(&mut tx, user, page).await?;

        tx.commit().await?;

        Ok(Paginated::new(records, page, total))
    }

    async fn list_all_orders(
        &self,
        page: Page,
        filter: OrderFilter,
    ) -> Result<Paginated<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let (records, total) = self
            .repository
            .list_all_orders(&mut tx, page, filter)
            .await?;

        tx.commit().await?;

        Ok(Paginated::new(records, page, total))
    }

    #[instrument(skip_all, fields(order = %order, update = ?update), err)]
    async fn update_order_status(
        &self,
        order: OrderUuid,
        update: OrderStatusUpdate,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.repository.lock_order(&mut tx, order, None).await?;

        let status = match update.status {
            Some(next) if next != current.status => current.status.transition_to(next)?,
            _ => current.status,
        };

        let payment_status = match update.payment_status {
            Some(next) if next != current.payment_status => {
                current.payment_status.transition_to(next)?
            }
            _ => current.payment_status,
        };

        if (status, payment_status) == (current.status, current.payment_status) {
            return Ok(current);
        }

        let applied = self
            .repository
            .transition_status(
                &mut tx,
                order,
                (current.status, current.payment_status),
                (status, payment_status),
            )
            .await?;

        if !applied {
            return Err(OrdersServiceError::Conflict);
        }

        if status != current.status && current.status.releases_reservation(status) {
            let released = self.inventory.release_reservation(&mut tx, order).await?;

            info!(released, "released reserved stock");
        }

        let record = self.repository.get_order(&mut tx, order, None).await?;

        tx.commit().await?;

        info!(
            from = %current.status,
            to = %record.status,
            payment_status = %record.payment_status,
            "order status updated"
        );

        Ok(record)
    }

    async fn order_stats(&self) -> Result<OrderStats, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let stats = self.repository.order_stats(&mut tx, self.currency).await?;

        tx.commit().await?;

        Ok(stats)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Retrieve one of the user's orders.
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve one of the user's orders by its order number.
    async fn get_order_by_number(
        &self,
        user: UserUuid,
        number: OrderNumber,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// The user's orders, newest first.
    async fn list_orders(
        &self,
        user: UserUuid,
        page: Page,
    ) -> Result<Paginated<OrderRecord>, OrdersServiceError>;

    /// Every order, newest first, optionally filtered by status.
    async fn list_all_orders(
        &self,
        page: Page,
        filter: OrderFilter,
    ) -> Result<Paginated<OrderRecord>, OrdersServiceError>;

    /// Administrative status change.
    ///
    /// Each changed field must follow its state machine. Cancelling or
    /// refunding a live order hands its reserved stock back.
    async fn update_order_status(
        &self,
        order: OrderUuid,
        update: OrderStatusUpdate,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Store-wide order counters.
    async fn order_stats(&self) -> Result<OrderStats, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use storefront::status::{OrderStatus, PaymentStatus, SettlementOutcome, TransitionError};
    use testresult::TestResult;

    use crate::{
        domain::{
            checkout::CheckoutService,
            settlement::{Resolution, SettlementService},
        },
        test::{
            TestContext,
            helpers::{Shopper, add_to_cart, create_product, create_shopper, product_quantity},
        },
    };

    use super::*;

    async fn place(
        ctx: &TestContext,
        shopper: &Shopper,
        price: i64,
        quantity: i32,
    ) -> TestResult<OrderRecord> {
        let product = create_product(ctx, price, 100).await;

        add_to_cart(ctx, shopper.user, product, quantity).await;

        Ok(ctx
            .checkout
            .place_order(shopper.user, shopper.place_order())
            .await?)
    }

    async fn confirmed(ctx: &TestContext, shopper: &Shopper) -> TestResult<OrderRecord> {
        let order = place(ctx, shopper, 10_00, 1).await?;

        ctx.settlement
            .resolve(order.uuid, SettlementOutcome::Succeeded)
            .await?;

        Ok(order)
    }

    #[tokio::test]
    async fn orders_are_readable_by_their_owner_only() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = create_shopper(&ctx).await;
        let other = create_shopper(&ctx).await;

        let order = place(&ctx, &owner, 10_00, 2).await?;

        let by_uuid = ctx.orders.get_order(owner.user, order.uuid).await?;
        let by_number = ctx
            .orders
            .get_order_by_number(owner.user, order.order_number.clone())
            .await?;

        assert_eq!(by_uuid, order);
        assert_eq!(by_number, order);

        let hidden = ctx.orders.get_order(other.user, order.uuid).await;
        let hidden_by_number = ctx
            .orders
            .get_order_by_number(other.user, order.order_number.clone())
            .await;

        assert!(
            matches!(hidden, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {hidden:?}"
        );
        assert!(
            matches!(hidden_by_number, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {hidden_by_number:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn list_orders_pages_newest_first() -> TestResult {
        let ctx = TestContext::new().await;
        let shopper = create_shopper(&ctx).await;
        let other = create_shopper(&ctx).await;

        let mut placed = Vec::new();

        for _ in 0..3 {
            placed.push(place(&ctx, &shopper, 1_00, 1).await?.uuid);
        }

        place(&ctx, &other, 1_00, 1).await?;

        let first = ctx.orders.list_orders(shopper.user, Page::new(1, 2)).await?;
        let second = ctx.orders.list_orders(shopper.user, Page::new(2, 2)).await?;

        let listed: Vec<_> = first
            .items
            .iter()
            .chain(&second.items)
            .map(|order| order.uuid)
            .collect();

        placed.reverse();

        assert_eq!(listed, placed);
        assert_eq!(first.total, 3);
        assert_eq!(first.total_pages, 2);
        assert_eq!(second.items.len(), 1);
        assert!(first.items.iter().all(|order| order.items.len() == 1));

        Ok(())
    }

    #[tokio::test]
    async fn list_all_orders_filters_by_status() -> TestResult {
        let ctx = TestContext::new().await;
        let a = create_shopper(&ctx).await;
        let b = create_shopper(&ctx).await;

        confirmed(&ctx, &a).await?;
        place(&ctx, &b, 1_00, 1).await?;
        place(&ctx, &b, 1_00, 1).await?;

        let everything = ctx
            .orders
            .list_all_orders(Page::default(), OrderFilter::default())
            .await?;

        let pending = ctx
            .orders
            .list_all_orders(
                Page::default(),
                OrderFilter {
                    status: Some(OrderStatus::Pending),
                    payment_status: None,
                },
            )
            .await?;

        let completed = ctx
            .orders
            .list_all_orders(
                Page::default(),
                OrderFilter {
                    status: None,
                    payment_status: Some(PaymentStatus::Completed),
                },
            )
            .await?;

        assert_eq!(everything.total, 3);
        assert_eq!(pending.total, 2);
        assert!(pending.items.iter().all(|order| order.user == b.user));
        assert_eq!(completed.total, 1);

        Ok(())
    }

    #[tokio::test]
    async fn fulfilment_follows_the_state_machine() -> TestResult {
        let ctx = TestContext::new().await;
        let shopper = create_shopper(&ctx).await;
        let order = confirmed(&ctx, &shopper).await?;

        for status in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            let updated = ctx
                .orders
                .update_order_status(
                    order.uuid,
                    OrderStatusUpdate {
                        status: Some(status),
                        payment_status: None,
                    },
                )
                .await?;

            assert_eq!(updated.status, status);
        }

        let result = ctx
            .orders
            .update_order_status(
                order.uuid,
                OrderStatusUpdate {
                    status: Some(OrderStatus::Refunded),
                    payment_status: None,
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::InvalidTransition(TransitionError::Order {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Refunded,
                }))
            ),
            "expected InvalidTransition, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn skipping_ahead_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let shopper = create_shopper(&ctx).await;
        let order = place(&ctx, &shopper, 10_00, 1).await?;

        let result = ctx
            .orders
            .update_order_status(
                order.uuid,
                OrderStatusUpdate {
                    status: Some(OrderStatus::Shipped),
                    payment_status: None,
                },
            )
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidTransition(_))),
            "expected InvalidTransition, got {result:?}"
        );

        let unchanged = ctx.orders.get_order(shopper.user, order.uuid).await?;

        assert_eq!(unchanged.status, OrderStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn refunding_a_shipped_order_releases_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let shopper = create_shopper(&ctx).await;
        let product = create_product(&ctx, 10_00, 5).await;

        add_to_cart(&ctx, shopper.user, product, 2).await;

        let order = ctx
            .checkout
            .place_order(shopper.user, shopper.place_order())
            .await?;

        ctx.settlement
            .resolve(order.uuid, SettlementOutcome::Succeeded)
            .await?;

        for status in [OrderStatus::Processing, OrderStatus::Shipped] {
            ctx.orders
                .update_order_status(
                    order.uuid,
                    OrderStatusUpdate {
                        status: Some(status),
                        payment_status: None,
                    },
                )
                .await?;
        }

        assert_eq!(product_quantity(&ctx, product).await, 3);

        let refunded = ctx
            .orders
            .update_order_status(
                order.uuid,
                OrderStatusUpdate {
                    status: Some(OrderStatus::Refunded),
                    payment_status: Some(PaymentStatus::Refunded),
                },
            )
            .await?;

        assert_eq!(refunded.status, OrderStatus::Refunded);
        assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
        assert_eq!(product_quantity(&ctx, product).await, 5);

        Ok(())
    }

    #[tokio::test]
    async fn administrative_cancel_of_a_pending_order_releases_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let shopper = create_shopper(&ctx).await;
        let product = create_product(&ctx, 10_00, 5).await;

        add_to_cart(&ctx, shopper.user, product, 4).await;

        let order = ctx
            .checkout
            .place_order(shopper.user, shopper.place_order())
            .await?;

        let cancelled = ctx
            .orders
            .update_order_status(
                order.uuid,
                OrderStatusUpdate {
                    status: Some(OrderStatus::Cancelled),
                    payment_status: None,
                },
            )
            .await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(product_quantity(&ctx, product).await, 5);

        // Settlement arriving later must not touch the cancelled order.
        let resolution = ctx
            .settlement
            .resolve(order.uuid, SettlementOutcome::Failed)
            .await?;

        assert_eq!(resolution, Resolution::Skipped);
        assert_eq!(product_quantity(&ctx, product).await, 5);

        Ok(())
    }

    #[tokio::test]
    async fn unchanged_status_is_a_no_op() -> TestResult {
        let ctx = TestContext::new().await;
        let shopper = create_shopper(&ctx).await;
        let order = place(&ctx, &shopper, 10_00, 1).await?;

        let same = ctx
            .orders
            .update_order_status(
                order.uuid,
                OrderStatusUpdate {
                    status: Some(OrderStatus::Pending),
                    payment_status: None,
                },
            )
            .await?;

        assert_eq!(same, order);

        let missing = ctx
            .orders
            .update_order_status(OrderUuid::new(), OrderStatusUpdate::default())
            .await;

        assert!(
            matches!(missing, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {missing:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn stats_count_orders_and_delivered_revenue() -> TestResult {
        let ctx = TestContext::new().await;
        let shopper = create_shopper(&ctx).await;

        let delivered = confirmed(&ctx, &shopper).await?;

        for status in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            ctx.orders
                .update_order_status(
                    delivered.uuid,
                    OrderStatusUpdate {
                        status: Some(status),
                        payment_status: None,
                    },
                )
                .await?;
        }

        let cancelled = place(&ctx, &shopper, 5_00, 1).await?;
        ctx.checkout.cancel_order(shopper.user, cancelled.uuid).await?;

        place(&ctx, &shopper, 7_00, 1).await?;

        let stats = ctx.orders.order_stats().await?;

        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.delivered_orders, 1);
        assert_eq!(stats.cancelled_orders, 1);
        // 10.00 + 0.80 tax
        assert_eq!(stats.revenue, Money::from_minor(10_80, USD));

        Ok(())
    }
}
