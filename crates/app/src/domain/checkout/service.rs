//! Checkout service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use sqlx::{Postgres, Transaction};
use storefront::{
    assembly::{PricingRules, assemble_order},
    cart::{CartLine, CartSummary},
    order_number::OrderNumber,
    products::ProductState,
    status::OrderStatus,
    validation::{CartValidation, ValidatedCart, validate_cart},
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        addresses::{PgAddressesRepository, records::AddressUuid},
        carts::PgCartsRepository,
        checkout::errors::CheckoutError,
        inventory::PgInventoryRepository,
        orders::{
            data::{NewOrder, NewOrderItem},
            records::{OrderItemUuid, OrderRecord, OrderUuid},
            repository::PgOrdersRepository,
        },
        settlement::{ChargeRequest, SettlementDispatcher},
        users::UserUuid,
    },
};

/// Longest accepted order note, in characters.
pub const MAX_NOTES_LEN: usize = 500;

/// Details supplied when placing an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub shipping_address: AddressUuid,
    pub billing_address: AddressUuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PgCheckoutService {
    db: Db,
    rules: PricingRules,
    dispatcher: SettlementDispatcher,
    addresses: PgAddressesRepository,
    carts: PgCartsRepository,
    inventory: PgInventoryRepository,
    orders: PgOrdersRepository,
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(db: Db, rules: PricingRules, dispatcher: SettlementDispatcher) -> Self {
        Self {
            db,
            rules,
            dispatcher,
            addresses: PgAddressesRepository::new(),
            carts: PgCartsRepository::new(),
            inventory: PgInventoryRepository::new(),
            orders: PgOrdersRepository::new(),
        }
    }

    /// The user's cart lines; empty when they have no cart.
    async fn cart_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<CartLine>, sqlx::Error> {
        let Some(cart) = self.carts.find_cart(tx, user).await? else {
            return Ok(Vec::new());
        };

        self.carts
            .get_cart_lines(tx, cart, self.rules.currency)
            .await
    }

    async fn catalog(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        lines: &[CartLine],
    ) -> Result<FxHashMap<Uuid, ProductState>, sqlx::Error> {
        let products: Vec<Uuid> = lines.iter().map(|line| line.product).collect();

        let states = self
            .inventory
            .get_product_states(tx, &products, self.rules.currency)
            .await?;

        Ok(states
            .into_iter()
            .map(|state| (state.uuid, state))
            .collect())
    }
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    #[instrument(skip_all, fields(user = %user), err)]
    async fn validate_cart(&self, user: UserUuid) -> Result<CartValidation, CheckoutError> {
        let mut tx = self.db.begin_transaction().await?;

        let lines = self.cart_lines(&mut tx, user).await?;
        let catalog = self.catalog(&mut tx, &lines).await?;

        tx.commit().await?;

        Ok(validate_cart(&lines, &catalog))
    }

    async fn cart_summary(&self, user: UserUuid) -> Result<CartSummary, CheckoutError> {
        let mut tx = self.db.begin_transaction().await?;

        let lines = self.cart_lines(&mut tx, user).await?;

        tx.commit().await?;

        Ok(CartSummary::of(&lines, self.rules.currency)?)
    }

    #[instrument(skip_all, fields(user = %user), err)]
    async fn place_order(
        &self,
        user: UserUuid,
        request: PlaceOrder,
    ) -> Result<OrderRecord, CheckoutError> {
        if request
            .notes
            .as_ref()
            .is_some_and(|notes| notes.chars().count() > MAX_NOTES_LEN)
        {
            return Err(CheckoutError::InvalidNotes { max: MAX_NOTES_LEN });
        }

        let mut tx = self.db.begin_transaction().await?;

        for address in [request.shipping_address, request.billing_address] {
            let owned = self
                .addresses
                .get_owned_address(&mut tx, user, address)
                .await?;

            if owned.is_none() {
                return Err(CheckoutError::AddressNotFound);
            }
        }

        let Some(cart) = self.carts.lock_cart(&mut tx, user).await? else {
            return Err(CheckoutError::EmptyCart);
        };

        let lines = self
            .carts
            .get_cart_lines(&mut tx, cart, self.rules.currency)
            .await?;

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let catalog = self.catalog(&mut tx, &lines).await?;

        let validated = ValidatedCart::try_new(&lines, &catalog)
            .map_err(|report| CheckoutError::CartInvalid(report.into_issues()))?;

        let assembled = assemble_order(&validated, &self.rules)?;

        let uuid = OrderUuid::new();
        let order_number =
            OrderNumber::generate(Timestamp::now().as_millisecond(), &mut rand::thread_rng());

        self.orders
            .insert_order(
                &mut tx,
                &NewOrder {
                    uuid,
                    order_number,
                    user,
                    status: assembled.status,
                    payment_status: assembled.payment_status,
                    totals: assembled.totals,
                    notes: request.notes,
                    shipping_address: request.shipping_address,
                    billing_address: request.billing_address,
                },
            )
            .await?;

        for line in &assembled.lines {
            self.orders
                .insert_order_item(
                    &mut tx,
                    uuid,
                    &NewOrderItem {
                        uuid: OrderItemUuid::new(),
                        product: line.product,
                        quantity: line.quantity,
                        price: line.price,
                        reserved: line.track_quantity,
                    },
                )
                .await?;
        }

        // Reserve in product order so concurrent checkouts lock rows consistently.
        let mut reservations: Vec<_> = assembled
            .lines
            .iter()
            .filter(|line| line.track_quantity)
            .collect();

        reservations.sort_by_key(|line| line.product);

        for line in reservations {
            if !self
                .inventory
                .reserve(&mut tx, line.product, line.quantity)
                .await?
            {
                warn!(product = %line.product, quantity = line.quantity, "stock ran out during checkout");

                return Err(CheckoutError::InsufficientStock {
                    product: line.product,
                });
            }
        }

        self.carts.clear_cart(&mut tx, cart).await?;

        let record = self.orders.get_order(&mut tx, uuid, Some(user)).await?;

        tx.commit().await?;

        info!(
            order = %record.uuid,
            order_number = %record.order_number,
            total = %record.total,
            "order placed"
        );

        self.dispatcher
            .dispatch(ChargeRequest {
                order: record.uuid,
                order_number: record.order_number.clone(),
                amount: record.total,
            })
            .await;

        Ok(record)
    }

    #[instrument(skip_all, fields(user = %user, order = %order), err)]
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, CheckoutError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders.lock_order(&mut tx, order, Some(user)).await?;

        if current.status != OrderStatus::Pending {
            return Err(CheckoutError::NotCancellable {
                status: current.status,
            });
        }

        let applied = self
            .orders
            .transition_status(
                &mut tx,
                order,
                (current.status, current.payment_status),
                (OrderStatus::Cancelled, current.payment_status),
            )
            .await?;

        if !applied {
            return Err(CheckoutError::NotCancellable {
                status: current.status,
            });
        }

        let released = self.inventory.release_reservation(&mut tx, order).await?;

        let record = self.orders.get_order(&mut tx, order, Some(user)).await?;

        tx.commit().await?;

        info!(released, "order cancelled");

        Ok(record)
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Check every line of the user's cart against current product state.
    ///
    /// A user without a cart has nothing to fix, so the result is valid.
    async fn validate_cart(&self, user: UserUuid) -> Result<CartValidation, CheckoutError>;

    /// Line count, item count and subtotal of the user's cart.
    async fn cart_summary(&self, user: UserUuid) -> Result<CartSummary, CheckoutError>;

    /// Turn the user's cart into a pending order.
    ///
    /// Validation, order creation, stock reservation and emptying the cart
    /// happen in one transaction; on error nothing is written. Payment is
    /// settled in the background afterwards.
    async fn place_order(
        &self,
        user: UserUuid,
        request: PlaceOrder,
    ) -> Result<OrderRecord, CheckoutError>;

    /// Cancel one of the user's pending orders and return its stock.
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, CheckoutError>;
}
