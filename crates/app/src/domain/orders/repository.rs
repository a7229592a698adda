//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use storefront::{
    order_number::{OrderNumber, OrderNumberError},
    status::{OrderStatus, PaymentStatus, StatusParseError},
};
use uuid::Uuid;

use crate::{
    amounts::{decode_error, try_get_count, try_get_currency, try_get_money},
    domain::{
        addresses::records::AddressUuid,
        orders::{
            data::{NewOrder, NewOrderItem, OrderFilter, OrderStats, Page},
            records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderUuid},
        },
        users::UserUuid,
    },
};

const INSERT_ORDER_SQL: &str = include_str!("sql/insert_order.sql");
const INSERT_ORDER_ITEM_SQL: &str = include_str!("sql/insert_order_item.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const GET_ORDER_BY_NUMBER_SQL: &str = include_str!("sql/get_order_by_number.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("sql/get_order_items.sql");
const LIST_ORDERS_SQL: &str = include_str!("sql/list_orders.sql");
const COUNT_ORDERS_SQL: &str = include_str!("sql/count_orders.sql");
const LIST_ALL_ORDERS_SQL: &str = include_str!("sql/list_all_orders.sql");
const COUNT_ALL_ORDERS_SQL: &str = include_str!("sql/count_all_orders.sql");
const ORDER_STATS_SQL: &str = include_str!("sql/order_stats.sql");
const TRANSITION_ORDER_STATUS_SQL: &str = include_str!("sql/transition_order_status.sql");

/// Order and payment status pair.
pub(crate) type Statuses = (OrderStatus, PaymentStatus);

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
    ) -> Result<(), sqlx::Error> {
        let totals = &order.totals;

        query(INSERT_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.order_number.as_str())
            .bind(order.user.into_uuid())
            .bind(order.status.as_str())
            .bind(order.payment_status.as_str())
            .bind(totals.total.currency().iso_alpha_code)
            .bind(totals.subtotal.to_minor_units())
            .bind(totals.tax.to_minor_units())
            .bind(totals.shipping.to_minor_units())
            .bind(totals.total.to_minor_units())
            .bind(order.notes.as_deref())
            .bind(order.shipping_address.into_uuid())
            .bind(order.billing_address.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn insert_order_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: &NewOrderItem,
    ) -> Result<(), sqlx::Error> {
        let quantity =
            i32::try_from(item.quantity).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        query(INSERT_ORDER_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(order.into_uuid())
            .bind(item.product)
            .bind(quantity)
            .bind(item.price.to_minor_units())
            .bind(item.reserved)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Fetch an order with its items. When `user` is given the order must belong to them.
    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        user: Option<UserUuid>,
    ) -> Result<OrderRecord, sqlx::Error> {
        let record = query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(user.map(UserUuid::into_uuid))
            .fetch_one(&mut **tx)
            .await?;

        self.with_items(tx, record).await
    }

    /// Like [`Self::get_order`], holding a row lock until the transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        user: Option<UserUuid>,
    ) -> Result<OrderRecord, sqlx::Error> {
        let record = query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(user.map(UserUuid::into_uuid))
            .fetch_one(&mut **tx)
            .await?;

        self.with_items(tx, record).await
    }

    pub(crate) async fn get_order_by_number(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        number: &OrderNumber,
    ) -> Result<OrderRecord, sqlx::Error> {
        let record = query_as::<Postgres, OrderRecord>(GET_ORDER_BY_NUMBER_SQL)
            .bind(number.as_str())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        self.with_items(tx, record).await
    }

    /// A user's orders, newest first, and the user's total order count.
    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        page: Page,
    ) -> Result<(Vec<OrderRecord>, u64), sqlx::Error> {
        let records = query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .bind(user.into_uuid())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        let total: i64 = query_scalar(COUNT_ORDERS_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok((self.attach_items(tx, records).await?, to_count("total", total)?))
    }

    /// All orders matching `filter`, newest first, and the matching count.
    pub(crate) async fn list_all_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        page: Page,
        filter: OrderFilter,
    ) -> Result<(Vec<OrderRecord>, u64), sqlx::Error> {
        let status = filter.status.map(|status| status.as_str());
        let payment_status = filter.payment_status.map(|status| status.as_str());

        let records = query_as::<Postgres, OrderRecord>(LIST_ALL_ORDERS_SQL)
            .bind(status)
            .bind(payment_status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        let total: i64 = query_scalar(COUNT_ALL_ORDERS_SQL)
            .bind(status)
            .bind(payment_status)
            .fetch_one(&mut **tx)
            .await?;

        Ok((self.attach_items(tx, records).await?, to_count("total", total)?))
    }

    /// Order counters; revenue only counts orders priced in `currency`.
    pub(crate) async fn order_stats(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        currency: &'static Currency,
    ) -> Result<OrderStats, sqlx::Error> {
        let row = query(ORDER_STATS_SQL)
            .bind(currency.iso_alpha_code)
            .fetch_one(&mut **tx)
            .await?;

        Ok(OrderStats {
            total_orders: to_count("total_orders", row.try_get("total_orders")?)?,
            pending_orders: to_count("pending_orders", row.try_get("pending_orders")?)?,
            delivered_orders: to_count("delivered_orders", row.try_get("delivered_orders")?)?,
            cancelled_orders: to_count("cancelled_orders", row.try_get("cancelled_orders")?)?,
            revenue: Money::from_minor(row.try_get("revenue")?, currency),
        })
    }

    /// Move an order from `from` to `to`.
    ///
    /// Returns `false` without changing anything when the order is no longer
    /// in `from`.
    pub(crate) async fn transition_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        from: Statuses,
        to: Statuses,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(TRANSITION_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(to.0.as_str())
            .bind(to.1.as_str())
            .bind(from.0.as_str())
            .bind(from.1.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    async fn with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: OrderRecord,
    ) -> Result<OrderRecord, sqlx::Error> {
        let mut records = self.attach_items(tx, vec![record]).await?;

        records.pop().ok_or(sqlx::Error::RowNotFound)
    }

    async fn attach_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut records: Vec<OrderRecord>,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        if records.is_empty() {
            return Ok(records);
        }

        let uuids: Vec<Uuid> = records.iter().map(|record| record.uuid.into_uuid()).collect();

        let items = query_as::<Postgres, OrderItemRecord>(GET_ORDER_ITEMS_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await?;

        let mut by_order: FxHashMap<OrderUuid, Vec<OrderItemRecord>> = FxHashMap::default();

        for item in items {
            by_order.entry(item.order).or_default().push(item);
        }

        for record in &mut records {
            record.items = by_order.remove(&record.uuid).unwrap_or_default();
        }

        Ok(records)
    }
}

fn to_count(col: &str, value: i64) -> Result<u64, sqlx::Error> {
    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let currency = try_get_currency(row, "currency")?;

        let order_number: String = row.try_get("order_number")?;
        let status: String = row.try_get("status")?;
        let payment_status: String = row.try_get("payment_status")?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            order_number: order_number
                .parse()
                .map_err(|e: OrderNumberError| {
                    decode_error("order_number", e.to_string())
                })?,
            user: UserUuid::from_uuid(row.try_get("user_uuid")?),
            status: status
                .parse()
                .map_err(|e: StatusParseError| {
                    decode_error("status", e.to_string())
                })?,
            payment_status: payment_status
                .parse()
                .map_err(|e: StatusParseError| {
                    decode_error("payment_status", e.to_string())
                })?,
            subtotal: try_get_money(row, "subtotal", currency)?,
            tax_amount: try_get_money(row, "tax_amount", currency)?,
            shipping_amount: try_get_money(row, "shipping_amount", currency)?,
            total: try_get_money(row, "total", currency)?,
            notes: row.try_get("notes")?,
            shipping_address: AddressUuid::from_uuid(row.try_get("shipping_address_uuid")?),
            billing_address: AddressUuid::from_uuid(row.try_get("billing_address_uuid")?),
            items: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let currency = try_get_currency(row, "currency")?;

        Ok(Self {
            uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
            order: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product: row.try_get("product_uuid")?,
            quantity: try_get_count(row, "quantity")?,
            price: try_get_money(row, "price", currency)?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
