//! Inventory Repository

use rusty_money::iso::Currency;
use sqlx::{Postgres, Row, Transaction, postgres::PgRow, query};
use storefront::products::ProductState;
use uuid::Uuid;

use crate::{
    amounts::{try_get_count, try_get_money},
    domain::orders::records::OrderUuid,
};

const GET_PRODUCT_STATES_SQL: &str = include_str!("sql/get_product_states.sql");
const RESERVE_STOCK_SQL: &str = include_str!("sql/reserve_stock.sql");
const RELEASE_RESERVATION_SQL: &str = include_str!("sql/release_reservation.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgInventoryRepository;

impl PgInventoryRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Current state of the given products. Soft-deleted products are omitted.
    pub(crate) async fn get_product_states(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[Uuid],
        currency: &'static Currency,
    ) -> Result<Vec<ProductState>, sqlx::Error> {
        let rows = query(GET_PRODUCT_STATES_SQL)
            .bind(products)
            .fetch_all(&mut **tx)
            .await?;

        rows.iter()
            .map(|row| product_state_from_row(row, currency))
            .collect()
    }

    /// Take `quantity` units of a tracked product out of stock.
    ///
    /// Returns `false`, leaving stock untouched, when fewer than `quantity`
    /// units are available.
    pub(crate) async fn reserve(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: Uuid,
        quantity: u32,
    ) -> Result<bool, sqlx::Error> {
        let quantity = i32::try_from(quantity).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let rows_affected = query(RESERVE_STOCK_SQL)
            .bind(product)
            .bind(quantity)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    /// Return every unit reserved by `order` to stock.
    ///
    /// Only lines that took stock when the order was placed are credited. Callers must
    /// run this in the same transaction as the guarded status change that
    /// ends the reservation, so it happens at most once per order.
    pub(crate) async fn release_reservation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RELEASE_RESERVATION_SQL)
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn product_state_from_row(
    row: &PgRow,
    currency: &'static Currency,
) -> Result<ProductState, sqlx::Error> {
    Ok(ProductState {
        uuid: row.try_get("uuid")?,
        price: try_get_money(row, "price", currency)?,
        track_quantity: row.try_get("track_quantity")?,
        quantity: try_get_count(row, "quantity")?,
        is_active: row.try_get("is_active")?,
    })
}
