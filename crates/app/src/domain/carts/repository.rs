//! Carts Repository

use rusty_money::iso::Currency;
use sqlx::{Postgres, Row, Transaction, postgres::PgRow, query, query_scalar};
use storefront::cart::CartLine;
use uuid::Uuid;

use crate::{
    amounts::{try_get_count, try_get_money},
    domain::{carts::records::CartUuid, users::UserUuid},
};

const FIND_CART_SQL: &str = include_str!("sql/find_cart.sql");
const LOCK_CART_SQL: &str = include_str!("sql/lock_cart.sql");
const GET_CART_LINES_SQL: &str = include_str!("sql/get_cart_lines.sql");
const CLEAR_CART_SQL: &str = include_str!("sql/clear_cart.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// The user's cart, if they have one.
    pub(crate) async fn find_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Option<CartUuid>, sqlx::Error> {
        let cart: Option<Uuid> = query_scalar(FIND_CART_SQL)
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(cart.map(CartUuid::from_uuid))
    }

    /// The user's cart, locked until the transaction ends.
    ///
    /// Concurrent checkouts of the same cart queue behind this lock.
    pub(crate) async fn lock_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Option<CartUuid>, sqlx::Error> {
        let cart: Option<Uuid> = query_scalar(LOCK_CART_SQL)
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(cart.map(CartUuid::from_uuid))
    }

    /// Cart lines in insertion order, priced from the product where it still exists.
    pub(crate) async fn get_cart_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        currency: &'static Currency,
    ) -> Result<Vec<CartLine>, sqlx::Error> {
        let rows = query(GET_CART_LINES_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        rows.iter()
            .map(|row| cart_line_from_row(row, currency))
            .collect()
    }

    pub(crate) async fn clear_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_CART_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn cart_line_from_row(row: &PgRow, currency: &'static Currency) -> Result<CartLine, sqlx::Error> {
    Ok(CartLine {
        uuid: row.try_get("uuid")?,
        product: row.try_get("product_uuid")?,
        quantity: try_get_count(row, "quantity")?,
        unit_price: try_get_money(row, "unit_price", currency)?,
    })
}
