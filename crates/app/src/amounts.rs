//! Row decoding helpers for money and counts.

use rusty_money::{
    Money,
    iso::{self, Currency},
};
use sqlx::{Row, postgres::PgRow};

/// Decode a minor-unit amount column as money in `currency`.
pub(crate) fn try_get_money(
    row: &PgRow,
    col: &str,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, sqlx::Error> {
    let minor: i64 = row.try_get(col)?;

    if minor < 0 {
        return Err(decode_error(col, format!("negative amount {minor}")));
    }

    Ok(Money::from_minor(minor, currency))
}

/// Decode a non-negative integer column.
pub(crate) fn try_get_count(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let count: i32 = row.try_get(col)?;

    u32::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Decode an ISO currency code column.
pub(crate) fn try_get_currency(row: &PgRow, col: &str) -> Result<&'static Currency, sqlx::Error> {
    let code: String = row.try_get(col)?;

    iso::find(&code).ok_or_else(|| decode_error(col, format!("unknown currency {code}")))
}

/// Build a column decode error from a message.
pub(crate) fn decode_error(col: &str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: message.into(),
    }
}
