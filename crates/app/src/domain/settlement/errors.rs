//! Settlement errors.

use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("order not found")]
    NotFound,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for SettlementError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            Self::NotFound
        } else {
            Self::Sql(error)
        }
    }
}
