//! CLI configuration

use thiserror::Error;

pub(crate) mod checkout;
pub(crate) mod db;
pub(crate) mod logging;
pub(crate) mod settlement;

pub(crate) use checkout::CheckoutConfig;
pub(crate) use db::DatabaseConfig;
pub(crate) use logging::{LogFormat, LoggingConfig};
pub(crate) use settlement::SettlementConfig;

/// Configuration values that parse but make no sense.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum ConfigError {
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("tax rate must be between 0 and 1, got {0}")]
    InvalidTaxRate(rust_decimal::Decimal),

    #[error("{name} must not be negative, got {value}")]
    NegativeAmount { name: &'static str, value: i64 },
}
