//! Payment Gateway

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use rand::Rng;
use rusty_money::{Money, iso::Currency};
use storefront::order_number::OrderNumber;
use thiserror::Error;

use crate::domain::orders::records::OrderUuid;

/// Payment gateway failures. All of them settle the order as failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The payment was refused.
    #[error("payment declined: {0}")]
    Declined(String),

    /// The gateway could not be reached or errored.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// A request to take payment for an order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub order: OrderUuid,
    pub order_number: OrderNumber,
    pub amount: Money<'static, Currency>,
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Take payment. Returns once the gateway has decided.
    async fn charge(&self, request: &ChargeRequest) -> Result<(), GatewayError>;
}

/// Gateway that approves a fixed share of payments after a delay.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
    success_rate: f64,
}

impl SimulatedGateway {
    /// `success_rate` is clamped to `0.0..=1.0`; non-finite rates decline everything.
    #[must_use]
    pub fn new(delay: Duration, success_rate: f64) -> Self {
        let success_rate = if success_rate.is_finite() {
            success_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            delay,
            success_rate,
        }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<(), GatewayError> {
        tokio::time::sleep(self.delay).await;

        if rand::thread_rng().gen_bool(self.success_rate) {
            Ok(())
        } else {
            Err(GatewayError::Declined(format!(
                "simulated decline for {}",
                request.order_number
            )))
        }
    }
}
