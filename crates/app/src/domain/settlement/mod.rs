//! Settlement
//!
//! Resolves payment for placed orders off the request path. The
//! [`PaymentGateway`] trait is where a real payment provider plugs in.

pub mod dispatcher;
pub mod errors;
pub mod gateway;
pub mod service;

pub use dispatcher::SettlementDispatcher;
pub use errors::SettlementError;
pub use gateway::{ChargeRequest, GatewayError, MockPaymentGateway, PaymentGateway, SimulatedGateway};
pub use service::*;
