//! Checkout
//!
//! Turns a user's cart into a pending order, reserving stock in the same
//! transaction, and cancels pending orders.

pub mod errors;
pub mod service;

pub use errors::CheckoutError;
pub use service::*;
