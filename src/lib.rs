//! Storefront
//!
//! Checkout domain for the storefront: validates carts against product state,
//! prices orders deterministically and models the order and payment lifecycle.
//! Everything in this crate is synchronous and free of I/O; persistence and
//! settlement live in `storefront-app`.

pub mod assembly;
pub mod cart;
pub mod order_number;
pub mod pricing;
pub mod products;
pub mod shipping;
pub mod status;
pub mod validation;
