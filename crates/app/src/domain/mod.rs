//! Storefront Domain Concerns

pub mod addresses;
pub mod carts;
pub mod checkout;
pub mod inventory;
pub mod orders;
pub mod settlement;
pub mod users;
