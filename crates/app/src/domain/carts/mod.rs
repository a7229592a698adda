//! Carts
//!
//! Read-side access to a user's cart for validation and checkout. Cart editing
//! lives outside this crate.

pub mod records;
pub(crate) mod repository;

pub(crate) use repository::PgCartsRepository;
