//! Inventory
//!
//! Reads product state for checkout and moves stock in and out of reservation.
//! Every path that hands stock back goes through [`PgInventoryRepository::release_reservation`].

pub(crate) mod repository;

pub(crate) use repository::PgInventoryRepository;
