//! Storefront application: persistence, checkout and payment settlement.

pub mod context;
pub mod database;
pub mod domain;

#[cfg(test)]
mod test;

mod amounts;
mod uuids;
