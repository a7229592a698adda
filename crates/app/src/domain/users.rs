//! Users
//!
//! Users are owned by the identity system; checkout only needs their identifier.

use crate::uuids::TypedUuid;

/// Marker for user identifiers.
#[derive(Debug)]
pub struct User;

/// User UUID
pub type UserUuid = TypedUuid<User>;
