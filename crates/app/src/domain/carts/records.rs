//! Cart Records

use crate::uuids::TypedUuid;

/// Marker for cart identifiers.
#[derive(Debug)]
pub struct Cart;

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;
