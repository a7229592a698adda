//! Test support.

mod context;
pub(crate) mod helpers;

pub(crate) use context::{TestContext, default_rules};
