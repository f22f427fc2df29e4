//! Resource provider registration
//!
//! A subscription must have the `Microsoft.Storage` provider registered
//! before storage accounts can be created in it.

pub mod models;
pub mod registration;

pub use models::*;
pub use registration::*;
