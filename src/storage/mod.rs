//! Storage account management
//!
//! Models, control-plane operations and the user-facing manager for
//! `Microsoft.Storage/storageAccounts`.

pub mod manager;
pub mod models;
pub mod operations;

pub use manager::*;
pub use models::*;
pub use operations::*;
