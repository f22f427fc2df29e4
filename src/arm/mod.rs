//! Azure Resource Manager plumbing shared by the provider and storage modules

pub mod client;
pub mod resource_id;

pub use client::*;
pub use resource_id::*;
