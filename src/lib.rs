//! acctctl - Azure Storage account management
//!
//! Registers the storage resource provider and creates, inspects, updates
//! and deletes storage accounts and their access keys through the Azure
//! Resource Manager REST API.

pub mod arm;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod provider;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use error::{AcctctlError, Result};
