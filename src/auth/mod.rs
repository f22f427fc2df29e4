//! Authentication module for Azure services
//!
//! This module provides bearer tokens for the Resource Manager API using
//! DefaultAzureCredential, client secrets, or a pre-issued access token.

pub mod provider;

pub use provider::*;
