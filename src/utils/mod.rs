//! Utility functions module
//!
//! This module contains output formatting, retry logic, HTTP client
//! construction, interactive prompts and input validation.

pub mod format;
pub mod interactive;
pub mod network;
pub mod retry;
pub mod validation;

pub use format::*;
pub use interactive::*;
pub use network::*;
pub use retry::*;
pub use validation::*;
