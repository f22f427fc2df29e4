//! Configuration management module
//!
//! This module handles configuration loading, validation, and persistence
//! from multiple sources including command-line arguments, environment variables,
//! configuration files, and default values.

pub mod init;
pub mod settings;

pub use settings::*;
