//! # Ingredient Merge Common Library
//!
//! Shared code for the ingredient reconciliation workspace:
//! - Error type used by configuration and I/O paths
//! - TOML bootstrap configuration and config file resolution

pub mod config;
pub mod error;

pub use config::{ConfigResolver, TomlConfig};
pub use error::{Error, Result};
