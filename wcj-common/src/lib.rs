//! # WC Journey Common Library
//!
//! Shared code for the WC Journey tools:
//! - Canonical store schema and queries (goals, locations)
//! - Configuration file loading and default paths
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
