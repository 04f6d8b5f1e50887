//! Scorecard common types and errors.
//!
//! This crate provides the foundation shared across scorecard crates:
//! - The unified error type and `Result` alias
//! - Error categories for grouping and machine output
//! - Configuration loading and validation

pub mod config;
pub mod error;

pub use config::{Config, RemoteConfig};
pub use error::{Error, ErrorCategory, Result};
