//! Core shared library for the verification analytics services.
//!
//! This crate exposes the primitives both subsystems depend on: the
//! common error taxonomy, environment-driven configuration helpers,
//! JSON helpers and logging setup.

pub mod config;
pub mod errors;
pub mod logging;
pub mod serde_utils;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use errors::{AnalyticsError, ConfigError};
