//! Frameloom Common Utilities
//!
//! Shared infrastructure for all Frameloom crates:
//! - Error types and result aliases
//! - Clock and timing utilities for export progress reporting
//! - Tracing/logging initialization
//! - Configuration types and loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
