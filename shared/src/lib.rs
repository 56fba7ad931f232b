//! Shared types and utilities for kerntime
//!
//! This crate contains the measurement data model used by the collector and
//! the command-line interface: raw per-invocation records, benchmark
//! identities and the derived accuracy summaries.

pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::{record::*, summary::*};
