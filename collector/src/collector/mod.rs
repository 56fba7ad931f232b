//! Trace collection
//!
//! Turns raw profiler logs into measurement records

pub mod disambiguate;
pub mod trace;
