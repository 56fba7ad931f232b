//! Output generation
//!
//! Cache entries and the final dataset share one CSV schema

pub mod csv;
