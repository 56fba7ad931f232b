//! Measurement data model

pub mod record;
pub mod summary;
