//! Utility modules shared across the planner
//!
//! - Normalization: unit-scale transformation and observed-range rescaling
//! - LazyFrame helpers: safe materialization with column validation

pub mod normalization;
pub mod lazy_helpers;

// Re-export commonly used functions
pub use normalization::{unit_scale, rescale_observed};
pub use lazy_helpers::{materialize_with_columns, column_as_f64, filter_to_year};
