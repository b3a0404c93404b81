//! LazyFrame materialization helpers with column validation
//!
//! Layer files are scanned lazily; these helpers project only the needed
//! columns and fail loudly when one is absent.

use polars::prelude::*;
use anyhow::{Context, Result, anyhow};
use std::collections::HashSet;

/// Materialize LazyFrame with explicit column list and validation
///
/// # Arguments
/// * `lazy` - LazyFrame to materialize
/// * `columns` - Required column names
/// * `context` - Context for error messages (e.g., "carbon_agb raster")
///
/// # Errors
/// Returns error if materialization fails or a required column is missing
pub fn materialize_with_columns(
    lazy: &LazyFrame,
    columns: &[&str],
    context: &str,
) -> Result<DataFrame> {
    let col_exprs: Vec<Expr> = columns.iter()
        .map(|&name| col(name))
        .collect();

    let df = lazy
        .clone()
        .select(&col_exprs)
        .collect()
        .with_context(|| format!("{}: Failed to materialize columns {:?}", context, columns))?;

    let actual_cols: HashSet<String> = df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for &expected in columns {
        if !actual_cols.contains(expected) {
            return Err(anyhow!(
                "{}: Missing expected column '{}'. Available columns: {:?}",
                context, expected, actual_cols
            ));
        }
    }

    Ok(df)
}

/// Read a numeric column as `Option<f64>` values (nulls and NaN become `None`)
pub fn column_as_f64(df: &DataFrame, name: &str, context: &str) -> Result<Vec<Option<f64>>> {
    let casted = df.column(name)
        .with_context(|| format!("{}: Missing {} column", context, name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("{}: Column '{}' is not numeric", context, name))?;

    let values = casted.f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();

    Ok(values)
}

/// Restrict a scan to a single year (e.g. the population mosaic for 2020)
pub fn filter_to_year(lazy: &LazyFrame, year_col: &str, year: i32) -> LazyFrame {
    lazy.clone()
        .filter(col(year_col).cast(DataType::Int64).eq(lit(year as i64)))
}
