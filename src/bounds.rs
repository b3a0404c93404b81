//! Country Bounds Resolver
//!
//! Per-country reference bounds for the three priority variables. Distance to
//! forest uses the country minimum and its 95th percentile as the maximum so a
//! few extreme pixels do not compress the normalized range.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};
use crate::utils::{column_as_f64, materialize_with_columns};

/// Key column shared by every reference table
pub const COUNTRY_KEY: &str = "COUNTRY_NA";

/// Resolved bounds for one country
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountryBounds {
    pub dist_min: f64,
    pub dist_max: f64,
    pub cost_min: f64,
    pub cost_max: f64,
    pub carbon_min: f64,
    pub carbon_max: f64,
}

/// File locations of the four reference tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceTablePaths {
    pub dist_min: String,
    pub dist_max: String,
    pub opp_cost: String,
    pub carbon_seq: String,
}

/// One named column of a reference table, keyed by country
#[derive(Debug, Clone, Default)]
pub struct ReferenceColumn {
    pub table: String,
    pub values: FxHashMap<String, f64>,
}

impl ReferenceColumn {
    fn lookup(&self, country: &str) -> PlannerResult<f64> {
        self.values
            .get(country)
            .copied()
            .ok_or_else(|| PlannerError::UnsupportedCountry {
                country: country.to_string(),
                table: self.table.clone(),
            })
    }
}

/// Precomputed per-country reference tables
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub dist_min: ReferenceColumn,
    pub dist_max: ReferenceColumn,
    pub cost_min: ReferenceColumn,
    pub cost_max: ReferenceColumn,
    pub carbon_min: ReferenceColumn,
    pub carbon_max: ReferenceColumn,
}

impl ReferenceTables {
    /// Load all four tables relative to `data_dir`
    pub fn load(data_dir: &Path, paths: &ReferenceTablePaths) -> Result<Self> {
        let [dist_min] = load_table(&data_dir.join(&paths.dist_min), "dist2forest_min", ["min"])?;
        let [dist_max] = load_table(&data_dir.join(&paths.dist_max), "dist2forest_95_perc_max", ["p95"])?;
        let [cost_min, cost_max] =
            load_table(&data_dir.join(&paths.opp_cost), "min_max_table_opp_cost", ["min_cost", "max_cost"])?;
        let [carbon_min, carbon_max] =
            load_table(&data_dir.join(&paths.carbon_seq), "min_max_table_carbon_seq", ["min_rate", "max_rate"])?;

        let tables = ReferenceTables {
            dist_min,
            dist_max,
            cost_min,
            cost_max,
            carbon_min,
            carbon_max,
        };

        tracing::info!(
            countries = tables.dist_min.values.len(),
            "Loaded country reference tables"
        );

        Ok(tables)
    }

    /// Resolve bounds for a country; missing rows in any table are an error
    pub fn get_bounds(&self, country: &str) -> PlannerResult<CountryBounds> {
        let bounds = CountryBounds {
            dist_min: self.dist_min.lookup(country)?,
            dist_max: self.dist_max.lookup(country)?,
            cost_min: self.cost_min.lookup(country)?,
            cost_max: self.cost_max.lookup(country)?,
            carbon_min: self.carbon_min.lookup(country)?,
            carbon_max: self.carbon_max.lookup(country)?,
        };

        for (name, min, max) in [
            ("distance", bounds.dist_min, bounds.dist_max),
            ("opportunity cost", bounds.cost_min, bounds.cost_max),
            ("carbon rate", bounds.carbon_min, bounds.carbon_max),
        ] {
            if max <= min {
                tracing::warn!(country, variable = name, min, max, "Degenerate reference bounds");
            }
        }

        Ok(bounds)
    }

    /// Build tables from in-memory rows: (country, bounds)
    pub fn from_rows(rows: &[(&str, CountryBounds)]) -> Self {
        let column = |table: &str, f: fn(&CountryBounds) -> f64| ReferenceColumn {
            table: table.to_string(),
            values: rows.iter().map(|(c, b)| (c.to_string(), f(b))).collect(),
        };

        Self {
            dist_min: column("dist2forest_min", |b| b.dist_min),
            dist_max: column("dist2forest_95_perc_max", |b| b.dist_max),
            cost_min: column("min_max_table_opp_cost", |b| b.cost_min),
            cost_max: column("min_max_table_opp_cost", |b| b.cost_max),
            carbon_min: column("min_max_table_carbon_seq", |b| b.carbon_min),
            carbon_max: column("min_max_table_carbon_seq", |b| b.carbon_max),
        }
    }
}

/// Load a CSV table: COUNTRY_NA → value for each requested column
fn load_table<const N: usize>(
    path: &Path,
    table: &str,
    value_cols: [&str; N],
) -> Result<[ReferenceColumn; N]> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load reference table: {:?}", path))?;

    let mut columns: Vec<&str> = vec![COUNTRY_KEY];
    columns.extend_from_slice(&value_cols);
    let df = materialize_with_columns(&df.lazy(), &columns, table)?;

    let keys = df.column(COUNTRY_KEY)?
        .str()
        .with_context(|| format!("{}: Column '{}' is not string type", table, COUNTRY_KEY))?;

    let loaded: Vec<ReferenceColumn> = value_cols
        .iter()
        .map(|&value_col| {
            let values = column_as_f64(&df, value_col, table)?;
            let mut map = FxHashMap::default();
            for (key, value) in keys.into_iter().zip(values) {
                if let (Some(key), Some(value)) = (key, value) {
                    map.insert(key.to_string(), value);
                }
            }
            Ok(ReferenceColumn { table: table.to_string(), values: map })
        })
        .collect::<Result<_>>()?;

    loaded
        .try_into()
        .map_err(|_| anyhow!("{}: column count mismatch", table))
}
