//! Data Loading and Management
//!
//! Loads every dataset the planner needs from a data directory described by
//! `manifest.json`:
//!
//! - raster layers: parquet with a nullable `value` column in row-major order
//!   on the manifest grid (population adds a `year` column)
//! - per-country reference tables (CSV, keyed by `COUNTRY_NA`)
//! - country boundaries (`countries.json`)
//! - species range groups (JSON, one or more files per group)

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::bounds::{CountryBounds, ReferenceTablePaths, ReferenceTables, COUNTRY_KEY};
use crate::error::{PlannerError, PlannerResult};
use crate::geometry::{Footprint, RingsDef};
use crate::landcover::LandCoverMasks;
use crate::priority::PriorityLayers;
use crate::raster::{Grid, Raster};
use crate::species::{TaxonGroup, TaxonGroupSource};
use crate::stats::ZonalLayers;
use crate::utils::{column_as_f64, filter_to_year, materialize_with_columns};

/// Parquet files of the raster layers, relative to the data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterPaths {
    pub landcover_1992: String,
    pub landcover_2018: String,
    pub dist_to_forest: String,
    pub opp_cost: String,
    pub carbon_agb: String,
    pub carbon_bgb: String,
    pub population: String,
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub grid: Grid,
    pub rasters: RasterPaths,
    pub reference_tables: ReferenceTablePaths,
    #[serde(default = "default_countries")]
    pub countries: String,
    #[serde(default)]
    pub species: Vec<TaxonGroupSource>,
}

fn default_countries() -> String {
    "countries.json".to_string()
}

/// Country boundary record in `countries.json`
#[derive(Debug, Deserialize)]
struct CountryRecord {
    #[serde(rename = "COUNTRY_NA")]
    name: String,
    rings: RingsDef,
}

/// Main data holder for planning sessions
///
/// Read-only after load; sessions share it behind an `Arc`.
pub struct PlanningData {
    pub grid: Grid,

    /// Grassland / cropland 2018 and forest history 1992
    pub masks: LandCoverMasks,

    /// Distance to forest, opportunity cost, carbon sequestration rate
    pub priority_layers: PriorityLayers,

    /// Carbon AGB/BGB and population for zonal statistics
    pub zonal_layers: ZonalLayers,

    pub reference: ReferenceTables,

    /// Country name → boundary
    pub countries: FxHashMap<String, Footprint>,

    pub species: Vec<TaxonGroup>,
}

impl PlanningData {
    /// Load all datasets from `data_dir`
    pub fn load(data_dir: &Path, population_year: i32) -> Result<Self> {
        tracing::info!(?data_dir, "Loading planning datasets");

        let manifest_path = data_dir.join("manifest.json");
        let manifest: Manifest = serde_json::from_str(
            &fs::read_to_string(&manifest_path)
                .with_context(|| format!("Failed to read manifest: {:?}", manifest_path))?,
        )
        .with_context(|| format!("Failed to parse manifest: {:?}", manifest_path))?;

        let grid = manifest.grid;
        let paths = &manifest.rasters;
        let raster = |file: &str, layer: &str| load_raster(&data_dir.join(file), grid, layer, None);

        let masks = LandCoverMasks::derive(
            &raster(&paths.landcover_1992, "landcover_1992")?,
            &raster(&paths.landcover_2018, "landcover_2018")?,
        );

        let carbon_agb = raster(&paths.carbon_agb, "carbon_agb")?;
        let priority_layers = PriorityLayers {
            dist_to_forest: raster(&paths.dist_to_forest, "dist_to_forest")?,
            opp_cost: raster(&paths.opp_cost, "opp_cost")?,
            carbon_rate: carbon_agb.clone(),
        };

        let zonal_layers = ZonalLayers {
            carbon_agb,
            carbon_bgb: raster(&paths.carbon_bgb, "carbon_bgb")?,
            population: load_raster(
                &data_dir.join(&paths.population),
                grid,
                "population",
                Some(population_year),
            )?,
        };

        let reference = ReferenceTables::load(data_dir, &manifest.reference_tables)?;
        let countries = load_countries(&data_dir.join(&manifest.countries))?;

        let species = manifest
            .species
            .iter()
            .map(|source| TaxonGroup::load(data_dir, source))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            width = grid.width,
            height = grid.height,
            countries = countries.len(),
            taxon_groups = species.len(),
            population_year,
            "Planning datasets loaded"
        );

        Ok(Self {
            grid,
            masks,
            priority_layers,
            zonal_layers,
            reference,
            countries,
            species,
        })
    }

    /// Assemble from in-memory parts
    pub fn from_parts(
        masks: LandCoverMasks,
        priority_layers: PriorityLayers,
        zonal_layers: ZonalLayers,
        reference: ReferenceTables,
        countries: FxHashMap<String, Footprint>,
        species: Vec<TaxonGroup>,
    ) -> PlannerResult<Self> {
        let grid = *masks.grassland_2018.grid();
        for (name, layer) in [
            ("dist_to_forest", &priority_layers.dist_to_forest),
            ("opp_cost", &priority_layers.opp_cost),
            ("carbon_rate", &priority_layers.carbon_rate),
            ("carbon_agb", &zonal_layers.carbon_agb),
            ("carbon_bgb", &zonal_layers.carbon_bgb),
            ("population", &zonal_layers.population),
        ] {
            if *layer.grid() != grid {
                return Err(PlannerError::GridMismatch {
                    layer: name.to_string(),
                    expected: grid.len(),
                    actual: layer.grid().len(),
                });
            }
        }

        Ok(Self {
            grid,
            masks,
            priority_layers,
            zonal_layers,
            reference,
            countries,
            species,
        })
    }

    /// Country names, sorted
    pub fn country_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.countries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn country(&self, name: &str) -> PlannerResult<&Footprint> {
        self.countries
            .get(name)
            .ok_or_else(|| PlannerError::UnknownCountry(name.to_string()))
    }

    /// Boundary and reference bounds of a country
    pub fn resolve_country(&self, name: &str) -> PlannerResult<(&Footprint, CountryBounds)> {
        let footprint = self.country(name)?;
        let bounds = self.reference.get_bounds(name)?;
        Ok((footprint, bounds))
    }
}

/// Load one raster layer, optionally restricted to a single year
fn load_raster(path: &Path, grid: Grid, layer: &str, year: Option<i32>) -> Result<Raster> {
    let lazy = LazyFrame::scan_parquet(path, Default::default())
        .with_context(|| format!("Failed to scan parquet: {:?}", path))?;
    let lazy = match year {
        Some(year) => filter_to_year(&lazy, "year", year),
        None => lazy,
    };

    let df = materialize_with_columns(&lazy, &["value"], layer)?;
    let values = column_as_f64(&df, "value", layer)?;

    tracing::debug!(layer, pixels = values.len(), ?year, "Loaded raster layer");

    Raster::from_values(grid, values, layer)
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("Raster layer {:?} does not match the manifest grid", path))
}

fn load_countries(path: &Path) -> Result<FxHashMap<String, Footprint>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read country boundaries: {:?}", path))?;
    let records: Vec<CountryRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse country boundaries ({}): {:?}", COUNTRY_KEY, path))?;

    Ok(records
        .into_iter()
        .map(|r| (r.name, Footprint::from_rings(&r.rings)))
        .collect())
}
