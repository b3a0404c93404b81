//! Restoration Planner
//!
//! Spatial planning for ecosystem restoration: which land is available for
//! restoration in a country, where restoration is most valuable, and what a
//! drawn project area would deliver.
//!
//! - `landcover` / `availability`: ESA CCI reclassification and available area
//! - `bounds`: per-country reference bounds
//! - `priority`: normalized, weighted overlay of the priority factors
//! - `stats` / `species`: zonal statistics for a project area
//! - `session`: action reducer and draw/edit debouncing
//! - `data`: dataset loading with Polars

pub mod error;
pub mod config;
pub mod utils;
pub mod raster;
pub mod geometry;
pub mod landcover;
pub mod availability;
pub mod bounds;
pub mod priority;
pub mod species;
pub mod stats;
pub mod data;
pub mod session;

// API server module (only compiled with "api" feature)
#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use error::{PlannerError, PlannerResult};
pub use config::PlannerConfig;
pub use raster::{Grid, Raster};
pub use geometry::{Footprint, ProjectArea};
pub use landcover::{LandCoverClass, LandCoverMasks};
pub use availability::{compute_available_area, LandCoverKind, RestorationCriteria, RestorationType};
pub use bounds::{CountryBounds, ReferenceTables};
pub use priority::{compute_priority, PriorityFactor, PriorityLayers, PriorityWeights};
pub use species::{threatened_species_count, RedListCategory, SpeciesRange, TaxonGroup};
pub use stats::{compute_stats, ProjectParameter, ProjectParameters, ProjectStatistics, ZonalLayers};
pub use data::PlanningData;
pub use session::{Action, Debouncer, ReferenceLayer, Session, SessionState, SessionView};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
