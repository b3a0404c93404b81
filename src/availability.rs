//! Availability Engine
//!
//! Derives the available-area raster from the full criteria set every time it
//! is triggered. Toggling a flag never patches a previous result.

use serde::{Deserialize, Serialize};

use crate::error::PlannerResult;
use crate::geometry::Footprint;
use crate::landcover::LandCoverMasks;
use crate::raster::Raster;

/// Current land cover eligible for restoration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandCoverKind {
    Grassland,
    Cropland,
}

/// Restoration type, keyed on 1992 forest history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorationType {
    /// Previously forested land
    Reforestation,
    /// Land that was not forest
    Afforestation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandCoverFlags {
    pub grassland: bool,
    pub cropland: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorationTypeFlags {
    pub reforestation: bool,
    pub afforestation: bool,
}

/// Checkbox state for both criteria axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorationCriteria {
    pub land_cover: LandCoverFlags,
    pub restoration_type: RestorationTypeFlags,
}

impl RestorationCriteria {
    pub fn with_land_cover(mut self, kind: LandCoverKind, enabled: bool) -> Self {
        match kind {
            LandCoverKind::Grassland => self.land_cover.grassland = enabled,
            LandCoverKind::Cropland => self.land_cover.cropland = enabled,
        }
        self
    }

    pub fn with_restoration_type(mut self, kind: RestorationType, enabled: bool) -> Self {
        match kind {
            RestorationType::Reforestation => self.restoration_type.reforestation = enabled,
            RestorationType::Afforestation => self.restoration_type.afforestation = enabled,
        }
        self
    }

    /// True when at least one flag is set on each axis
    pub fn selects_anything(&self) -> bool {
        (self.land_cover.grassland || self.land_cover.cropland)
            && (self.restoration_type.reforestation || self.restoration_type.afforestation)
    }
}

/// Additive union of the selected masks, masked pixels counted as 0
fn union_of(grid_source: &Raster, selected: &[&Raster]) -> PlannerResult<Raster> {
    let mut acc = Raster::constant(*grid_source.grid(), 0.0);
    for mask in selected {
        acc = acc.zip_with(mask, |a, m| Some(a.unwrap_or(0.0) + m.unwrap_or(0.0)))?;
    }
    Ok(acc)
}

/// Compute the available area for the criteria, clipped to the country
///
/// The output is 1 where the current land cover AND the restoration type are
/// both selected, masked everywhere else. An empty selection on either axis
/// yields a fully masked raster.
pub fn compute_available_area(
    criteria: &RestorationCriteria,
    masks: &LandCoverMasks,
    country: &Footprint,
) -> PlannerResult<Raster> {
    let flags = &criteria.land_cover;
    let history = &criteria.restoration_type;

    let landcover_selected: Vec<&Raster> = [
        (flags.grassland, masks.grassland_2018.as_ref()),
        (flags.cropland, masks.cropland_2018.as_ref()),
    ]
    .into_iter()
    .filter_map(|(on, m)| on.then_some(m))
    .collect();

    let history_selected: Vec<&Raster> = [
        (history.reforestation, masks.historical_forest_1992.as_ref()),
        (history.afforestation, masks.not_historical_forest_1992.as_ref()),
    ]
    .into_iter()
    .filter_map(|(on, m)| on.then_some(m))
    .collect();

    let restoration_landcover = union_of(&masks.grassland_2018, &landcover_selected)?;
    let historical_landcover = union_of(&masks.grassland_2018, &history_selected)?;

    // historical value where current land cover is selected, else 0
    let available = historical_landcover.where_zero(&restoration_landcover, 0.0)?;
    let available = available.clip(country).self_mask();

    tracing::info!(
        grassland = flags.grassland,
        cropland = flags.cropland,
        reforestation = history.reforestation,
        afforestation = history.afforestation,
        pixels = available.defined_count(),
        "Computed available area"
    );

    Ok(available)
}
