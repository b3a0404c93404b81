//! Map layer descriptors and the serializable session snapshot

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::availability::RestorationCriteria;
use crate::geometry::ProjectArea;
use crate::landcover::LandCoverMasks;
use crate::priority::{PriorityFactor, PriorityWeights};
use crate::raster::Raster;
use crate::stats::{ProjectParameters, ProjectStatistics};

pub const AVAILABLE_AREA_PALETTE: &[&str] = &["purple"];
pub const FOREST_PROXIMITY_PALETTE: &[&str] =
    &["#005a32", "#238b45", "#41ab5d", "#74c476", "#a1d99b", "#c7e9c0", "#edf8e9"];
pub const OPPORTUNITY_COST_PALETTE: &[&str] =
    &["#f2f0f7", "#dadaeb", "#bcbddc", "#9e9ac8", "#807dba", "#6a51a3", "#4a1486"];
pub const CARBON_PALETTE: &[&str] =
    &["#feedde", "#fdd0a2", "#fdae6b", "#fd8d3c", "#f16913", "#d94801", "#8c2d04"];
pub const PRIORITY_PALETTE: &[&str] =
    &["#f1eef6", "#d4b9da", "#c994c7", "#df65b0", "#e7298a", "#ce1256", "#91003f"];
pub const GRASSLAND_PALETTE: &[&str] = &["#d8d800"];
pub const CROPLAND_PALETTE: &[&str] = &["#a50f15"];
pub const HISTORICAL_FOREST_PALETTE: &[&str] = &["#006d2c"];

pub fn factor_palette(factor: PriorityFactor) -> &'static [&'static str] {
    match factor {
        PriorityFactor::ForestProximity => FOREST_PROXIMITY_PALETTE,
        PriorityFactor::OpportunityCost => OPPORTUNITY_COST_PALETTE,
        PriorityFactor::CarbonSequestration => CARBON_PALETTE,
    }
}

/// Land-cover mask always on the map, hidden until toggled on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceLayer {
    Grassland,
    Cropland,
    HistoricalForest,
}

impl ReferenceLayer {
    pub const ALL: [ReferenceLayer; 3] =
        [ReferenceLayer::Grassland, ReferenceLayer::Cropland, ReferenceLayer::HistoricalForest];

    pub fn name(self) -> &'static str {
        match self {
            ReferenceLayer::Grassland => "Grassland",
            ReferenceLayer::Cropland => "Cropland",
            ReferenceLayer::HistoricalForest => "Historical Forest",
        }
    }

    fn palette(self) -> &'static [&'static str] {
        match self {
            ReferenceLayer::Grassland => GRASSLAND_PALETTE,
            ReferenceLayer::Cropland => CROPLAND_PALETTE,
            ReferenceLayer::HistoricalForest => HISTORICAL_FOREST_PALETTE,
        }
    }

    fn mask(self, masks: &LandCoverMasks) -> &Arc<Raster> {
        match self {
            ReferenceLayer::Grassland => &masks.grassland_2018,
            ReferenceLayer::Cropland => &masks.cropland_2018,
            ReferenceLayer::HistoricalForest => &masks.historical_forest_1992,
        }
    }
}

/// Which reference layers are toggled on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceVisibility {
    pub grassland: bool,
    pub cropland: bool,
    pub historical_forest: bool,
}

impl ReferenceVisibility {
    pub fn is_visible(&self, layer: ReferenceLayer) -> bool {
        match layer {
            ReferenceLayer::Grassland => self.grassland,
            ReferenceLayer::Cropland => self.cropland,
            ReferenceLayer::HistoricalForest => self.historical_forest,
        }
    }

    pub fn with(mut self, layer: ReferenceLayer, visible: bool) -> Self {
        match layer {
            ReferenceLayer::Grassland => self.grassland = visible,
            ReferenceLayer::Cropland => self.cropland = visible,
            ReferenceLayer::HistoricalForest => self.historical_forest = visible,
        }
        self
    }
}

/// A raster ready for display with its visualization range
#[derive(Debug, Clone)]
pub struct DisplayLayer {
    pub name: &'static str,
    pub vis_min: f64,
    pub vis_max: f64,
    pub palette: &'static [&'static str],
    pub visible: bool,
    pub raster: Arc<Raster>,
}

impl DisplayLayer {
    pub fn available_area(raster: Arc<Raster>) -> Self {
        Self {
            name: "Available Area",
            vis_min: 1.0,
            vis_max: 1.0,
            palette: AVAILABLE_AREA_PALETTE,
            visible: true,
            raster,
        }
    }

    pub fn priority(raster: Arc<Raster>) -> Self {
        Self {
            name: "Restoration Priority Scaled",
            vis_min: 0.0,
            vis_max: 1.0,
            palette: PRIORITY_PALETTE,
            visible: true,
            raster,
        }
    }

    /// Unclipped land-cover mask shared with the planning data
    pub fn reference(layer: ReferenceLayer, masks: &LandCoverMasks, visible: bool) -> Self {
        Self {
            name: layer.name(),
            vis_min: 1.0,
            vis_max: 1.0,
            palette: layer.palette(),
            visible,
            raster: Arc::clone(layer.mask(masks)),
        }
    }

    pub fn describe(&self) -> LayerDescriptor {
        LayerDescriptor {
            name: self.name,
            vis_min: self.vis_min,
            vis_max: self.vis_max,
            palette: self.palette,
            visible: self.visible,
            defined_pixels: self.raster.defined_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerDescriptor {
    pub name: &'static str,
    pub vis_min: f64,
    pub vis_max: f64,
    pub palette: &'static [&'static str],
    pub visible: bool,
    pub defined_pixels: usize,
}

/// One formatted result field
#[derive(Debug, Clone, Serialize)]
pub struct ResultField {
    pub label: &'static str,
    pub value: String,
}

/// Snapshot of a session returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub country: Option<String>,
    pub criteria: RestorationCriteria,
    pub weights: PriorityWeights,
    pub params: ProjectParameters,
    pub layers: Vec<LayerDescriptor>,
    pub project_area: Option<ProjectArea>,
    pub statistics: Option<ProjectStatistics>,
    /// Blank strings while no statistics are available
    pub results: Vec<ResultField>,
}

pub(crate) fn result_fields(stats: Option<&ProjectStatistics>) -> Vec<ResultField> {
    match stats {
        Some(stats) => stats
            .display_fields()
            .into_iter()
            .map(|(label, value)| ResultField { label, value })
            .collect(),
        None => ProjectStatistics::FIELD_LABELS
            .iter()
            .map(|&label| ResultField { label, value: String::new() })
            .collect(),
    }
}
