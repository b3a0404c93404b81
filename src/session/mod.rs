//! Planning session state and reducer
//!
//! `SessionState::apply` is a pure transition: it returns the next state or an
//! error, never a partially updated state. Large rasters are shared through
//! `Arc` so cloning a state is cheap.

pub mod actions;
pub mod debounce;
pub mod view;

use std::sync::Arc;
use std::time::Instant;

use crate::availability::{compute_available_area, RestorationCriteria};
use crate::bounds::CountryBounds;
use crate::data::PlanningData;
use crate::error::{PlannerError, PlannerResult};
use crate::geometry::{Footprint, ProjectArea};
use crate::priority::{compute_priority, PriorityWeights};
use crate::raster::Raster;
use crate::stats::{compute_stats, ProjectParameters, ProjectStatistics};

pub use actions::Action;
pub use debounce::Debouncer;
pub use view::{DisplayLayer, LayerDescriptor, ReferenceLayer, ReferenceVisibility, ResultField, SessionView};

/// Selected country with its resolved reference bounds
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedCountry {
    pub name: String,
    pub bounds: CountryBounds,
}

/// Drawn project area and its footprint
#[derive(Debug, Clone)]
pub struct DrawnArea {
    pub area: ProjectArea,
    pub footprint: Arc<Footprint>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub country: Option<SelectedCountry>,
    pub criteria: RestorationCriteria,
    pub weights: PriorityWeights,
    pub params: ProjectParameters,
    pub available: Option<Arc<Raster>>,
    pub priority: Option<Arc<Raster>>,
    /// Last factor layer displayed
    pub factor_layer: Option<DisplayLayer>,
    pub aoi: Option<DrawnArea>,
    pub stats: Option<ProjectStatistics>,
    pub references: ReferenceVisibility,
}

impl SessionState {
    /// Apply one action
    pub fn apply(&self, action: &Action, data: &PlanningData) -> PlannerResult<SessionState> {
        let mut next = self.clone();

        match action {
            Action::SelectCountry { name } => {
                let (_, bounds) = data.resolve_country(name)?;
                next.country = Some(SelectedCountry { name: name.clone(), bounds });
                next.available = None;
                next.priority = None;
                next.factor_layer = None;
                next.aoi = None;
                next.stats = None;
            }
            Action::SetLandCover { kind, enabled } => {
                next.criteria = self.criteria.with_land_cover(*kind, *enabled);
            }
            Action::SetRestorationType { kind, enabled } => {
                next.criteria = self.criteria.with_restoration_type(*kind, *enabled);
            }
            Action::SetWeight { factor, value } => {
                next.weights = self.weights.with(*factor, *value)?;
            }
            Action::DisplayAvailableArea => {
                let country = self.require_country()?;
                let footprint = data.country(&country.name)?;
                let available = compute_available_area(&self.criteria, &data.masks, footprint)?;
                next.available = Some(Arc::new(available));
                next.priority = None;
                next.stats = None;
            }
            Action::DisplayLayer { factor } => {
                let country = self.require_country()?;
                let footprint = data.country(&country.name)?;
                let (vis_min, vis_max) = factor.bounds(&country.bounds);
                let raster = data.priority_layers.get(*factor).clip(footprint);
                next.factor_layer = Some(DisplayLayer {
                    name: factor.layer_name(),
                    vis_min,
                    vis_max,
                    palette: view::factor_palette(*factor),
                    visible: true,
                    raster: Arc::new(raster),
                });
            }
            Action::RunAnalysis => {
                let country = self.require_country()?;
                let available = self.require_available()?;
                let priority = compute_priority(&data.priority_layers, &country.bounds, &self.weights, available)?;
                next.priority = Some(Arc::new(priority));
            }
            Action::Reset => {
                next = SessionState { params: self.params, ..Default::default() };
            }
            Action::DrawShape { area } | Action::EditShape { area } => {
                self.require_available()?;
                let footprint = area.to_footprint()?;
                next.aoi = Some(DrawnArea { area: area.clone(), footprint: Arc::new(footprint) });
                next.stats = None;
            }
            Action::ClearDrawings => {
                next.aoi = None;
                next.stats = None;
            }
            Action::SetProjectParameter { param, value } => {
                next.params = self.params.with(*param, *value)?;
            }
            Action::SetReferenceLayer { layer, visible } => {
                next.references = self.references.with(*layer, *visible);
            }
        }

        tracing::info!(action = action.kind(), country = ?next.country.as_ref().map(|c| &c.name), "Applied action");
        Ok(next)
    }

    /// Compute the statistics for the current AOI
    ///
    /// Requires an available area and a drawn AOI.
    pub fn settle_project_area(&self, data: &PlanningData) -> PlannerResult<SessionState> {
        let available = self.require_available()?;
        let aoi = self.aoi.as_ref().ok_or(PlannerError::NoProjectArea)?;
        let stats = compute_stats(&aoi.footprint, available, &data.zonal_layers, &data.species, &self.params)?;

        tracing::info!(area_ha = stats.area_ha, species = stats.species_count, "Settled project area");
        Ok(SessionState { stats: Some(stats), ..self.clone() })
    }

    fn require_country(&self) -> PlannerResult<&SelectedCountry> {
        self.country.as_ref().ok_or(PlannerError::NoCountrySelected)
    }

    fn require_available(&self) -> PlannerResult<&Raster> {
        self.available.as_deref().ok_or(PlannerError::NoAvailableArea)
    }

    /// Layers currently on the map, bottom to top
    pub fn display_layers(&self, data: &PlanningData) -> Vec<DisplayLayer> {
        let mut layers: Vec<DisplayLayer> = ReferenceLayer::ALL
            .iter()
            .map(|&layer| DisplayLayer::reference(layer, &data.masks, self.references.is_visible(layer)))
            .collect();
        if let Some(layer) = &self.factor_layer {
            layers.push(layer.clone());
        }
        if let Some(available) = &self.available {
            layers.push(DisplayLayer::available_area(Arc::clone(available)));
        }
        if let Some(priority) = &self.priority {
            layers.push(DisplayLayer::priority(Arc::clone(priority)));
        }
        layers
    }

    pub fn view(&self, data: &PlanningData) -> SessionView {
        SessionView {
            country: self.country.as_ref().map(|c| c.name.clone()),
            criteria: self.criteria,
            weights: self.weights,
            params: self.params,
            layers: self.display_layers(data).iter().map(DisplayLayer::describe).collect(),
            project_area: self.aoi.as_ref().map(|a| a.area.clone()),
            statistics: self.stats,
            results: view::result_fields(self.stats.as_ref()),
        }
    }
}

/// A session's state together with its draw/edit debouncer
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: SessionState,
    pub debouncer: Debouncer,
}

impl Session {
    pub fn new(debouncer: Debouncer) -> Self {
        Self { state: SessionState::default(), debouncer }
    }

    /// Apply an action; the state is left untouched on error
    ///
    /// Returns the generation to settle when the action opened a debounce
    /// window. A redisplayed available area reopens one for the drawn AOI.
    pub fn dispatch(&mut self, action: &Action, data: &PlanningData, now: Instant) -> PlannerResult<Option<u64>> {
        self.state = self.state.apply(action, data)?;

        let redraws_aoi = matches!(action, Action::DisplayAvailableArea) && self.state.aoi.is_some();
        if action.is_shape_event() || redraws_aoi {
            return Ok(Some(self.debouncer.bump(now)));
        }
        if matches!(action, Action::ClearDrawings | Action::Reset | Action::SelectCountry { .. }) {
            self.debouncer.cancel();
        }
        Ok(None)
    }

    /// Settle the AOI if `generation` is still the latest and quiet
    ///
    /// Returns `Ok(false)` when the settle was superseded.
    pub fn settle(&mut self, generation: u64, data: &PlanningData, now: Instant) -> PlannerResult<bool> {
        if !self.debouncer.try_settle(generation, now) {
            return Ok(false);
        }
        self.state = self.state.settle_project_area(data)?;
        Ok(true)
    }
}
