//! Normalization & Weighting Engine
//!
//! Weighted overlay of the three priority factors:
//!
//! | factor | better when | contribution |
//! |--------|-------------|--------------|
//! | forest proximity (distance to forest) | lower | `(1 - norm) * w` |
//! | opportunity cost | lower | `(1 - norm) * w` |
//! | carbon sequestration rate | higher | `norm * w` |
//!
//! The sum is masked to the available area and re-normalized by the min/max
//! observed inside that area only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bounds::CountryBounds;
use crate::error::{PlannerError, PlannerResult};
use crate::raster::Raster;
use crate::utils::{rescale_observed, unit_scale};

/// Maximum importance a factor can be given
pub const MAX_WEIGHT: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityFactor {
    ForestProximity,
    OpportunityCost,
    CarbonSequestration,
}

impl PriorityFactor {
    pub const ALL: [PriorityFactor; 3] = [
        PriorityFactor::ForestProximity,
        PriorityFactor::OpportunityCost,
        PriorityFactor::CarbonSequestration,
    ];

    /// Lower raw values score higher
    pub fn inverted(self) -> bool {
        !matches!(self, PriorityFactor::CarbonSequestration)
    }

    /// Reference (min, max) for this factor
    pub fn bounds(self, bounds: &CountryBounds) -> (f64, f64) {
        match self {
            PriorityFactor::ForestProximity => (bounds.dist_min, bounds.dist_max),
            PriorityFactor::OpportunityCost => (bounds.cost_min, bounds.cost_max),
            PriorityFactor::CarbonSequestration => (bounds.carbon_min, bounds.carbon_max),
        }
    }

    pub fn layer_name(self) -> &'static str {
        match self {
            PriorityFactor::ForestProximity => "Proximity to Forest",
            PriorityFactor::OpportunityCost => "Opportunity Cost",
            PriorityFactor::CarbonSequestration => "Carbon Sequestration Potential",
        }
    }
}

impl fmt::Display for PriorityFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriorityFactor::ForestProximity => "forest_proximity",
            PriorityFactor::OpportunityCost => "opportunity_cost",
            PriorityFactor::CarbonSequestration => "carbon_sequestration",
        };
        f.write_str(name)
    }
}

/// Importance weights, each 0..=5
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityWeights {
    pub forest_proximity: u8,
    pub opportunity_cost: u8,
    pub carbon_sequestration: u8,
}

impl PriorityWeights {
    pub fn get(&self, factor: PriorityFactor) -> u8 {
        match factor {
            PriorityFactor::ForestProximity => self.forest_proximity,
            PriorityFactor::OpportunityCost => self.opportunity_cost,
            PriorityFactor::CarbonSequestration => self.carbon_sequestration,
        }
    }

    pub fn with(mut self, factor: PriorityFactor, value: u8) -> PlannerResult<Self> {
        if value > MAX_WEIGHT {
            return Err(PlannerError::InvalidWeight { factor: factor.to_string(), value });
        }
        match factor {
            PriorityFactor::ForestProximity => self.forest_proximity = value,
            PriorityFactor::OpportunityCost => self.opportunity_cost = value,
            PriorityFactor::CarbonSequestration => self.carbon_sequestration = value,
        }
        Ok(self)
    }

    pub fn all_zero(&self) -> bool {
        PriorityFactor::ALL.iter().all(|f| self.get(*f) == 0)
    }
}

/// Raw (un-normalized) priority rasters
#[derive(Debug, Clone)]
pub struct PriorityLayers {
    /// Distance to nearest forest (m)
    pub dist_to_forest: Raster,
    /// Opportunity cost of restoration
    pub opp_cost: Raster,
    /// Above-ground carbon sequestration rate
    pub carbon_rate: Raster,
}

impl PriorityLayers {
    pub fn get(&self, factor: PriorityFactor) -> &Raster {
        match factor {
            PriorityFactor::ForestProximity => &self.dist_to_forest,
            PriorityFactor::OpportunityCost => &self.opp_cost,
            PriorityFactor::CarbonSequestration => &self.carbon_rate,
        }
    }
}

/// Weighted, unit-scaled contribution of one factor (masked pixels stay masked)
pub fn factor_contribution(layer: &Raster, factor: PriorityFactor, bounds: &CountryBounds, weight: u8) -> Raster {
    let (min, max) = factor.bounds(bounds);
    let invert = factor.inverted();
    layer.map(|v| Some(unit_scale(v, min, max, invert) * weight as f64))
}

/// Compute the restoration priority raster in [0, 1] over the available area
///
/// Masked pixels in a factor layer contribute 0 for that factor only. All-zero
/// weights or a single-valued area produce the degenerate-range fallback.
pub fn compute_priority(
    layers: &PriorityLayers,
    bounds: &CountryBounds,
    weights: &PriorityWeights,
    available: &Raster,
) -> PlannerResult<Raster> {
    let mut unscaled = Raster::constant(*available.grid(), 0.0);
    for factor in PriorityFactor::ALL {
        let contribution = factor_contribution(layers.get(factor), factor, bounds, weights.get(factor));
        unscaled = unscaled.zip_with(&contribution, |acc, c| Some(acc.unwrap_or(0.0) + c.unwrap_or(0.0)))?;
    }

    let within_area = unscaled.update_mask(available)?;

    let Some((min, max)) = within_area.min_max(None) else {
        tracing::info!("Available area is empty; priority raster is empty");
        return Ok(within_area);
    };

    tracing::debug!(min, max, ?weights, "Weighted overlay range within available area");

    Ok(within_area.map(|v| Some(rescale_observed(v, min, max))))
}
