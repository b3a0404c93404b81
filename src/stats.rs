//! Zonal Statistics Engine
//!
//! Summaries for a drawn project area (AOI). Raster statistics are reduced
//! over `region = available ∩ AOI`; species are counted over the full AOI.
//!
//! Algorithm:
//! 1. Clip the available area to the AOI, derive the region mask
//! 2. Area: Σ pixel area (ha) over the region
//! 3. Beneficiaries: Σ population over the region (masked = 0)
//! 4. Carbon: mean rate over the region (masked = 0) × area × project length
//! 5. Finance: per-hectare-year rates × length × area, ratio from rounded totals

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{PlannerError, PlannerResult};
use crate::geometry::Footprint;
use crate::raster::Raster;
use crate::species::{threatened_species_count, TaxonGroup};

/// Editable project parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectParameter {
    ProjectLength,
    CostPerHaYear,
    ReturnPerHaYear,
}

impl ProjectParameter {
    pub fn name(self) -> &'static str {
        match self {
            ProjectParameter::ProjectLength => "project_length_years",
            ProjectParameter::CostPerHaYear => "cost_per_ha_yr",
            ProjectParameter::ReturnPerHaYear => "return_per_ha_yr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectParameters {
    pub project_length_years: f64,
    /// Average restoration cost (USD / ha / year)
    pub cost_per_ha_yr: f64,
    /// Average return (USD / ha / year)
    pub return_per_ha_yr: f64,
}

impl Default for ProjectParameters {
    fn default() -> Self {
        Self {
            project_length_years: 15.0,
            cost_per_ha_yr: 1686.0,
            return_per_ha_yr: 3788.0,
        }
    }
}

impl ProjectParameters {
    /// Set one parameter; values must be finite and non-negative
    pub fn with(mut self, param: ProjectParameter, value: f64) -> PlannerResult<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(PlannerError::InvalidParameter { name: param.name().to_string(), value });
        }
        match param {
            ProjectParameter::ProjectLength => self.project_length_years = value,
            ProjectParameter::CostPerHaYear => self.cost_per_ha_yr = value,
            ProjectParameter::ReturnPerHaYear => self.return_per_ha_yr = value,
        }
        Ok(self)
    }
}

/// Layers reduced over the project region
#[derive(Debug, Clone)]
pub struct ZonalLayers {
    /// Above-ground carbon sequestration rate (t / ha / year)
    pub carbon_agb: Raster,
    /// Below-ground carbon sequestration rate (t / ha / year)
    pub carbon_bgb: Raster,
    /// People per pixel
    pub population: Raster,
}

/// `area_ha` is kept unrounded for the derived totals and rounded when
/// serialized, like every output except the ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatistics {
    #[serde(serialize_with = "serialize_rounded")]
    pub area_ha: f64,
    pub species_count: usize,
    pub beneficiaries: f64,
    pub carbon_ag: f64,
    pub carbon_bg: f64,
    pub total_cost: f64,
    pub total_return: f64,
    /// `None` when the total cost is zero
    pub return_cost_ratio: Option<f64>,
}

impl ProjectStatistics {
    pub const FIELD_LABELS: [&'static str; 8] = [
        "Restoration Area (ha)",
        "Endangered Species",
        "Beneficiaries",
        "Above-ground Carbon Sequestration (t)",
        "Below-ground Carbon Sequestration (t)",
        "Total Project Cost (USD)",
        "Total Project Return (USD)",
        "Return / Cost Ratio",
    ];

    /// The eight result fields as displayed
    pub fn display_fields(&self) -> [(&'static str, String); 8] {
        let ratio = self
            .return_cost_ratio
            .map_or_else(|| "N/A".to_string(), |r| format!("{:.1}", r));
        let values = [
            format!("{}", self.area_ha.round()),
            self.species_count.to_string(),
            format!("{}", self.beneficiaries),
            format!("{}", self.carbon_ag),
            format!("{}", self.carbon_bg),
            format!("{}", self.total_cost),
            format!("{}", self.total_return),
            ratio,
        ];
        let mut fields = Self::FIELD_LABELS.map(|label| (label, String::new()));
        for (field, value) in fields.iter_mut().zip(values) {
            field.1 = value;
        }
        fields
    }
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.round())
}

/// Rounded (total_cost, total_return, ratio) for an unrounded area
pub fn project_finance(area_ha: f64, params: &ProjectParameters) -> (f64, f64, Option<f64>) {
    let total_cost = (params.cost_per_ha_yr * params.project_length_years * area_ha).round();
    let total_return = (params.return_per_ha_yr * params.project_length_years * area_ha).round();
    let ratio = (total_cost != 0.0).then(|| (total_return / total_cost * 10.0).round() / 10.0);
    (total_cost, total_return, ratio)
}

/// Compute the statistics for a project area
pub fn compute_stats(
    aoi: &Footprint,
    available: &Raster,
    layers: &ZonalLayers,
    species: &[TaxonGroup],
    params: &ProjectParameters,
) -> PlannerResult<ProjectStatistics> {
    let region_raster = available.clip(aoi);
    let region = region_raster.defined_mask();

    let area_ha = region_raster.pixel_area_ha().sum(None).unwrap_or(0.0);

    let species_count = threatened_species_count(species, aoi);

    check_layer(available, &layers.population, "population")?;
    let beneficiaries = layers
        .population
        .unmask(0.0)
        .sum(Some(&region))
        .unwrap_or(0.0)
        .round();

    let carbon_total = |layer: &Raster, name: &str| -> PlannerResult<f64> {
        check_layer(available, layer, name)?;
        let mean = layer.unmask(0.0).mean(Some(&region)).unwrap_or(0.0);
        Ok((area_ha * mean * params.project_length_years).round())
    };
    let carbon_ag = carbon_total(&layers.carbon_agb, "carbon_agb")?;
    let carbon_bg = carbon_total(&layers.carbon_bgb, "carbon_bgb")?;

    let (total_cost, total_return, return_cost_ratio) = project_finance(area_ha, params);

    tracing::debug!(
        pixels = region_raster.count(None),
        area_ha,
        species_count,
        beneficiaries,
        "Zonal statistics reduced"
    );

    Ok(ProjectStatistics {
        area_ha,
        species_count,
        beneficiaries,
        carbon_ag,
        carbon_bg,
        total_cost,
        total_return,
        return_cost_ratio,
    })
}

fn check_layer(available: &Raster, layer: &Raster, name: &str) -> PlannerResult<()> {
    if available.grid() != layer.grid() {
        return Err(PlannerError::GridMismatch {
            layer: name.to_string(),
            expected: available.grid().len(),
            actual: layer.grid().len(),
        });
    }
    Ok(())
}
