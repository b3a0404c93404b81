//! Land-Cover Classifier
//!
//! Reclassifies ESA-CCI land-cover codes into 7 semantic classes and derives
//! the binary masks the availability engine works with.

use std::sync::Arc;

use serde::Serialize;

use crate::raster::Raster;

/// Semantic land-cover class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum LandCoverClass {
    Forest = 1,
    Grassland = 2,
    Cropland = 3,
    Wetland = 4,
    Urban = 5,
    OtherVegetation = 6,
    Water = 7,
}

/// ESA-CCI source code → semantic class
const REMAP_TABLE: [(u16, LandCoverClass); 37] = {
    use LandCoverClass::*;
    [
        (10, Cropland), (11, Cropland), (12, Cropland), (20, Cropland), (30, Cropland), (40, Cropland),
        (50, Forest), (60, Forest), (61, Forest), (62, Forest), (70, Forest), (71, Forest),
        (72, Forest), (80, Forest), (81, Forest), (82, Forest), (90, Forest), (100, Forest),
        (110, Grassland), (120, Grassland), (121, Grassland), (122, Grassland), (130, Grassland),
        (140, Grassland), (150, Grassland), (151, Grassland), (152, Grassland), (153, Grassland),
        (160, Wetland), (170, Wetland), (180, Wetland),
        (190, Urban),
        (200, OtherVegetation), (201, OtherVegetation), (202, OtherVegetation),
        (210, Water),
        (220, OtherVegetation),
    ]
};

impl LandCoverClass {
    /// Look up a raw code; codes outside the table have no class
    pub fn from_code(code: f64) -> Option<Self> {
        if code.fract() != 0.0 || code < 0.0 {
            return None;
        }
        let code = code as u16;
        REMAP_TABLE.iter().find(|(c, _)| *c == code).map(|(_, class)| *class)
    }
}

/// Reclassify a raw code raster to class values 1..=7 (unknown codes masked)
pub fn reclassify(raw: &Raster) -> Raster {
    raw.map(|code| LandCoverClass::from_code(code).map(|c| c as u8 as f64))
}

/// Binary masks derived from the two reference years
///
/// Shared with the reference map layers.
#[derive(Debug, Clone)]
pub struct LandCoverMasks {
    pub grassland_2018: Arc<Raster>,
    pub cropland_2018: Arc<Raster>,
    pub historical_forest_1992: Arc<Raster>,
    pub not_historical_forest_1992: Arc<Raster>,
}

impl LandCoverMasks {
    /// Derive all four masks from the raw 1992 and 2018 bands
    pub fn derive(raw_1992: &Raster, raw_2018: &Raster) -> Self {
        let lc1992 = reclassify(raw_1992);
        let lc2018 = reclassify(raw_2018);

        let is_class = |class: LandCoverClass| move |v: f64| (v == class as u8 as f64).then_some(1.0);

        Self {
            grassland_2018: Arc::new(lc2018.map(is_class(LandCoverClass::Grassland))),
            cropland_2018: Arc::new(lc2018.map(is_class(LandCoverClass::Cropland))),
            historical_forest_1992: Arc::new(lc1992.map(is_class(LandCoverClass::Forest))),
            not_historical_forest_1992: Arc::new(
                lc1992.map(|v| (v != LandCoverClass::Forest as u8 as f64).then_some(1.0)),
            ),
        }
    }
}
