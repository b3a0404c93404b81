// Shared synthetic dataset for integration tests
//
// 10x10 grid of 0.01° pixels just south of the equator.
// - 2018: columns 0-4 grassland, 5-9 cropland
// - 1992: rows 0-4 forest, rows 5-9 bare
// - distance to forest = row * 100 m, opportunity cost = col * 10
// - carbon AGB = 2.0, BGB = 0.5, population = 3 per pixel

#![allow(dead_code)]

use restoration_planner::bounds::ReferenceTables;
use restoration_planner::geometry::ProjectArea;
use restoration_planner::{
    CountryBounds, Footprint, Grid, LandCoverMasks, PlanningData, PriorityLayers, Raster,
    RedListCategory, SpeciesRange, TaxonGroup, ZonalLayers,
};
use rustc_hash::FxHashMap;

pub const SIZE: usize = 10;

pub fn grid() -> Grid {
    Grid { west: 30.0, north: 0.0, pixel_size: 0.01, width: SIZE, height: SIZE }
}

pub fn raster(f: impl Fn(usize, usize) -> Option<f64>) -> Raster {
    let g = grid();
    let values = (0..g.len()).map(|i| f(i / SIZE, i % SIZE)).collect();
    Raster::from_values(g, values, "synthetic").unwrap()
}

pub fn rect(west: f64, south: f64, east: f64, north: f64) -> Footprint {
    ProjectArea::Rectangle { west, south, east, north }.to_footprint().unwrap()
}

pub fn bounds() -> CountryBounds {
    CountryBounds {
        dist_min: 0.0,
        dist_max: 900.0,
        cost_min: 0.0,
        cost_max: 90.0,
        carbon_min: 0.0,
        carbon_max: 4.0,
    }
}

pub fn landcover_1992() -> Raster {
    raster(|r, _| Some(if r < 5 { 50.0 } else { 200.0 }))
}

pub fn landcover_2018() -> Raster {
    raster(|_, c| Some(if c < 5 { 130.0 } else { 10.0 }))
}

pub fn dataset() -> PlanningData {
    let masks = LandCoverMasks::derive(&landcover_1992(), &landcover_2018());
    let carbon_agb = raster(|_, _| Some(2.0));

    let priority_layers = PriorityLayers {
        dist_to_forest: raster(|r, _| Some(r as f64 * 100.0)),
        opp_cost: raster(|_, c| Some(c as f64 * 10.0)),
        carbon_rate: carbon_agb.clone(),
    };
    let zonal_layers = ZonalLayers {
        carbon_agb,
        carbon_bgb: raster(|_, _| Some(0.5)),
        population: raster(|_, _| Some(3.0)),
    };

    let reference = ReferenceTables::from_rows(&[("Testland", bounds())]);

    let mut countries = FxHashMap::default();
    countries.insert("Testland".to_string(), rect(30.0, -0.1, 30.1, 0.0));
    countries.insert("Nowhere".to_string(), rect(50.0, 10.0, 51.0, 11.0));

    let species = vec![TaxonGroup {
        name: "mammals".to_string(),
        ranges: vec![
            SpeciesRange {
                binomial: "Diceros bicornis".to_string(),
                category: RedListCategory::CriticallyEndangered,
                // Only over the cropland half
                footprint: rect(30.07, -0.1, 30.1, 0.0),
            },
            SpeciesRange {
                binomial: "Syncerus caffer".to_string(),
                category: RedListCategory::NearThreatened,
                footprint: rect(30.0, -0.1, 30.1, 0.0),
            },
        ],
    }];

    PlanningData::from_parts(masks, priority_layers, zonal_layers, reference, countries, species).unwrap()
}
