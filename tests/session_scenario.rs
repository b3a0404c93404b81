// End-to-end planning scenarios on a synthetic dataset
//
// Run with: cargo test --test session_scenario

mod common;

use approx::assert_relative_eq;
use polars::prelude::*;
use restoration_planner::session::view::PRIORITY_PALETTE;
use restoration_planner::{
    Action, Debouncer, LandCoverKind, PlannerError, PlanningData, PriorityFactor, ProjectArea,
    ProjectParameter, RestorationType, Session, SessionState,
};
use std::time::{Duration, Instant};

fn select_and_display(data: &PlanningData) -> SessionState {
    [
        Action::SelectCountry { name: "Testland".into() },
        Action::SetLandCover { kind: LandCoverKind::Grassland, enabled: true },
        Action::SetRestorationType { kind: RestorationType::Reforestation, enabled: true },
        Action::DisplayAvailableArea,
    ]
    .iter()
    .fold(SessionState::default(), |s, a| s.apply(a, data).unwrap())
}

#[test]
fn test_full_planning_scenario() {
    let data = common::dataset();
    let mut session = Session::new(Debouncer::new(Duration::from_millis(500)));
    session.state = select_and_display(&data);

    // Grassland (cols 0-4) that was forest in 1992 (rows 0-4)
    let available = session.state.available.clone().unwrap();
    assert_eq!(available.defined_count(), 25);

    for action in [
        Action::SetWeight { factor: PriorityFactor::ForestProximity, value: 5 },
        Action::SetWeight { factor: PriorityFactor::OpportunityCost, value: 2 },
        Action::RunAnalysis,
    ] {
        session.dispatch(&action, &data, Instant::now()).unwrap();
    }

    let priority = session.state.priority.clone().unwrap();
    assert_eq!(priority.defined_count(), 25);
    assert_eq!(priority.min_max(None), Some((0.0, 1.0)));
    // Closest to forest and cheapest
    assert_eq!(priority.get(0, 0), Some(1.0));
    assert_eq!(priority.get(4, 4), Some(0.0));

    let view = session.state.view(&data);
    let top = view.layers.last().unwrap();
    assert_eq!(top.name, "Restoration Priority Scaled");
    assert_eq!(top.palette, PRIORITY_PALETTE);

    // Draw over the whole country and let the debounce window pass
    let t0 = Instant::now();
    let area = ProjectArea::Rectangle { west: 30.0, south: -0.1, east: 30.1, north: 0.0 };
    let generation = session.dispatch(&Action::DrawShape { area }, &data, t0).unwrap().unwrap();
    assert!(session.state.stats.is_none());
    assert!(session.settle(generation, &data, t0 + Duration::from_millis(500)).unwrap());

    let stats = session.state.stats.unwrap();
    let grid = data.grid;
    let expected_area: f64 = (0..5).map(|row| 5.0 * grid.pixel_area_m2(row) / 10_000.0).sum();
    assert_relative_eq!(stats.area_ha, expected_area, max_relative = 1e-9);
    assert_eq!(stats.beneficiaries, 75.0);
    // Rhino range lies over cropland only; threatened species count the full AOI
    assert_eq!(stats.species_count, 1);
    assert_eq!(stats.carbon_ag, (stats.area_ha * 2.0 * 15.0).round());
    assert_eq!(stats.carbon_bg, (stats.area_ha * 0.5 * 15.0).round());
    assert_eq!(stats.total_cost, (1686.0 * 15.0 * stats.area_ha).round());
    assert_eq!(stats.total_return, (3788.0 * 15.0 * stats.area_ha).round());
    assert_eq!(
        stats.return_cost_ratio,
        Some((stats.total_return / stats.total_cost * 10.0).round() / 10.0)
    );
    assert_eq!(session.state.view(&data).results[7].value, "2.2");
}

#[test]
fn test_unavailable_aoi_still_reports_species() {
    let data = common::dataset();
    let state = select_and_display(&data)
        // Cropland half only: nothing available under grassland criteria
        .apply(
            &Action::DrawShape {
                area: ProjectArea::Rectangle { west: 30.06, south: -0.1, east: 30.1, north: 0.0 },
            },
            &data,
        )
        .unwrap()
        .settle_project_area(&data)
        .unwrap();

    let stats = state.stats.unwrap();
    assert_eq!(stats.area_ha, 0.0);
    assert_eq!(stats.beneficiaries, 0.0);
    assert_eq!(stats.species_count, 1);
    assert_eq!(stats.return_cost_ratio, None);
    assert_eq!(state.view(&data).results[7].value, "N/A");
}

#[test]
fn test_criteria_flags_and_empty_selection() {
    let data = common::dataset();
    let state = select_and_display(&data);

    // No restoration type selected: available area empty
    let state = state
        .apply(&Action::SetRestorationType { kind: RestorationType::Reforestation, enabled: false }, &data)
        .unwrap();
    assert_eq!(state.available.as_ref().unwrap().defined_count(), 25);
    let state = state.apply(&Action::DisplayAvailableArea, &data).unwrap();
    assert!(state.available.as_ref().unwrap().is_empty());

    // All four flags: whole grid
    let state = [
        Action::SetLandCover { kind: LandCoverKind::Cropland, enabled: true },
        Action::SetRestorationType { kind: RestorationType::Reforestation, enabled: true },
        Action::SetRestorationType { kind: RestorationType::Afforestation, enabled: true },
        Action::DisplayAvailableArea,
    ]
    .iter()
    .fold(state, |s, a| s.apply(a, &data).unwrap());
    assert_eq!(state.available.as_ref().unwrap().defined_count(), 100);
}

#[test]
fn test_rejected_actions_leave_state_untouched() {
    let data = common::dataset();
    let mut session = Session::default();
    session.state = select_and_display(&data);

    let err = session
        .dispatch(&Action::SetWeight { factor: PriorityFactor::CarbonSequestration, value: 9 }, &data, Instant::now())
        .unwrap_err();
    assert!(matches!(err, PlannerError::InvalidWeight { value: 9, .. }));
    assert_eq!(session.state.weights.carbon_sequestration, 0);

    let err = session
        .dispatch(&Action::SelectCountry { name: "Nowhere".into() }, &data, Instant::now())
        .unwrap_err();
    assert!(matches!(err, PlannerError::UnsupportedCountry { .. }));
    assert_eq!(session.state.view(&data).country.as_deref(), Some("Testland"));

    let err = session
        .dispatch(&Action::SetProjectParameter { param: ProjectParameter::CostPerHaYear, value: -5.0 }, &data, Instant::now())
        .unwrap_err();
    assert!(matches!(err, PlannerError::InvalidParameter { .. }));
    assert_eq!(session.state.params.cost_per_ha_yr, 1686.0);
}

#[test]
fn test_load_dataset_from_directory() {
    let dir = std::env::temp_dir().join(format!("planner_load_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let write_layer = |name: &str, values: Vec<Option<f64>>| {
        let mut df = df!["value" => values].unwrap();
        let file = std::fs::File::create(dir.join(name)).unwrap();
        ParquetWriter::new(file).finish(&mut df).unwrap();
    };
    let n = common::SIZE * common::SIZE;
    write_layer("lc1992.parquet", common::landcover_1992().values().to_vec());
    write_layer("lc2018.parquet", common::landcover_2018().values().to_vec());
    write_layer("dist.parquet", vec![Some(100.0); n]);
    write_layer("cost.parquet", vec![Some(10.0); n]);
    write_layer("agb.parquet", vec![Some(2.0); n]);
    write_layer("bgb.parquet", vec![None; n]);

    // Two population years; only 2020 is kept
    let mut years: Vec<i32> = vec![2015; n];
    years.extend(vec![2020; n]);
    let mut pop: Vec<f64> = vec![99.0; n];
    pop.extend(vec![3.0; n]);
    let mut df = df!["year" => years, "value" => pop].unwrap();
    ParquetWriter::new(std::fs::File::create(dir.join("pop.parquet")).unwrap())
        .finish(&mut df)
        .unwrap();

    std::fs::write(dir.join("dmin.csv"), "COUNTRY_NA,min\nTestland,0\n").unwrap();
    std::fs::write(dir.join("dmax.csv"), "COUNTRY_NA,p95\nTestland,900\n").unwrap();
    std::fs::write(dir.join("cost.csv"), "COUNTRY_NA,min_cost,max_cost\nTestland,0,90\n").unwrap();
    std::fs::write(dir.join("carbon.csv"), "COUNTRY_NA,min_rate,max_rate\nTestland,0,4\n").unwrap();
    std::fs::write(
        dir.join("countries.json"),
        r#"[{"COUNTRY_NA":"Testland","rings":[[[[30.0,-0.1],[30.1,-0.1],[30.1,0.0],[30.0,0.0],[30.0,-0.1]]]]}]"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("mammals.json"),
        r#"[{"binomial":"Diceros bicornis","category":"CR","rings":[[[[30.07,-0.1],[30.1,-0.1],[30.1,0.0],[30.07,0.0],[30.07,-0.1]]]]}]"#,
    )
    .unwrap();

    let manifest = serde_json::json!({
        "grid": common::grid(),
        "rasters": {
            "landcover_1992": "lc1992.parquet",
            "landcover_2018": "lc2018.parquet",
            "dist_to_forest": "dist.parquet",
            "opp_cost": "cost.parquet",
            "carbon_agb": "agb.parquet",
            "carbon_bgb": "bgb.parquet",
            "population": "pop.parquet"
        },
        "reference_tables": {
            "dist_min": "dmin.csv",
            "dist_max": "dmax.csv",
            "opp_cost": "cost.csv",
            "carbon_seq": "carbon.csv"
        },
        "species": [{ "name": "mammals", "files": ["mammals.json"] }]
    });
    std::fs::write(dir.join("manifest.json"), manifest.to_string()).unwrap();

    let data = PlanningData::load(&dir, 2020).unwrap();
    assert_eq!(data.grid, common::grid());
    assert_eq!(data.country_names(), vec!["Testland".to_string()]);
    assert_eq!(data.zonal_layers.population.sum(None), Some(300.0));
    assert!(data.zonal_layers.carbon_bgb.is_empty());
    assert_eq!(data.species[0].ranges.len(), 1);
    assert_eq!(data.masks.grassland_2018.defined_count(), 50);

    // Missing year leaves the population layer short: a grid mismatch
    assert!(PlanningData::load(&dir, 1999).is_err());

    std::fs::remove_dir_all(&dir).ok();
}
