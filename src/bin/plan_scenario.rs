//! Replay a planning scenario from a JSON file of actions
//!
//! Usage: plan_scenario <actions.json>
//!
//! Data is loaded from `DATA_DIR`. Draw/edit events settle immediately after
//! each one, as if the user had stopped editing. Prints the final session view
//! as JSON on stdout.

use anyhow::{bail, Context, Result};
use restoration_planner::{Action, Debouncer, PlannerConfig, PlanningData, Session};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restoration_planner=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: plan_scenario <actions.json>");
    };
    let actions: Vec<Action> = serde_json::from_str(
        &std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?,
    )
    .with_context(|| format!("Failed to parse actions in {}", path))?;

    let config = PlannerConfig::from_env();
    config.log();

    let load_start = Instant::now();
    let data = PlanningData::load(&config.data_dir, config.population_year)?;
    tracing::info!("Datasets loaded in {:.2?}", load_start.elapsed());

    let mut session = Session::new(Debouncer::new(config.debounce));
    for (step, action) in actions.iter().enumerate() {
        let now = Instant::now();
        let outcome = session.dispatch(action, &data, now).and_then(|generation| match generation {
            Some(generation) => session.settle(generation, &data, now + config.debounce).map(|_| ()),
            None => Ok(()),
        });

        match outcome {
            Ok(()) => {}
            // Same as the interactive tool: report and keep the previous state
            Err(e) if e.is_user_error() => {
                tracing::warn!(step, action = action.kind(), "Action rejected: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.state.view(&data))?);
    Ok(())
}
