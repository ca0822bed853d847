//! Headless engine for the Agrisim farm simulation.
//!
//! Loads configuration, plants the farm, and runs the tick loop with a
//! scripted caretaker until the tick limit or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration (`AGRISIM_CONFIG` or `agrisim-config.yaml`)
//! 3. Build the advisory engine and probe the service if one is configured
//! 4. Create the crop registry and plant the farm
//! 5. Run the tick loop
//! 6. Log the result

mod autopilot;
mod error;
mod runner;

use agrisim_advisor::{Advisor, AdvisoryDispatcher};
use agrisim_core::{CropRegistry, SimulationConfig, populate_farm};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::autopilot::Autopilot;
use crate::error::EngineError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, startup or a tick fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("agrisim-engine starting");

    // 2. Load configuration.
    let config = SimulationConfig::load()?;
    info!(
        farm_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        max_ticks = config.world.max_ticks,
        sim_seconds_per_day = config.time.sim_seconds_per_day,
        "Configuration loaded"
    );

    // 3. Advisory engine.
    let advisor = Advisor::new(&config.advisory)?;
    if advisor.is_enabled() {
        let connected = advisor.probe().await;
        info!(
            backend = ?config.advisory.backend,
            model = config.advisory.model,
            connected,
            "Advisory service probed"
        );
    }
    let dispatcher = AdvisoryDispatcher::new(advisor);

    // 4. Registry and initial planting.
    let mut registry = CropRegistry::new(config, dispatcher)?;
    let planted = populate_farm(&mut registry);
    info!(crops = planted.len(), "Farm planted, entering tick loop");

    // 5. Run.
    let mut autopilot = Autopilot::default();
    let result = runner::run_farm(&mut registry, &mut autopilot).await?;

    // 6. Log results.
    runner::log_run_end(&registry, &result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        autopilot_decisions = autopilot.decisions(),
        "agrisim-engine shutdown complete"
    );

    Ok(())
}
