//! Fixed-interval tick loop for the headless engine.
//!
//! [`run_farm`] drives [`agrisim_core::update`] once per
//! `world.tick_interval_ms`, each tick covering [`SIM_SECONDS_PER_TICK`]
//! simulated seconds, and lets the [`Autopilot`] act between ticks. It stops
//! after `world.max_ticks` ticks (never, if zero) or when interrupted.

use std::time::Duration;

use agrisim_core::{CropRegistry, SIM_SECONDS_PER_TICK, update};
use agrisim_types::{CropEvent, TickSummary};
use tracing::{info, trace, warn};

use crate::autopilot::Autopilot;
use crate::error::EngineError;

/// Ticks between periodic status lines.
const STATUS_EVERY_TICKS: u64 = 100;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// `world.max_ticks` ticks ran.
    MaxTicksReached,
    /// Ctrl-C was received.
    Interrupted,
}

/// Running totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Crops planted, initial population excluded.
    pub planted: u64,
    /// Crops that crossed the maturity threshold.
    pub matured: u64,
    /// Harvests started.
    pub harvests_started: u64,
    /// Harvests that ran to completion.
    pub harvests_completed: u64,
    /// Harvests stopped early.
    pub harvests_cancelled: u64,
    /// Advisory reports applied to crops.
    pub advisories: u64,
    /// Advisory results dropped as stale.
    pub advisories_discarded: u64,
    /// Refreshed harvest yield texts.
    pub yields_refreshed: u64,
    /// Caretaker actions the registry refused.
    pub autopilot_rejected: u64,
}

impl RunTotals {
    /// Fold one tick's events into the totals.
    pub fn record(&mut self, events: &[CropEvent]) {
        for event in events {
            let counter = match event {
                CropEvent::Planted { .. } => &mut self.planted,
                CropEvent::Matured { .. } => &mut self.matured,
                CropEvent::HarvestStarted { .. } => &mut self.harvests_started,
                CropEvent::HarvestCompleted { .. } => &mut self.harvests_completed,
                CropEvent::HarvestCancelled { .. } => &mut self.harvests_cancelled,
                CropEvent::AdvisoryReady { .. } => &mut self.advisories,
                CropEvent::AdvisoryDiscarded { .. } => &mut self.advisories_discarded,
                CropEvent::HarvestYield { .. } => &mut self.yields_refreshed,
                CropEvent::Removed { .. } => continue,
            };
            *counter = counter.saturating_add(1);
        }
    }
}

/// Result of a run.
#[derive(Debug)]
pub struct RunResult {
    /// Why the loop stopped.
    pub end_reason: EndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Ticks executed.
    pub total_ticks: u64,
    /// Event totals.
    pub totals: RunTotals,
}

/// Run the tick loop until the tick limit or Ctrl-C.
///
/// # Errors
///
/// Returns [`EngineError::Tick`] if a tick fails unrecoverably.
pub async fn run_farm(
    registry: &mut CropRegistry,
    autopilot: &mut Autopilot,
) -> Result<RunResult, EngineError> {
    let max_ticks = registry.config().world.max_ticks;
    let interval_ms = registry.config().world.tick_interval_ms.max(1);
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut totals = RunTotals::default();
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(max_ticks, tick_interval_ms = interval_ms, "tick loop starting");

    let end_reason = loop {
        if max_ticks > 0 && total_ticks >= max_ticks {
            break EndReason::MaxTicksReached;
        }

        tokio::select! {
            _ = interval.tick() => {}
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                break EndReason::Interrupted;
            }
        }

        let summary = update(registry, SIM_SECONDS_PER_TICK)?;
        total_ticks = total_ticks.saturating_add(1);
        totals.record(&summary.events);

        if let Some(decision) = autopilot.on_tick(registry, summary.tick) {
            trace!(
                crop_id = %decision.crop,
                action = %decision.action,
                ok = decision.result.is_ok(),
                "autopilot decision"
            );
            if decision.result.is_err() {
                totals.autopilot_rejected = totals.autopilot_rejected.saturating_add(1);
            }
        }

        if summary.tick.checked_rem(STATUS_EVERY_TICKS) == Some(0) {
            log_status(registry, &summary);
        }
        last_summary = Some(summary);
    };

    Ok(RunResult {
        end_reason,
        final_summary: last_summary,
        total_ticks,
        totals,
    })
}

fn log_status(registry: &CropRegistry, summary: &TickSummary) {
    let env = registry.environment().state();
    let status = registry.advisory_status();
    info!(
        tick = summary.tick,
        sim_seconds = summary.sim_time.seconds(),
        day = registry.clock().day(),
        season = ?summary.season,
        weather = ?summary.weather,
        temperature = env.temperature,
        humidity = env.humidity,
        crops = registry.len(),
        crops_alive = summary.crops_alive,
        harvesting = registry.transitions().len(),
        scheduled = registry.schedule().len(),
        advisor_connected = status.connected,
        advisor_requests = status.request_count,
        "farm status"
    );
}

/// Log the end of a run.
pub fn log_run_end(registry: &CropRegistry, result: &RunResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "run ended"
    );

    if let Some(summary) = &result.final_summary {
        let outlook = registry.weather_outlook();
        info!(
            tick = summary.tick,
            crops_alive = summary.crops_alive,
            season = ?summary.season,
            weather = ?summary.weather,
            growth_impact = %outlook.growth_impact,
            disease_risk = %outlook.disease_risk,
            "final farm state"
        );
    } else {
        warn!("run ended with no ticks executed");
    }

    let totals = &result.totals;
    let status = registry.advisory_status();
    info!(
        planted = totals.planted,
        matured = totals.matured,
        harvests_started = totals.harvests_started,
        harvests_completed = totals.harvests_completed,
        harvests_cancelled = totals.harvests_cancelled,
        advisories = totals.advisories,
        advisories_discarded = totals.advisories_discarded,
        yields_refreshed = totals.yields_refreshed,
        autopilot_rejected = totals.autopilot_rejected,
        advisor_requests = status.request_count,
        advisor_failures = status.failure_count,
        "run totals"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agrisim_core::SimulationConfig;
    use agrisim_types::{ActorId, CropId, ReportSource};

    use super::*;

    #[test]
    fn totals_count_each_event_kind() {
        let crop = CropId::new();
        let actor = ActorId::new();
        let mut totals = RunTotals::default();
        totals.record(&[
            CropEvent::Matured { crop },
            CropEvent::HarvestCompleted { crop, actor },
            CropEvent::Removed { crop },
            CropEvent::AdvisoryReady {
                crop,
                source: ReportSource::Fallback,
            },
            CropEvent::AdvisoryDiscarded { crop },
        ]);
        assert_eq!(
            totals,
            RunTotals {
                matured: 1,
                harvests_completed: 1,
                advisories: 1,
                advisories_discarded: 1,
                ..RunTotals::default()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_max_ticks() {
        let mut config = SimulationConfig::default();
        config.world.max_ticks = 25;
        config.farm.fill_ratio = 1.0;
        let mut registry = CropRegistry::offline(config).unwrap();
        agrisim_core::populate_farm(&mut registry);
        let mut autopilot = Autopilot::new(5);

        let result = run_farm(&mut registry, &mut autopilot).await.unwrap();

        assert_eq!(result.end_reason, EndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 25);
        assert_eq!(result.final_summary.unwrap().tick, 25);
        assert_eq!(autopilot.decisions(), 5);
        assert!(registry.crops().all(|c| c.vitals_in_range()));
    }
}
