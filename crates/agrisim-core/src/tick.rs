//! Tick cycle: the single entry point that moves the farm forward in time.
//!
//! Each call to [`update`] runs these phases in order:
//!
//! 1. **Clock** -- clamp the step, advance the clock, step the environment
//!    and snapshot it once for every reader in this tick.
//! 2. **Growth** -- apply growth/decay to every crop against the snapshot.
//! 3. **Transitions** -- step harvest transitions; completions schedule the
//!    crop's removal, transitions whose actor vanished are cancelled.
//! 4. **Schedule** -- run removals and replants that have come due.
//! 5. **Advisory** -- apply analysis results that arrived since the last
//!    tick, discarding those for crops that are gone or harvested, and
//!    report refreshed harvest yields as events.
//!
//! Nothing here blocks. Given the same seed and inputs, and an advisory
//! service that is disabled, a run is fully reproducible.

use agrisim_advisor::Delivery;
use agrisim_crops::advance;
use agrisim_types::{CropEvent, Season, SimTime, TickSummary};
use tracing::{debug, info};

use crate::clock::{ClockError, clamp_step};
use crate::registry::{CropRegistry, Planting, lock};
use crate::schedule::ScheduledAction;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Advance the farm by `elapsed` simulated seconds.
///
/// The step is clamped to `[0, MAX_STEP_SIM_SECONDS]`. Events raised by
/// actions since the previous tick are reported first, followed by this
/// tick's own events in phase order.
///
/// # Errors
///
/// Returns [`TickError::Clock`] only if the tick counter would overflow.
///
/// [`MAX_STEP_SIM_SECONDS`]: crate::clock::MAX_STEP_SIM_SECONDS
pub fn update(registry: &mut CropRegistry, elapsed: f64) -> Result<TickSummary, TickError> {
    // --- Phase 1: Clock ---
    let dt = clamp_step(elapsed);
    let (tick, season) = phase_clock(registry, dt)?;
    let environment = registry.environment.snapshot();

    // --- Phase 2: Growth ---
    for entity in registry.crops.values_mut() {
        let result = advance(entity, &environment, dt, &registry.config.growth);
        if result.matured {
            debug!(tick, crop_id = %entity.id, kind = %entity.kind.name(), "crop matured");
            registry.events.push(CropEvent::Matured { crop: entity.id });
        }
    }

    // --- Phase 3: Transitions ---
    phase_transitions(registry, dt);

    // --- Phase 4: Schedule ---
    phase_schedule(registry);

    // --- Phase 5: Advisory ---
    phase_advisory(registry);

    let events = std::mem::take(&mut registry.events);
    let summary = TickSummary {
        tick,
        sim_time: registry.clock.now(),
        season,
        weather: environment.weather,
        crops_alive: registry.crops_alive(),
        events,
    };
    if !summary.events.is_empty() {
        debug!(
            tick,
            events = summary.events.len(),
            crops_alive = summary.crops_alive,
            "tick complete"
        );
    }
    Ok(summary)
}

/// Phase 1: advance the clock and the environment.
fn phase_clock(registry: &mut CropRegistry, dt: f64) -> Result<(u64, Season), TickError> {
    let tick = registry.clock.advance(dt)?;
    let season = registry.clock.season();
    registry.environment.step(registry.clock.day(), season);
    Ok((tick, season))
}

/// Phase 3: step transitions and hand completed harvests to the schedule.
fn phase_transitions(registry: &mut CropRegistry, dt: f64) {
    let report = registry.transitions.update(dt, &mut registry.actors);

    for (actor, crop) in report.cancelled {
        info!(actor_id = %actor, crop_id = %crop, "harvest cancelled, actor gone");
        registry.events.push(CropEvent::HarvestCancelled { crop, actor });
        if let Some(removed) = registry.remove_crop(crop) {
            registry.schedule_replant(removed.kind, removed.position);
        }
    }

    let completed = std::mem::take(&mut *lock(&registry.completions));
    let now = registry.clock.now();
    let due = now.after(registry.config.harvest.removal_delay_seconds.max(0.0));
    for done in completed {
        info!(actor_id = %done.actor, crop_id = %done.crop, "harvest completed");
        registry.events.push(CropEvent::HarvestCompleted {
            crop: done.crop,
            actor: done.actor,
        });
        if let Some(entity) = registry.crops.get(&done.crop) {
            registry.schedule.schedule(
                due,
                ScheduledAction::RemoveCrop {
                    crop: done.crop,
                    kind: entity.kind,
                    position: entity.position,
                },
            );
        }
    }
}

/// Phase 4: run every scheduled action that has come due.
fn phase_schedule(registry: &mut CropRegistry) {
    let now: SimTime = registry.clock.now();
    for action in registry.schedule.pop_due(now) {
        match action {
            ScheduledAction::RemoveCrop {
                crop,
                kind,
                position,
            } => {
                if registry.remove_crop(crop).is_some() {
                    registry.schedule_replant(kind, position);
                }
            }
            ScheduledAction::Replant { kind, position } => {
                let entity = registry.plant(kind, position, Planting::Seedling);
                info!(crop_id = %entity.id, kind = %kind.name(), "crop replanted");
            }
        }
    }
}

/// Phase 5: apply analysis results to crops that still want them and
/// report refreshed harvest yields.
fn phase_advisory(registry: &mut CropRegistry) {
    for delivery in registry.dispatcher.drain() {
        match delivery {
            Delivery::Report { crop, report } => match registry.crops.get_mut(&crop) {
                Some(entity) if !entity.harvested => {
                    let source = report.source;
                    entity.last_advisory = Some(report);
                    debug!(crop_id = %crop, ?source, "advisory report applied");
                    registry.events.push(CropEvent::AdvisoryReady { crop, source });
                }
                _ => {
                    debug!(crop_id = %crop, "advisory report for stale crop discarded");
                    registry.events.push(CropEvent::AdvisoryDiscarded { crop });
                }
            },
            Delivery::Discarded { crop } => {
                registry.events.push(CropEvent::AdvisoryDiscarded { crop });
            }
            Delivery::Yield { crop, text, source } => {
                info!(crop_id = %crop, ?source, yield_prediction = %text, "harvest yield refreshed");
                registry.events.push(CropEvent::HarvestYield { crop, text, source });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use agrisim_types::{ActionKind, ActionOutcome, CropKind, HarvestPhase, Position};

    use super::*;
    use crate::clock::SIM_SECONDS_PER_TICK;
    use crate::config::SimulationConfig;

    fn registry() -> CropRegistry {
        CropRegistry::offline(SimulationConfig::default()).unwrap()
    }

    fn ripe(registry: &mut CropRegistry) -> agrisim_types::CropId {
        let id = registry.create_crop(CropKind::Lettuce, Position::new(4.0, 0.0, 0.0)).id;
        let entity = registry.crops.get_mut(&id).unwrap();
        entity.growth = 90.0;
        entity.health = 90.0;
        id
    }

    fn run(registry: &mut CropRegistry, seconds: f64) -> Vec<CropEvent> {
        let mut events = Vec::new();
        let steps = (seconds / SIM_SECONDS_PER_TICK).ceil();
        let mut taken = 0.0;
        while taken < steps {
            events.extend(update(registry, SIM_SECONDS_PER_TICK).unwrap().events);
            taken += 1.0;
        }
        events
    }

    #[test]
    fn first_summary_reports_planting() {
        let mut registry = registry();
        let id = registry.create_crop(CropKind::Corn, Position::default()).id;
        let summary = update(&mut registry, SIM_SECONDS_PER_TICK).unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.crops_alive, 1);
        assert!(matches!(
            summary.events.first(),
            Some(CropEvent::Planted { crop, kind: CropKind::Corn, .. }) if *crop == id
        ));
        let second = update(&mut registry, SIM_SECONDS_PER_TICK).unwrap();
        assert!(second.events.is_empty());
    }

    #[test]
    fn runaway_step_is_clamped() {
        let mut registry = registry();
        update(&mut registry, 3600.0).unwrap();
        assert!((registry.now().seconds() - 1.0).abs() < 1e-12);
        update(&mut registry, f64::NAN).unwrap();
        assert!((registry.now().seconds() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn harvest_runs_to_removal_and_replant() {
        let mut registry = registry();
        let crop = ripe(&mut registry);
        let position = registry.crop(crop).unwrap().position;

        let outcome = registry.handle_action(ActionKind::Harvest, crop).unwrap();
        let ActionOutcome::HarvestStarted { yield_prediction, .. } = outcome else {
            panic!("expected a started harvest");
        };
        assert!(!yield_prediction.is_empty());

        let mut phases = Vec::new();
        let mut events = Vec::new();
        while let Some(t) = registry.transitions().get(registry.primary_actor()) {
            phases.push(t.phase());
            events.extend(update(&mut registry, SIM_SECONDS_PER_TICK).unwrap().events);
        }
        assert!(phases.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(phases.first(), Some(&HarvestPhase::Approach));
        assert_eq!(phases.last(), Some(&HarvestPhase::Return));
        let completions = events
            .iter()
            .filter(|e| matches!(e, CropEvent::HarvestCompleted { .. }))
            .count();
        assert_eq!(completions, 1);

        // Still on the farm until the removal delay passes.
        assert!(registry.crop(crop).is_some());
        events = run(&mut registry, 2.05);
        assert!(registry.crop(crop).is_none());
        assert!(events.contains(&CropEvent::Removed { crop }));

        events = run(&mut registry, 3.05);
        let replanted = events.iter().find_map(|e| match e {
            CropEvent::Planted { crop, kind, position: p } => Some((*crop, *kind, *p)),
            _ => None,
        });
        let (new_id, kind, new_position) = replanted.unwrap();
        assert_ne!(new_id, crop);
        assert_eq!(kind, CropKind::Lettuce);
        assert_eq!(new_position, position);
        let seedling = registry.crop(new_id).unwrap();
        assert!((seedling.growth - 5.0).abs() < 1.0);
        assert_eq!(seedling.planted_at, seedling.last_watered_at);
    }

    #[test]
    fn cancelled_harvest_removes_now_and_replants_later() {
        let mut registry = registry();
        let crop = ripe(&mut registry);
        registry.handle_action(ActionKind::Harvest, crop).unwrap();
        update(&mut registry, SIM_SECONDS_PER_TICK).unwrap();

        assert_eq!(registry.cancel_harvest(registry.primary_actor()), Some(crop));
        assert!(registry.crop(crop).is_none());
        assert!(registry.transitions().is_empty());

        let events = run(&mut registry, 5.0);
        assert!(!events.iter().any(|e| matches!(e, CropEvent::HarvestCompleted { .. })));
        assert!(events.iter().any(|e| matches!(e, CropEvent::Planted { .. })));
        assert_eq!(registry.len(), 1);
    }
}
