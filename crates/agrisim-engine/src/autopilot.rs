//! Scripted caretaker that tends the farm while the engine runs headless.
//!
//! Every few ticks the autopilot looks for the crop in the worst shape and
//! issues the single action that addresses its most pressing need. Ripe
//! crops are harvested as soon as the primary actor is free.

use agrisim_core::CropRegistry;
use agrisim_crops::CropError;
use agrisim_types::{ActionKind, ActionOutcome, CropEntity, CropId};
use tracing::{debug, info};

/// Ticks between caretaker decisions by default.
pub const DEFAULT_DECISION_INTERVAL: u64 = 10;

/// Every this many decisions, a routine analysis is requested instead of
/// an idle turn.
const ANALYSIS_EVERY: u64 = 5;

const DISEASE_TRIGGER: f64 = 50.0;
const WATER_TRIGGER: f64 = 30.0;
const NUTRIENT_TRIGGER: f64 = 30.0;

/// One caretaker decision and what came of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Crop the action targeted.
    pub crop: CropId,
    /// Action issued.
    pub action: ActionKind,
    /// Result of the action entry point.
    pub result: Result<ActionOutcome, CropError>,
}

/// The caretaker.
#[derive(Debug, Clone)]
pub struct Autopilot {
    interval: u64,
    decisions: u64,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(DEFAULT_DECISION_INTERVAL)
    }
}

impl Autopilot {
    /// Decide every `interval` ticks (at least every tick).
    pub const fn new(interval: u64) -> Self {
        Self {
            interval: if interval == 0 { 1 } else { interval },
            decisions: 0,
        }
    }

    /// Decisions taken so far.
    pub const fn decisions(&self) -> u64 {
        self.decisions
    }

    /// Act on `tick` if it is a decision tick.
    pub fn on_tick(&mut self, registry: &mut CropRegistry, tick: u64) -> Option<Decision> {
        if tick.checked_rem(self.interval) != Some(0) {
            return None;
        }
        self.decisions = self.decisions.saturating_add(1);

        let (crop, action) = neediest(registry).or_else(|| self.routine_analysis(registry))?;

        let result = registry.handle_action(action, crop);
        match &result {
            Ok(ActionOutcome::HarvestStarted { quality, .. }) => {
                info!(crop_id = %crop, ?quality, "autopilot harvesting");
            }
            Ok(_) => debug!(crop_id = %crop, action = %action, "autopilot acted"),
            Err(e) => {
                debug!(crop_id = %crop, action = %action, reason = %e, "autopilot action rejected");
            }
        }
        Some(Decision { crop, action, result })
    }

    fn routine_analysis(&self, registry: &CropRegistry) -> Option<(CropId, ActionKind)> {
        if self.decisions.checked_rem(ANALYSIS_EVERY) != Some(0) {
            return None;
        }
        registry
            .crops()
            .filter(|c| !c.harvested)
            .min_by(|a, b| condition(a).total_cmp(&condition(b)))
            .map(|c| (c.id, ActionKind::Analyze))
    }
}

/// Pick the crop with the most urgent need and the action that answers it.
///
/// Harvesting beats treatment, which beats watering, which beats
/// fertilizing; within one kind of need the worst case wins.
fn neediest(registry: &CropRegistry) -> Option<(CropId, ActionKind)> {
    let harvest = &registry.config().harvest;
    let actor_busy = registry.transitions().is_busy(registry.primary_actor());
    registry
        .crops()
        .filter(|c| !c.harvested)
        .filter_map(|c| {
            let ripe = c.growth >= harvest.min_growth && c.health > harvest.min_health;
            let (tier, urgency, action) = if ripe && !actor_busy {
                (3_u8, c.growth, ActionKind::Harvest)
            } else if c.disease_level > DISEASE_TRIGGER {
                (2, c.disease_level, ActionKind::Treat)
            } else if c.water_level < WATER_TRIGGER {
                (1, 100.0 - c.water_level, ActionKind::Water)
            } else if c.nutrient_level < NUTRIENT_TRIGGER {
                (0, 100.0 - c.nutrient_level, ActionKind::Fertilize)
            } else {
                return None;
            };
            Some((tier, urgency, c.id, action))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)))
        .map(|(_, _, id, action)| (id, action))
}

/// Composite condition score; lower is worse.
fn condition(c: &CropEntity) -> f64 {
    (c.health + c.water_level + c.nutrient_level + (100.0 - c.disease_level)) / 4.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use agrisim_core::SimulationConfig;
    use agrisim_types::{CropKind, Position};

    use super::*;

    fn registry_with(vitals: &[(f64, f64, f64, f64, f64)]) -> (CropRegistry, Vec<CropId>) {
        let mut registry = CropRegistry::offline(SimulationConfig::default()).unwrap();
        let ids = vitals
            .iter()
            .map(|&(growth, health, water, nutrients, disease)| {
                let id = registry.create_crop(CropKind::Carrot, Position::default()).id;
                let c = registry.crop_mut(id).unwrap();
                c.growth = growth;
                c.health = health;
                c.water_level = water;
                c.nutrient_level = nutrients;
                c.disease_level = disease;
                id
            })
            .collect();
        (registry, ids)
    }

    #[test]
    fn only_acts_on_decision_ticks() {
        let (mut registry, _) = registry_with(&[(40.0, 70.0, 10.0, 60.0, 5.0)]);
        let mut pilot = Autopilot::new(10);
        assert!(pilot.on_tick(&mut registry, 7).is_none());
        assert_eq!(pilot.decisions(), 0);
        let decision = pilot.on_tick(&mut registry, 10).unwrap();
        assert_eq!(decision.action, ActionKind::Water);
        assert!(decision.result.is_ok());
    }

    #[test]
    fn ripe_crop_is_harvested_first() {
        let (mut registry, ids) = registry_with(&[
            (40.0, 70.0, 10.0, 60.0, 5.0),
            (95.0, 80.0, 60.0, 60.0, 5.0),
        ]);
        let mut pilot = Autopilot::new(1);
        let decision = pilot.on_tick(&mut registry, 1).unwrap();
        assert_eq!(decision.crop, ids[1]);
        assert_eq!(decision.action, ActionKind::Harvest);

        // The actor is now busy, so the thirsty crop is next.
        let decision = pilot.on_tick(&mut registry, 2).unwrap();
        assert_eq!(decision.crop, ids[0]);
        assert_eq!(decision.action, ActionKind::Water);
    }

    #[test]
    fn disease_outranks_thirst() {
        let (mut registry, ids) = registry_with(&[
            (40.0, 70.0, 20.0, 60.0, 5.0),
            (40.0, 50.0, 60.0, 60.0, 70.0),
        ]);
        let decision = Autopilot::new(1).on_tick(&mut registry, 1).unwrap();
        assert_eq!(decision.crop, ids[1]);
        assert_eq!(decision.action, ActionKind::Treat);
    }

    #[test]
    fn healthy_farm_gets_routine_analysis() {
        let (mut registry, ids) = registry_with(&[(40.0, 70.0, 60.0, 60.0, 5.0)]);
        let mut pilot = Autopilot::new(1);
        for tick in 1..=4 {
            assert!(pilot.on_tick(&mut registry, tick).is_none());
        }
        let decision = pilot.on_tick(&mut registry, 5).unwrap();
        assert_eq!(decision.crop, ids[0]);
        assert_eq!(decision.action, ActionKind::Analyze);
        assert!(matches!(decision.result, Ok(ActionOutcome::Analyzed(_))));
    }
}
