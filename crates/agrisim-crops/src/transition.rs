//! Timed four-phase harvest transition, one per actor.
//!
//! A transition is driven by the fraction `p` of its fixed duration that has
//! elapsed:
//!
//! | Phase    | Progress        | Actor pose                                   |
//! |----------|-----------------|----------------------------------------------|
//! | Approach | `p < 0.3`       | eased walk to a standoff point facing the crop |
//! | Harvest  | `0.3 <= p < 0.7`| crouch and reach toward the crop             |
//! | Collect  | `0.7 <= p < 0.9`| stand back up                                |
//! | Return   | `p >= 0.9`      | small bob at ground level                    |
//!
//! At `p >= 1` the transition is terminal: the actor's height is reset and
//! the completion callback fires exactly once. [`HarvestTransitions::stop`]
//! forces terminal cleanup without invoking the callback.
//!
//! The phase only ever moves forward, even if progress were recomputed lower.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use agrisim_types::{Actor, ActorId, CropEntity, CropId, HarvestPhase, Position};

use crate::config::HarvestConfig;
use crate::error::CropError;
use crate::growth::sanitize_dt;

const APPROACH_END: f64 = 0.3;
const HARVEST_END: f64 = 0.7;
const COLLECT_END: f64 = 0.9;

/// How far the actor crouches during the harvest phase.
const CROUCH_DEPTH: f64 = 0.3;
/// How far the actor reaches toward the crop during the harvest phase.
const REACH_DISTANCE: f64 = 0.1;
/// Height of the bob in the return phase.
const BOB_HEIGHT: f64 = 0.05;

/// Delivered when a transition runs to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestCompletion {
    /// Actor that performed the harvest.
    pub actor: ActorId,
    /// Crop that was harvested.
    pub crop: CropId,
}

/// Invoked once when a transition completes. Never invoked on stop.
pub type CompletionCallback = Box<dyn FnOnce(&HarvestCompletion) + Send>;

/// Result of stepping one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStatus {
    /// Still running in the given phase.
    Running(HarvestPhase),
    /// Reached the terminal state this step.
    Completed(HarvestCompletion),
}

/// A live harvest sequence binding one actor to one crop.
pub struct HarvestTransition {
    actor: ActorId,
    crop: CropId,
    origin: Position,
    crop_position: Position,
    target: Position,
    ground_level: f64,
    duration: f64,
    elapsed: f64,
    phase: HarvestPhase,
    on_complete: Option<CompletionCallback>,
}

impl core::fmt::Debug for HarvestTransition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HarvestTransition")
            .field("actor", &self.actor)
            .field("crop", &self.crop)
            .field("phase", &self.phase)
            .field("elapsed", &self.elapsed)
            .field("duration", &self.duration)
            .field("has_callback", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

impl HarvestTransition {
    /// Plan a transition for `actor` toward `crop`.
    ///
    /// The standoff point lies `approach_standoff` units short of the crop on
    /// the line from the actor. An actor already standing on the crop keeps
    /// its position.
    pub fn new(
        actor: &Actor,
        crop: &CropEntity,
        config: &HarvestConfig,
        on_complete: Option<CompletionCallback>,
    ) -> Self {
        let ground_level = actor.ground_level;
        let origin = actor.position;
        let crop_position = Position::new(crop.position.x, ground_level, crop.position.z);

        let dx = crop_position.x - origin.x;
        let dz = crop_position.z - origin.z;
        let distance = dx.hypot(dz);
        let target = if distance > f64::EPSILON {
            let standoff = config.approach_standoff.max(0.0);
            Position::new(
                crop_position.x - dx / distance * standoff,
                ground_level,
                crop_position.z - dz / distance * standoff,
            )
        } else {
            Position::new(origin.x, ground_level, origin.z)
        };

        Self {
            actor: actor.id,
            crop: crop.id,
            origin,
            crop_position,
            target,
            ground_level,
            duration: config.transition_seconds,
            elapsed: 0.0,
            phase: HarvestPhase::Approach,
            on_complete,
        }
    }

    /// Actor performing the harvest.
    pub const fn actor(&self) -> ActorId {
        self.actor
    }

    /// Crop being harvested.
    pub const fn crop(&self) -> CropId {
        self.crop
    }

    /// Current phase.
    pub const fn phase(&self) -> HarvestPhase {
        self.phase
    }

    /// Fraction of the duration elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration.is_finite() && self.duration > 0.0 {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Advance by `dt` simulated seconds and pose `actor` accordingly.
    pub fn update(&mut self, dt: f64, actor: &mut Actor) -> TransitionStatus {
        self.elapsed += sanitize_dt(dt);
        let p = self.progress();
        self.phase = self.phase.max(HarvestPhase::from_progress(p));
        self.pose(p, actor);

        if p >= 1.0 {
            TransitionStatus::Completed(self.finish(actor))
        } else {
            TransitionStatus::Running(self.phase)
        }
    }

    fn pose(&self, p: f64, actor: &mut Actor) {
        match self.phase {
            HarvestPhase::Approach => {
                let t = ease_in_out_cubic((p / APPROACH_END).min(1.0));
                actor.position = lerp(&self.origin, &self.target, t);
                actor.yaw = self.yaw_from(&actor.position, actor.yaw);
            }
            HarvestPhase::Harvest => {
                let hp = (p - APPROACH_END) / (HARVEST_END - APPROACH_END);
                let reach = (hp * PI * 2.0).sin() * REACH_DISTANCE;
                let (ux, uz) = self.unit_toward_crop(&self.target);
                actor.position = Position::new(
                    ux.mul_add(reach, self.target.x),
                    self.ground_level - (hp * PI).sin() * CROUCH_DEPTH,
                    uz.mul_add(reach, self.target.z),
                );
            }
            HarvestPhase::Collect => {
                let cp = ((p - HARVEST_END) / (COLLECT_END - HARVEST_END)).clamp(0.0, 1.0);
                actor.position = Position::new(
                    self.target.x,
                    self.ground_level - CROUCH_DEPTH + ease_out_cubic(cp) * CROUCH_DEPTH,
                    self.target.z,
                );
            }
            HarvestPhase::Return => {
                let rp = ((p - COLLECT_END) / (1.0 - COLLECT_END)).clamp(0.0, 1.0);
                actor.position = Position::new(
                    self.target.x,
                    self.ground_level + (rp * PI * 4.0).sin() * BOB_HEIGHT,
                    self.target.z,
                );
            }
        }
    }

    fn unit_toward_crop(&self, from: &Position) -> (f64, f64) {
        let dx = self.crop_position.x - from.x;
        let dz = self.crop_position.z - from.z;
        let distance = dx.hypot(dz);
        if distance > f64::EPSILON {
            (dx / distance, dz / distance)
        } else {
            (0.0, 0.0)
        }
    }

    fn yaw_from(&self, from: &Position, current: f64) -> f64 {
        let (ux, uz) = self.unit_toward_crop(from);
        if ux.abs() > f64::EPSILON || uz.abs() > f64::EPSILON {
            ux.atan2(uz)
        } else {
            current
        }
    }

    fn finish(&mut self, actor: &mut Actor) -> HarvestCompletion {
        actor.position.y = self.ground_level;
        let completion = HarvestCompletion {
            actor: self.actor,
            crop: self.crop,
        };
        if let Some(callback) = self.on_complete.take() {
            callback(&completion);
        }
        completion
    }

    /// Terminal cleanup without firing the callback.
    fn cancel(self, actor: Option<&mut Actor>) {
        if let Some(actor) = actor {
            actor.position.y = self.ground_level;
        }
    }
}

/// What [`HarvestTransitions::update`] did this step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionReport {
    /// Transitions that reached the terminal state.
    pub completed: Vec<HarvestCompletion>,
    /// Transitions dropped because their actor disappeared.
    pub cancelled: Vec<(ActorId, CropId)>,
}

/// All live transitions, at most one per actor.
#[derive(Debug, Default)]
pub struct HarvestTransitions {
    active: BTreeMap<ActorId, HarvestTransition>,
}

impl HarvestTransitions {
    /// No live transitions.
    pub const fn new() -> Self {
        Self {
            active: BTreeMap::new(),
        }
    }

    /// Start a transition for `actor` toward `crop`.
    ///
    /// Rejected with [`CropError::Busy`] if the actor already has one; the
    /// running transition is left untouched.
    pub fn start(
        &mut self,
        actor: &Actor,
        crop: &CropEntity,
        config: &HarvestConfig,
        on_complete: Option<CompletionCallback>,
    ) -> Result<(), CropError> {
        if self.active.contains_key(&actor.id) {
            return Err(CropError::Busy { actor: actor.id });
        }
        let transition = HarvestTransition::new(actor, crop, config, on_complete);
        tracing::debug!(actor_id = %actor.id, crop_id = %crop.id, "harvest transition started");
        self.active.insert(actor.id, transition);
        Ok(())
    }

    /// Whether `actor` has a live transition.
    pub fn is_busy(&self, actor: ActorId) -> bool {
        self.active.contains_key(&actor)
    }

    /// The live transition of `actor`, if any.
    pub fn get(&self, actor: ActorId) -> Option<&HarvestTransition> {
        self.active.get(&actor)
    }

    /// The actor harvesting `crop`, if any.
    pub fn actor_for_crop(&self, crop: CropId) -> Option<ActorId> {
        self.active
            .values()
            .find(|t| t.crop == crop)
            .map(HarvestTransition::actor)
    }

    /// Number of live transitions.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no transition is live.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Step every live transition by `dt`. Completed ones are discarded.
    pub fn update(&mut self, dt: f64, actors: &mut BTreeMap<ActorId, Actor>) -> TransitionReport {
        let mut report = TransitionReport::default();
        let mut finished = Vec::new();

        for (actor_id, transition) in &mut self.active {
            let Some(actor) = actors.get_mut(actor_id) else {
                finished.push(*actor_id);
                report.cancelled.push((*actor_id, transition.crop));
                continue;
            };
            if let TransitionStatus::Completed(completion) = transition.update(dt, actor) {
                finished.push(*actor_id);
                report.completed.push(completion);
            }
        }

        for actor_id in finished {
            self.active.remove(&actor_id);
        }
        report
    }

    /// Force terminal cleanup of `actor`'s transition without the callback.
    ///
    /// Returns the crop that was being harvested.
    pub fn stop(
        &mut self,
        actor: ActorId,
        actors: &mut BTreeMap<ActorId, Actor>,
    ) -> Option<CropId> {
        let transition = self.active.remove(&actor)?;
        let crop = transition.crop;
        transition.cancel(actors.get_mut(&actor));
        tracing::debug!(actor_id = %actor, crop_id = %crop, "harvest transition stopped");
        Some(crop)
    }

    /// Stop whichever transition is harvesting `crop`.
    pub fn stop_for_crop(
        &mut self,
        crop: CropId,
        actors: &mut BTreeMap<ActorId, Actor>,
    ) -> Option<ActorId> {
        let actor = self.actor_for_crop(crop)?;
        self.stop(actor, actors).map(|_| actor)
    }
}

fn lerp(from: &Position, to: &Position, t: f64) -> Position {
    Position::new(
        (to.x - from.x).mul_add(t, from.x),
        (to.y - from.y).mul_add(t, from.y),
        (to.z - from.z).mul_add(t, from.z),
    )
}

/// Cubic ease in and out over `[0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0f64).mul_add(t, 2.0).powi(3) / 2.0
    }
}

/// Cubic ease out over `[0, 1]`.
pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}
