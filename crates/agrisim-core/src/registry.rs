//! The crop registry: owner of every crop, actor and pending farm action.
//!
//! The registry is the action entry point. It validates and applies player
//! actions, starts harvest transitions, routes analysis requests to the
//! advisory dispatcher, and buffers the resulting [`CropEvent`]s until the
//! next tick summary. The tick itself lives in [`crate::tick`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use agrisim_advisor::{Advisor, AdvisorError, AdvisoryDispatcher, AdvisorySubject, Submission};
use agrisim_crops::{
    CompletionCallback, CropError, HarvestCompletion, HarvestTransitions, days_planted,
    days_to_maturity, established, fertilize, genetics_from_hint, mark_harvested, random_genetics,
    seedling, treat, validate_harvest, water,
};
use agrisim_types::{
    ActionKind, ActionOutcome, Actor, ActorId, AdvisoryStatus, CropEntity, CropEvent, CropId,
    CropKind, GeneticVariation, Position, SimTime, WeatherOutlook,
};
use agrisim_world::{EnvironmentModel, weather_outlook};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::clock::{ClockError, SimClock};
use crate::config::SimulationConfig;
use crate::schedule::{Schedule, ScheduledAction};

/// Errors that can occur while building a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The time configuration is unusable.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The advisory engine could not be set up.
    #[error("advisor error: {source}")]
    Advisor {
        /// The underlying advisor error.
        #[from]
        source: AdvisorError,
    },
}

/// How a new crop starts out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Planting {
    /// Random stage, planted some time ago.
    Established,
    /// Fresh seedling at the configured growth, planted now.
    Seedling,
}

/// Owns all simulation state and applies actions to it.
#[derive(Debug)]
pub struct CropRegistry {
    pub(crate) config: SimulationConfig,
    pub(crate) clock: SimClock,
    pub(crate) environment: EnvironmentModel,
    pub(crate) crops: BTreeMap<CropId, CropEntity>,
    pub(crate) actors: BTreeMap<ActorId, Actor>,
    pub(crate) primary_actor: ActorId,
    pub(crate) transitions: HarvestTransitions,
    pub(crate) schedule: Schedule,
    pub(crate) dispatcher: AdvisoryDispatcher,
    pub(crate) rng: SmallRng,
    /// Filled by transition completion callbacks, drained by the tick.
    pub(crate) completions: Arc<Mutex<Vec<HarvestCompletion>>>,
    /// Events raised outside the tick, reported with the next summary.
    pub(crate) events: Vec<CropEvent>,
}

impl CropRegistry {
    /// Build an empty farm around `dispatcher`.
    ///
    /// One primary actor is created at the origin.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Clock`] if the time configuration is invalid.
    pub fn new(
        config: SimulationConfig,
        dispatcher: AdvisoryDispatcher,
    ) -> Result<Self, RegistryError> {
        let clock = SimClock::new(&config.time)?;
        let seed = config.world.seed;
        let primary = Actor::new(Position::default());
        let primary_actor = primary.id;
        let mut actors = BTreeMap::new();
        actors.insert(primary_actor, primary);

        Ok(Self {
            clock,
            environment: EnvironmentModel::new(seed),
            crops: BTreeMap::new(),
            actors,
            primary_actor,
            transitions: HarvestTransitions::new(),
            schedule: Schedule::new(),
            dispatcher,
            rng: SmallRng::seed_from_u64(seed),
            completions: Arc::new(Mutex::new(Vec::new())),
            events: Vec::new(),
            config,
        })
    }

    /// Build an empty farm whose advisor never touches the network and
    /// answers every analysis synchronously.
    ///
    /// # Errors
    ///
    /// Returns an error if the time configuration or the advisory templates
    /// are unusable.
    pub fn offline(config: SimulationConfig) -> Result<Self, RegistryError> {
        let advisor = Advisor::with_backend(&config.advisory, None)?;
        let dispatcher = AdvisoryDispatcher::with_runtime(advisor, None);
        Self::new(config, dispatcher)
    }

    // -----------------------------------------------------------------------
    // Creation and removal
    // -----------------------------------------------------------------------

    /// Plant an established crop of `kind` at `position`.
    ///
    /// Genetics come from the species' variation hint when one has arrived,
    /// otherwise they are randomized. The first creation of each species
    /// asks the advisory service for a hint in the background.
    pub fn create_crop(&mut self, kind: CropKind, position: Position) -> CropEntity {
        self.plant(kind, position, Planting::Established)
    }

    /// Insert a new crop and return a copy of it.
    pub(crate) fn plant(
        &mut self,
        kind: CropKind,
        position: Position,
        planting: Planting,
    ) -> CropEntity {
        let genetics = self.genetics_for(kind);
        let now = self.clock.now();
        let entity = match planting {
            Planting::Established => established(
                kind,
                position,
                now,
                self.clock.sim_seconds_per_day(),
                genetics,
                &mut self.rng,
            ),
            Planting::Seedling => seedling(
                kind,
                position,
                now,
                self.config.harvest.seedling_growth,
                genetics,
                &mut self.rng,
            ),
        };
        let id = entity.id;
        debug!(crop_id = %id, kind = %kind.name(), ?planting, "crop planted");
        self.crops.insert(id, entity.clone());
        self.events.push(CropEvent::Planted { crop: id, kind, position });
        entity
    }

    fn genetics_for(&mut self, kind: CropKind) -> GeneticVariation {
        let genetics = match self.dispatcher.advisor().variation_hint(kind) {
            Some(hint) => genetics_from_hint(&hint, &mut self.rng),
            None => random_genetics(&mut self.rng),
        };
        if self
            .dispatcher
            .request_variation(kind, self.environment.snapshot())
        {
            debug!(kind = %kind.name(), "variation hint requested");
        }
        genetics
    }

    /// Take `crop` off the farm immediately, stopping any harvest of it and
    /// dropping any outstanding analysis.
    pub fn remove_crop(&mut self, crop: CropId) -> Option<CropEntity> {
        if let Some(actor) = self.transitions.stop_for_crop(crop, &mut self.actors) {
            self.events.push(CropEvent::HarvestCancelled { crop, actor });
        }
        let removed = self.crops.remove(&crop)?;
        self.dispatcher.cancel(crop);
        self.events.push(CropEvent::Removed { crop });
        info!(crop_id = %crop, kind = %removed.kind.name(), "crop removed");
        Some(removed)
    }

    /// Stop `actor`'s harvest without completing it.
    ///
    /// The half-harvested crop is removed now and a seedling is scheduled
    /// for its slot. Returns the crop that was being harvested.
    pub fn cancel_harvest(&mut self, actor: ActorId) -> Option<CropId> {
        let crop = self.transitions.stop(actor, &mut self.actors)?;
        self.events.push(CropEvent::HarvestCancelled { crop, actor });
        info!(actor_id = %actor, crop_id = %crop, "harvest cancelled");
        if let Some(removed) = self.remove_crop(crop) {
            self.schedule_replant(removed.kind, removed.position);
        }
        Some(crop)
    }

    pub(crate) fn schedule_replant(&mut self, kind: CropKind, position: Position) {
        let due = self.clock.now().after(self.config.harvest.replant_delay_seconds.max(0.0));
        debug!(kind = %kind.name(), due = due.seconds(), "replant scheduled");
        self.schedule.schedule(due, ScheduledAction::Replant { kind, position });
    }

    /// Add another actor standing at `position`.
    pub fn add_actor(&mut self, position: Position) -> ActorId {
        let actor = Actor::new(position);
        let id = actor.id;
        self.actors.insert(id, actor);
        id
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Apply `kind` to `crop` as the primary actor.
    ///
    /// # Errors
    ///
    /// Returns the [`CropError`] describing why the action was rejected.
    /// A rejected action changes nothing.
    pub fn handle_action(
        &mut self,
        kind: ActionKind,
        crop: CropId,
    ) -> Result<ActionOutcome, CropError> {
        self.handle_action_as(self.primary_actor, kind, crop)
    }

    /// Apply `kind` to `crop` on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns the [`CropError`] describing why the action was rejected.
    /// A rejected action changes nothing.
    pub fn handle_action_as(
        &mut self,
        actor: ActorId,
        kind: ActionKind,
        crop: CropId,
    ) -> Result<ActionOutcome, CropError> {
        let result = match kind {
            ActionKind::Water => {
                let now = self.clock.now();
                let entity = self.crops.get_mut(&crop).ok_or(CropError::CropNotFound(crop))?;
                water(entity, &self.config.growth, now, &mut self.rng)
            }
            ActionKind::Fertilize => {
                let entity = self.crops.get_mut(&crop).ok_or(CropError::CropNotFound(crop))?;
                fertilize(entity, &self.config.growth)
            }
            ActionKind::Treat => {
                let entity = self.crops.get_mut(&crop).ok_or(CropError::CropNotFound(crop))?;
                treat(entity, &self.config.growth, &mut self.rng)
            }
            ActionKind::Harvest => self.harvest(actor, crop),
            ActionKind::Inspect => self.inspect(crop),
            ActionKind::Analyze => self.analyze(crop),
        };

        match &result {
            Ok(outcome) => debug!(crop_id = %crop, action = %kind, ?outcome, "action applied"),
            Err(e) => info!(crop_id = %crop, action = %kind, reason = %e, "action rejected"),
        }
        result
    }

    fn harvest(&mut self, actor_id: ActorId, crop: CropId) -> Result<ActionOutcome, CropError> {
        let actor = self
            .actors
            .get(&actor_id)
            .ok_or(CropError::ActorNotFound(actor_id))?;
        let entity = self.crops.get(&crop).ok_or(CropError::CropNotFound(crop))?;
        validate_harvest(entity, &self.config.harvest)?;

        let inbox = Arc::clone(&self.completions);
        let on_complete: CompletionCallback = Box::new(move |done: &HarvestCompletion| {
            lock(&inbox).push(*done);
        });
        self.transitions
            .start(actor, entity, &self.config.harvest, Some(on_complete))?;

        let now = self.clock.now();
        let spd = self.clock.sim_seconds_per_day();
        let Some(entity) = self.crops.get_mut(&crop) else {
            self.transitions.stop(actor_id, &mut self.actors);
            return Err(CropError::CropNotFound(crop));
        };
        let subject = AdvisorySubject::from_crop(entity, now, spd);
        let quality = match mark_harvested(entity, &self.config.harvest) {
            Ok(quality) => quality,
            Err(e) => {
                self.transitions.stop(actor_id, &mut self.actors);
                return Err(e);
            }
        };

        // The outcome carries the yield text from the cache or heuristics.
        // The refreshed text follows as a `HarvestYield` event, and any
        // analysis still pending is never applied to the harvested crop.
        let yield_prediction = self.dispatcher.advisor().yield_text(&subject);
        self.dispatcher.cancel(crop);
        let refreshing = self.dispatcher.refresh_yield(subject);

        info!(
            crop_id = %crop,
            actor_id = %actor_id,
            ?quality,
            yield_prediction = %yield_prediction,
            refreshing,
            "harvest started"
        );
        self.events.push(CropEvent::HarvestStarted {
            crop,
            actor: actor_id,
            quality,
        });

        Ok(ActionOutcome::HarvestStarted {
            actor: actor_id,
            quality,
            yield_prediction,
        })
    }

    fn inspect(&mut self, crop: CropId) -> Result<ActionOutcome, CropError> {
        let now = self.clock.now();
        let spd = self.clock.sim_seconds_per_day();
        let entity = self.crops.get_mut(&crop).ok_or(CropError::CropNotFound(crop))?;

        if !entity.harvested {
            let subject = AdvisorySubject::from_crop(entity, now, spd);
            if let Submission::Ready(report) = self.dispatcher.submit(subject) {
                entity.last_advisory = Some(report);
            }
        }

        Ok(ActionOutcome::Inspected {
            days_planted: days_planted(entity, now, spd),
            days_to_maturity: days_to_maturity(entity, now, spd),
            last_advisory: entity.last_advisory.clone(),
        })
    }

    fn analyze(&mut self, crop: CropId) -> Result<ActionOutcome, CropError> {
        let now = self.clock.now();
        let spd = self.clock.sim_seconds_per_day();
        let entity = self.crops.get_mut(&crop).ok_or(CropError::CropNotFound(crop))?;
        agrisim_crops::ensure_active(entity)?;

        let subject = AdvisorySubject::from_crop(entity, now, spd);
        match self.dispatcher.submit(subject) {
            Submission::Ready(report) => {
                entity.last_advisory = Some(report.clone());
                Ok(ActionOutcome::Analyzed(report))
            }
            Submission::Pending => Ok(ActionOutcome::AnalysisPending),
        }
    }

    // -----------------------------------------------------------------------
    // Read-only surface
    // -----------------------------------------------------------------------

    /// The crop with this ID.
    pub fn crop(&self, id: CropId) -> Option<&CropEntity> {
        self.crops.get(&id)
    }

    /// Mutable access to a crop, for hosts that edit state directly.
    ///
    /// Callers must keep vitals in range; [`CropEntity::clamp_vitals`]
    /// restores them.
    pub fn crop_mut(&mut self, id: CropId) -> Option<&mut CropEntity> {
        self.crops.get_mut(&id)
    }

    /// Every crop on the farm, harvested ones included, in ID order.
    pub fn crops(&self) -> impl Iterator<Item = &CropEntity> {
        self.crops.values()
    }

    /// Number of crops on the farm, harvested ones included.
    pub fn len(&self) -> usize {
        self.crops.len()
    }

    /// Whether the farm is empty.
    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    /// Crops on the farm that are not harvested.
    pub fn crops_alive(&self) -> u32 {
        let alive = self.crops.values().filter(|c| !c.harvested).count();
        u32::try_from(alive).unwrap_or(u32::MAX)
    }

    /// The default actor used by [`Self::handle_action`].
    pub const fn primary_actor(&self) -> ActorId {
        self.primary_actor
    }

    /// The actor with this ID.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Live harvest transitions.
    pub const fn transitions(&self) -> &HarvestTransitions {
        &self.transitions
    }

    /// Pending removals and replants.
    pub const fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Simulation clock.
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Current simulated time.
    pub const fn now(&self) -> SimTime {
        self.clock.now()
    }

    /// Shared weather and soil model.
    pub const fn environment(&self) -> &EnvironmentModel {
        &self.environment
    }

    /// Active configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The advisory dispatcher.
    pub const fn dispatcher(&self) -> &AdvisoryDispatcher {
        &self.dispatcher
    }

    /// Connectivity and request counters of the advisory service.
    pub fn advisory_status(&self) -> AdvisoryStatus {
        self.dispatcher.advisor().status()
    }

    /// Weather-impact outlook for the current environment.
    pub fn weather_outlook(&self) -> WeatherOutlook {
        weather_outlook(self.environment.state())
    }

    /// Drop every cached advisory report.
    pub fn clear_advisory_cache(&self) {
        self.dispatcher.advisor().clear_cache();
    }

    /// Snapshot of `crop` for the advisory engine.
    pub fn advisory_subject(&self, crop: CropId) -> Option<AdvisorySubject> {
        let now = self.clock.now();
        let spd = self.clock.sim_seconds_per_day();
        self.crops
            .get(&crop)
            .map(|entity| AdvisorySubject::from_crop(entity, now, spd))
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
