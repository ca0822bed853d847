//! Execution handlers for crop actions.
//!
//! Each handler validates, mutates and returns an [`ActionOutcome`]. Every
//! field written goes through the clamping helpers, so no sequence of
//! actions can push a vital out of range.

use agrisim_types::{ActionOutcome, CropEntity, QualityRating, SimTime, clamp_percent, clamp_unit};
use rand::Rng;

use crate::config::{GrowthConfig, HarvestConfig};
use crate::error::CropError;

use super::validation::{ensure_active, validate_harvest};

/// Soil moisture gained per unit of water applied.
const SOIL_PER_WATER: f64 = 1.2;
/// Growth bonus when watering lands soil moisture in the comfortable band.
const WATER_GROWTH_BONUS: f64 = 2.0;
/// Health bonus when watering leaves the plant well hydrated.
const WATER_HEALTH_BONUS: f64 = 5.0;
/// Growth bonus from fertilizing.
const FERTILIZER_GROWTH_BONUS: f64 = 3.0;
/// Health bonus from fertilizing.
const FERTILIZER_HEALTH_BONUS: f64 = 8.0;
/// Stress removed by a treatment.
const TREATMENT_STRESS_RELIEF: f64 = 0.3;

fn roll(rng: &mut impl Rng, (low, high): (f64, f64)) -> f64 {
    if high > low {
        rng.random_range(low..=high)
    } else {
        low
    }
}

/// Water the crop with a random amount.
pub fn water(
    entity: &mut CropEntity,
    config: &GrowthConfig,
    now: SimTime,
    rng: &mut impl Rng,
) -> Result<ActionOutcome, CropError> {
    ensure_active(entity)?;
    let amount = roll(rng, config.water_amount);

    entity.water_level = clamp_percent(entity.water_level + amount);
    entity.soil_moisture = clamp_percent(entity.soil_moisture + amount * SOIL_PER_WATER);
    entity.last_watered_at = now;

    if entity.soil_moisture > 40.0 && entity.soil_moisture < 80.0 {
        entity.growth = clamp_percent(entity.growth + WATER_GROWTH_BONUS);
    }
    if entity.water_level > 50.0 {
        entity.health = clamp_percent(entity.health + WATER_HEALTH_BONUS);
    }

    tracing::debug!(
        crop_id = %entity.id,
        amount,
        water_level = entity.water_level,
        soil_moisture = entity.soil_moisture,
        "watered"
    );

    Ok(ActionOutcome::Watered {
        amount,
        water_level: entity.water_level,
        soil_moisture: entity.soil_moisture,
    })
}

/// Add a fixed dose of nutrients.
pub fn fertilize(entity: &mut CropEntity, config: &GrowthConfig) -> Result<ActionOutcome, CropError> {
    ensure_active(entity)?;
    entity.nutrient_level = clamp_percent(entity.nutrient_level + config.fertilizer_amount);
    entity.growth = clamp_percent(entity.growth + FERTILIZER_GROWTH_BONUS);
    entity.health = clamp_percent(entity.health + FERTILIZER_HEALTH_BONUS);

    tracing::debug!(crop_id = %entity.id, nutrient_level = entity.nutrient_level, "fertilized");

    Ok(ActionOutcome::Fertilized {
        nutrient_level: entity.nutrient_level,
    })
}

/// Apply a treatment of random effectiveness.
pub fn treat(
    entity: &mut CropEntity,
    config: &GrowthConfig,
    rng: &mut impl Rng,
) -> Result<ActionOutcome, CropError> {
    ensure_active(entity)?;
    let effectiveness = roll(rng, config.treatment_effectiveness);

    entity.health = clamp_percent(entity.health + effectiveness * 0.4);
    entity.disease_level = clamp_percent(entity.disease_level - effectiveness * 0.6);
    entity.environmental_stress = clamp_unit(entity.environmental_stress - TREATMENT_STRESS_RELIEF);

    tracing::debug!(
        crop_id = %entity.id,
        effectiveness,
        health = entity.health,
        disease_level = entity.disease_level,
        "treated"
    );

    Ok(ActionOutcome::Treated {
        effectiveness,
        health: entity.health,
        disease_level: entity.disease_level,
    })
}

/// Grade the crop's current state.
pub fn quality_rating(entity: &CropEntity) -> QualityRating {
    let composite = (entity.health
        + entity.water_level
        + entity.nutrient_level
        + (100.0 - entity.disease_level))
        / 4.0;
    QualityRating::from_score(composite)
}

/// Validate and mark the crop harvested. Returns the quality at harvest.
///
/// Only the flag changes; vitals are frozen from here on.
pub fn mark_harvested(
    entity: &mut CropEntity,
    config: &HarvestConfig,
) -> Result<QualityRating, CropError> {
    validate_harvest(entity, config)?;
    let quality = quality_rating(entity);
    entity.harvested = true;
    Ok(quality)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use agrisim_types::{CropId, CropKind, GeneticVariation, Position};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn crop() -> CropEntity {
        CropEntity {
            id: CropId::new(),
            kind: CropKind::Tomato,
            position: Position::default(),
            growth: 50.0,
            health: 60.0,
            water_level: 30.0,
            soil_moisture: 30.0,
            nutrient_level: 50.0,
            disease_level: 40.0,
            environmental_stress: 0.5,
            last_watered_at: SimTime::ZERO,
            planted_at: SimTime::ZERO,
            harvested: false,
            last_advisory: None,
            genetics: GeneticVariation::default(),
        }
    }

    #[test]
    fn fertilize_at_95_caps_at_100() {
        let mut entity = crop();
        entity.nutrient_level = 95.0;
        let outcome = fertilize(&mut entity, &GrowthConfig::default()).unwrap();
        assert!((entity.nutrient_level - 100.0).abs() < f64::EPSILON);
        assert_eq!(outcome, ActionOutcome::Fertilized { nutrient_level: 100.0 });
    }

    #[test]
    fn water_adds_within_range_and_updates_timestamp() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut entity = crop();
        let outcome = water(&mut entity, &GrowthConfig::default(), SimTime(12.0), &mut rng).unwrap();
        let ActionOutcome::Watered { amount, .. } = outcome else {
            panic!("expected watered outcome");
        };
        assert!((25.0..=40.0).contains(&amount));
        assert!((entity.water_level - (30.0 + amount)).abs() < 1e-9);
        assert!((entity.soil_moisture - (30.0 + amount * 1.2)).abs() < 1e-9);
        assert_eq!(entity.last_watered_at, SimTime(12.0));
    }

    #[test]
    fn repeated_watering_never_overflows() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut entity = crop();
        for _ in 0..50 {
            let _ = water(&mut entity, &GrowthConfig::default(), SimTime::ZERO, &mut rng).unwrap();
            assert!(entity.vitals_in_range());
        }
        assert!((entity.water_level - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn treat_reduces_disease_and_stress() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut entity = crop();
        entity.disease_level = 30.0;
        let outcome = treat(&mut entity, &GrowthConfig::default(), &mut rng).unwrap();
        let ActionOutcome::Treated { effectiveness, .. } = outcome else {
            panic!("expected treated outcome");
        };
        assert!((60.0..=90.0).contains(&effectiveness));
        assert!(entity.disease_level.abs() < f64::EPSILON);
        assert!((entity.environmental_stress - 0.2).abs() < 1e-9);
        assert!((entity.health - (60.0 + effectiveness * 0.4)).abs() < 1e-9);
    }

    #[test]
    fn actions_on_harvested_crop_are_rejected_without_change() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut entity = crop();
        entity.harvested = true;
        let before = entity.clone();
        assert!(water(&mut entity, &GrowthConfig::default(), SimTime::ZERO, &mut rng).is_err());
        assert!(fertilize(&mut entity, &GrowthConfig::default()).is_err());
        assert!(treat(&mut entity, &GrowthConfig::default(), &mut rng).is_err());
        assert_eq!(entity, before);
    }

    #[test]
    fn mark_harvested_rejects_without_mutation() {
        let mut entity = crop();
        entity.growth = 79.0;
        let before = entity.clone();
        let err = mark_harvested(&mut entity, &HarvestConfig::default()).unwrap_err();
        assert!(matches!(err, CropError::NotReady { .. }));
        assert_eq!(entity, before);

        entity.growth = 85.0;
        entity.health = 25.0;
        let before = entity.clone();
        let err = mark_harvested(&mut entity, &HarvestConfig::default()).unwrap_err();
        assert!(matches!(err, CropError::TooUnhealthy { .. }));
        assert_eq!(entity, before);
    }

    #[test]
    fn mark_harvested_sets_flag_and_grades() {
        let mut entity = crop();
        entity.growth = 90.0;
        entity.health = 95.0;
        entity.water_level = 90.0;
        entity.nutrient_level = 90.0;
        entity.disease_level = 5.0;
        let quality = mark_harvested(&mut entity, &HarvestConfig::default()).unwrap();
        assert!(entity.harvested);
        assert_eq!(quality, QualityRating::Premium);
    }
}
