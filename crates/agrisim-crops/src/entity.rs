//! Crop entity construction and per-plant genetics.
//!
//! Established plants (initial farm population) start at a random visual
//! stage with established vitals. Seedlings (replants) start at a fixed low
//! growth. Both draw fresh vitals from the same ranges.

use agrisim_types::{CropEntity, CropId, CropKind, GeneticVariation, Position, SimTime, clamp_unit};
use agrisim_world::species;
use rand::Rng;

// Initial vital ranges for a freshly created plant.
const HEALTH_RANGE: (f64, f64) = (60.0, 90.0);
const WATER_RANGE: (f64, f64) = (40.0, 80.0);
const SOIL_RANGE: (f64, f64) = (50.0, 80.0);
const DISEASE_RANGE: (f64, f64) = (0.0, 15.0);
const NUTRIENT_RANGE: (f64, f64) = (60.0, 90.0);
const STRESS_RANGE: (f64, f64) = (0.0, 0.2);

/// Relative spread applied around a cached variation hint.
const HINT_JITTER: f64 = 0.05;

fn roll(rng: &mut impl Rng, (low, high): (f64, f64)) -> f64 {
    rng.random_range(low..=high)
}

fn fresh(
    kind: CropKind,
    position: Position,
    growth: f64,
    planted_at: SimTime,
    last_watered_at: SimTime,
    genetics: GeneticVariation,
    rng: &mut impl Rng,
) -> CropEntity {
    let mut entity = CropEntity {
        id: CropId::new(),
        kind,
        position,
        growth,
        health: roll(rng, HEALTH_RANGE),
        water_level: roll(rng, WATER_RANGE),
        soil_moisture: roll(rng, SOIL_RANGE),
        nutrient_level: roll(rng, NUTRIENT_RANGE),
        disease_level: roll(rng, DISEASE_RANGE),
        environmental_stress: roll(rng, STRESS_RANGE),
        last_watered_at,
        planted_at,
        harvested: false,
        last_advisory: None,
        genetics,
    };
    entity.clamp_vitals();
    entity
}

/// An established plant at a random stage, planted up to half its growth
/// duration before `now` and watered within the last half day.
pub fn established(
    kind: CropKind,
    position: Position,
    now: SimTime,
    sim_seconds_per_day: f64,
    genetics: GeneticVariation,
    rng: &mut impl Rng,
) -> CropEntity {
    let spec = species(kind);
    let upper = (f64::from(spec.stages) * 0.8).max(1.0);
    let offset: f64 = rng.random_range(0.0..upper);
    // Truncation to a small stage index is the intent.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let stage = (offset.floor() as u32).saturating_add(1);
    let growth = spec.growth_for_stage(stage);

    let day = sim_seconds_per_day.max(0.0);
    let planted_ago = rng.random_range(0.0..=f64::from(spec.growth_days) * 0.5) * day;
    let watered_ago = rng.random_range(0.0..=0.5) * day;
    // May lie before the simulation start.
    let planted_at = SimTime(now.seconds() - planted_ago);
    let last_watered_at = SimTime(now.seconds() - watered_ago);

    fresh(kind, position, growth, planted_at, last_watered_at, genetics, rng)
}

/// A newly planted seedling at `growth`, planted and watered at `now`.
pub fn seedling(
    kind: CropKind,
    position: Position,
    now: SimTime,
    growth: f64,
    genetics: GeneticVariation,
    rng: &mut impl Rng,
) -> CropEntity {
    fresh(kind, position, growth, now, now, genetics, rng)
}

/// Randomized genetics used when no hint is available.
pub fn random_genetics(rng: &mut impl Rng) -> GeneticVariation {
    GeneticVariation {
        growth_rate_modifier: rng.random_range(0.8..=1.2),
        disease_resistance: rng.random_range(0.0..=1.0),
        height_variation: rng.random_range(0.8..=1.2),
        color_variation: rng.random_range(0.0..=0.3),
        leaf_count: rng.random_range(0.7..=1.3),
    }
}

/// Genetics derived from a cached hint with a small per-plant jitter.
pub fn genetics_from_hint(hint: &GeneticVariation, rng: &mut impl Rng) -> GeneticVariation {
    let mut jitter = |value: f64| value * (1.0 + rng.random_range(-HINT_JITTER..=HINT_JITTER));
    GeneticVariation {
        growth_rate_modifier: jitter(hint.growth_rate_modifier).clamp(0.5, 1.5),
        disease_resistance: clamp_unit(jitter(hint.disease_resistance)),
        height_variation: jitter(hint.height_variation).clamp(0.5, 1.5),
        color_variation: jitter(hint.color_variation).clamp(0.0, 0.5),
        leaf_count: jitter(hint.leaf_count).clamp(0.5, 1.5),
    }
}

/// Simulated days since the crop was planted.
pub fn days_planted(entity: &CropEntity, now: SimTime, sim_seconds_per_day: f64) -> f64 {
    if sim_seconds_per_day <= 0.0 {
        return 0.0;
    }
    now.since(entity.planted_at) / sim_seconds_per_day
}

/// Simulated days until the species' nominal maturity. Negative when overdue.
pub fn days_to_maturity(entity: &CropEntity, now: SimTime, sim_seconds_per_day: f64) -> f64 {
    f64::from(species(entity.kind).growth_days) - days_planted(entity, now, sim_seconds_per_day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn established_plants_start_in_range() {
        let mut rng = SmallRng::seed_from_u64(42);
        for kind in CropKind::ALL {
            for _ in 0..200 {
                let genetics = random_genetics(&mut rng);
                let crop = established(
                    kind,
                    Position::default(),
                    SimTime(10_000.0),
                    120.0,
                    genetics,
                    &mut rng,
                );
                assert!(crop.vitals_in_range());
                assert!(crop.growth > 0.0);
                assert!(crop.planted_at.seconds() <= 10_000.0);
                assert!(!crop.harvested);
            }
        }
    }

    #[test]
    fn established_plants_are_backdated_before_the_start() {
        let mut rng = SmallRng::seed_from_u64(17);
        let crop = established(
            CropKind::Corn,
            Position::default(),
            SimTime::ZERO,
            120.0,
            GeneticVariation::default(),
            &mut rng,
        );
        assert!(crop.planted_at < SimTime::ZERO);
        assert!(crop.last_watered_at <= SimTime::ZERO);
        assert!(crop.planted_at.seconds() >= -45.0 * 120.0);
        let days = days_planted(&crop, SimTime::ZERO, 120.0);
        assert!(days > 0.0 && days <= 45.0);
        assert!(days_to_maturity(&crop, SimTime::ZERO, 120.0) < 90.0);
    }

    #[test]
    fn seedling_uses_given_growth_and_time() {
        let mut rng = SmallRng::seed_from_u64(1);
        let crop = seedling(
            CropKind::Carrot,
            Position::new(1.0, 0.0, 2.0),
            SimTime(50.0),
            5.0,
            GeneticVariation::default(),
            &mut rng,
        );
        assert!((crop.growth - 5.0).abs() < f64::EPSILON);
        assert_eq!(crop.planted_at, SimTime(50.0));
        assert_eq!(crop.last_watered_at, SimTime(50.0));
    }

    #[test]
    fn random_genetics_in_ranges() {
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..500 {
            let g = random_genetics(&mut rng);
            assert!((0.8..=1.2).contains(&g.growth_rate_modifier));
            assert!((0.0..=1.0).contains(&g.disease_resistance));
            assert!((0.0..=0.3).contains(&g.color_variation));
            assert!((0.7..=1.3).contains(&g.leaf_count));
        }
    }

    #[test]
    fn hint_jitter_stays_close() {
        let mut rng = SmallRng::seed_from_u64(3);
        let hint = GeneticVariation {
            growth_rate_modifier: 1.1,
            disease_resistance: 0.6,
            height_variation: 1.0,
            color_variation: 0.2,
            leaf_count: 1.0,
        };
        for _ in 0..200 {
            let g = genetics_from_hint(&hint, &mut rng);
            assert!((g.growth_rate_modifier - 1.1).abs() <= 1.1 * HINT_JITTER + 1e-9);
            assert!((g.disease_resistance - 0.6).abs() <= 0.6 * HINT_JITTER + 1e-9);
        }
    }

    #[test]
    fn days_are_derived_from_day_length() {
        let mut rng = SmallRng::seed_from_u64(5);
        let crop = seedling(
            CropKind::Lettuce,
            Position::default(),
            SimTime(0.0),
            5.0,
            GeneticVariation::default(),
            &mut rng,
        );
        let now = SimTime(240.0);
        assert!((days_planted(&crop, now, 120.0) - 2.0).abs() < 1e-9);
        assert!((days_to_maturity(&crop, now, 120.0) - 28.0).abs() < 1e-9);
        assert!(days_planted(&crop, now, 0.0).abs() < f64::EPSILON);
    }
}
