//! Growth/decay mechanics applied to crops each tick.
//!
//! [`advance`] integrates one step of coupled dynamics over an explicit
//! simulated-time delta:
//!
//! - Growth at a base rate scaled by genetics, weather and vitals
//! - Water and soil moisture consumed by transpiration
//! - Nutrients consumed in proportion to growth
//! - Health drifting with water, nutrient, moisture, disease and stress bands
//! - Disease progressing in weak or waterlogged plants, receding in healthy ones
//! - Weather stress accumulating, damaging above 0.7, relieved by abundance
//!
//! The delta is sanitized here (NaN and negatives become zero); the caller is
//! responsible for clamping runaway steps. Every vital ends in range.

use agrisim_types::{CropEntity, EnvironmentState, clamp_percent, clamp_unit};

use crate::config::GrowthConfig;

/// Result of advancing one crop by one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthTickResult {
    /// Growth gained this step.
    pub growth_delta: f64,
    /// Growth crossed the maturity threshold this step.
    pub matured: bool,
}

/// Temperature multiplier on growth.
pub fn temperature_factor(temperature: f64) -> f64 {
    if !(10.0..=35.0).contains(&temperature) {
        0.3
    } else if !(15.0..=30.0).contains(&temperature) {
        0.7
    } else {
        1.0
    }
}

/// Humidity multiplier on growth.
pub fn humidity_factor(humidity: f64) -> f64 {
    if !(30.0..=90.0).contains(&humidity) {
        0.5
    } else if !(40.0..=80.0).contains(&humidity) {
        0.8
    } else {
        1.0
    }
}

/// Instantaneous weather stress from threshold violations.
pub fn weather_stress(env: &EnvironmentState) -> f64 {
    let mut stress = 0.0;
    if env.temperature > 30.0 {
        stress += 0.1;
    }
    if env.temperature < 10.0 {
        stress += 0.15;
    }
    if env.humidity > 85.0 {
        stress += 0.08;
    }
    if env.humidity < 30.0 {
        stress += 0.12;
    }
    if env.wind_speed > 15.0 {
        stress += 0.05;
    }
    stress
}

/// Growth per simulated second for `entity` under `env`.
pub fn growth_rate(entity: &CropEntity, env: &EnvironmentState, config: &GrowthConfig) -> f64 {
    config.base_growth_rate
        * entity.genetics.growth_rate_modifier
        * temperature_factor(env.temperature)
        * humidity_factor(env.humidity)
        * (entity.soil_moisture / 100.0).max(0.1)
        * (entity.nutrient_level / 100.0).max(0.1)
        * (entity.health / 100.0).max(0.1)
}

/// Water consumed per simulated second before the consumption scale.
pub fn water_consumption(entity: &CropEntity, env: &EnvironmentState, config: &GrowthConfig) -> f64 {
    let growth_factor = 1.0 + entity.growth / 100.0;
    let temp_factor = (env.temperature / 20.0).max(0.5);
    let humidity_factor = (1.0 - env.humidity / 100.0).max(0.5);
    let wind_factor = 1.0 + env.wind_speed / 20.0;
    config.water_consumption_rate * growth_factor * temp_factor * humidity_factor * wind_factor
}

/// Health change per simulated second from the vital bands.
pub fn health_rate(entity: &CropEntity) -> f64 {
    let mut change = 0.0;
    if entity.water_level > 40.0 && entity.water_level < 80.0 {
        change += 0.2;
    }
    if entity.nutrient_level > 50.0 {
        change += 0.1;
    }
    if entity.soil_moisture > 30.0 && entity.soil_moisture < 70.0 {
        change += 0.1;
    }
    if entity.water_level < 20.0 {
        change -= 0.5;
    }
    if entity.water_level > 90.0 {
        change -= 0.2;
    }
    if entity.nutrient_level < 20.0 {
        change -= 0.3;
    }
    if entity.disease_level > 50.0 {
        change -= 0.4;
    }
    if entity.environmental_stress > 0.8 {
        change -= 0.3;
    }
    change
}

/// Advance `entity` by `dt` simulated seconds under `env`.
///
/// Harvested crops are left untouched.
pub fn advance(
    entity: &mut CropEntity,
    env: &EnvironmentState,
    dt: f64,
    config: &GrowthConfig,
) -> GrowthTickResult {
    let dt = sanitize_dt(dt);
    if entity.harvested || dt <= 0.0 {
        return GrowthTickResult {
            growth_delta: 0.0,
            matured: false,
        };
    }

    let before = entity.growth;

    // Growth.
    let rate = growth_rate(entity, env, config);
    if entity.growth < 100.0 {
        entity.growth = clamp_percent(entity.growth + rate * dt);
    }

    // Water, soil and nutrient consumption.
    let water_used = water_consumption(entity, env, config) * dt * config.consumption_scale;
    entity.water_level = clamp_percent(entity.water_level - water_used);
    entity.soil_moisture = clamp_percent(entity.soil_moisture - water_used * config.soil_drain_ratio);
    let nutrients_used = rate * config.nutrient_consumption_factor * dt * config.consumption_scale;
    entity.nutrient_level = clamp_percent(entity.nutrient_level - nutrients_used);

    // Health.
    entity.health = clamp_percent(entity.health + health_rate(entity) * dt);

    // Disease.
    let progression =
        (1.0 - clamp_unit(entity.genetics.disease_resistance)) * config.disease_progression_rate * dt;
    if entity.health < 60.0 || entity.soil_moisture > 85.0 {
        entity.disease_level = clamp_percent(entity.disease_level + progression);
    } else if entity.health > 80.0 && entity.soil_moisture < 70.0 {
        entity.disease_level =
            clamp_percent(entity.disease_level - progression * config.disease_recovery_factor);
    }

    // Environmental stress.
    let accumulated = weather_stress(env) * config.stress_scale * dt;
    entity.environmental_stress = clamp_unit(entity.environmental_stress + accumulated);
    if entity.environmental_stress > 0.7 {
        entity.health = clamp_percent(entity.health - config.stress_damage_rate * dt);
    }
    if entity.environmental_stress > 0.0 && entity.water_level > 60.0 && entity.nutrient_level > 50.0 {
        entity.environmental_stress =
            clamp_unit(entity.environmental_stress - config.stress_relief_rate * dt);
    }

    entity.clamp_vitals();

    GrowthTickResult {
        growth_delta: entity.growth - before,
        matured: before < config.maturity_threshold && entity.growth >= config.maturity_threshold,
    }
}

/// NaN, infinite and negative deltas become zero.
pub fn sanitize_dt(dt: f64) -> f64 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}
