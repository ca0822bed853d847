//! Tunables for crop growth, actions and harvesting.
//!
//! These values correspond to the `growth` and `harvest` sections of
//! `agrisim-config.yaml`. Every field has a serde default, so a partial
//! section only overrides what it names. Rates are per simulated second.

use serde::{Deserialize, Serialize};

/// Growth/decay rates and action magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthConfig {
    /// Base growth per simulated second before any factor (default: 0.01).
    #[serde(default = "default_base_growth_rate")]
    pub base_growth_rate: f64,

    /// Base water consumption per simulated second (default: 0.05).
    #[serde(default = "default_water_consumption_rate")]
    pub water_consumption_rate: f64,

    /// Scale applied to water and nutrient consumption (default: 0.1).
    #[serde(default = "default_consumption_scale")]
    pub consumption_scale: f64,

    /// Soil moisture lost per unit of water consumed (default: 0.8).
    #[serde(default = "default_soil_drain_ratio")]
    pub soil_drain_ratio: f64,

    /// Nutrients consumed per unit of growth rate (default: 0.5).
    #[serde(default = "default_nutrient_consumption_factor")]
    pub nutrient_consumption_factor: f64,

    /// Disease gained per simulated second at zero resistance (default: 0.01).
    #[serde(default = "default_disease_progression_rate")]
    pub disease_progression_rate: f64,

    /// Fraction of the progression rate at which disease recedes (default: 0.5).
    #[serde(default = "default_disease_recovery_factor")]
    pub disease_recovery_factor: f64,

    /// Scale applied to accumulated weather stress (default: 0.1).
    #[serde(default = "default_stress_scale")]
    pub stress_scale: f64,

    /// Stress shed per simulated second when well supplied (default: 0.05).
    #[serde(default = "default_stress_relief_rate")]
    pub stress_relief_rate: f64,

    /// Health lost per simulated second above the stress damage threshold (default: 0.5).
    #[serde(default = "default_stress_damage_rate")]
    pub stress_damage_rate: f64,

    /// Growth at which a crop is mature and harvestable (default: 80).
    #[serde(default = "default_maturity_threshold")]
    pub maturity_threshold: f64,

    /// Watering amount range (default: 25--40).
    #[serde(default = "default_water_amount")]
    pub water_amount: (f64, f64),

    /// Nutrients added by fertilizing (default: 40).
    #[serde(default = "default_fertilizer_amount")]
    pub fertilizer_amount: f64,

    /// Treatment effectiveness range (default: 60--90).
    #[serde(default = "default_treatment_effectiveness")]
    pub treatment_effectiveness: (f64, f64),
}

fn default_base_growth_rate() -> f64 {
    0.01
}

fn default_water_consumption_rate() -> f64 {
    0.05
}

fn default_consumption_scale() -> f64 {
    0.1
}

fn default_soil_drain_ratio() -> f64 {
    0.8
}

fn default_nutrient_consumption_factor() -> f64 {
    0.5
}

fn default_disease_progression_rate() -> f64 {
    0.01
}

fn default_disease_recovery_factor() -> f64 {
    0.5
}

fn default_stress_scale() -> f64 {
    0.1
}

fn default_stress_relief_rate() -> f64 {
    0.05
}

fn default_stress_damage_rate() -> f64 {
    0.5
}

fn default_maturity_threshold() -> f64 {
    80.0
}

fn default_water_amount() -> (f64, f64) {
    (25.0, 40.0)
}

fn default_fertilizer_amount() -> f64 {
    40.0
}

fn default_treatment_effectiveness() -> (f64, f64) {
    (60.0, 90.0)
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            base_growth_rate: default_base_growth_rate(),
            water_consumption_rate: default_water_consumption_rate(),
            consumption_scale: default_consumption_scale(),
            soil_drain_ratio: default_soil_drain_ratio(),
            nutrient_consumption_factor: default_nutrient_consumption_factor(),
            disease_progression_rate: default_disease_progression_rate(),
            disease_recovery_factor: default_disease_recovery_factor(),
            stress_scale: default_stress_scale(),
            stress_relief_rate: default_stress_relief_rate(),
            stress_damage_rate: default_stress_damage_rate(),
            maturity_threshold: default_maturity_threshold(),
            water_amount: default_water_amount(),
            fertilizer_amount: default_fertilizer_amount(),
            treatment_effectiveness: default_treatment_effectiveness(),
        }
    }
}

/// Harvest preconditions, transition timing and replant delays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Minimum growth to harvest (default: 80).
    #[serde(default = "default_min_growth")]
    pub min_growth: f64,

    /// Health must be strictly above this to harvest (default: 30).
    #[serde(default = "default_min_health")]
    pub min_health: f64,

    /// Length of the harvest transition in simulated seconds (default: 3).
    #[serde(default = "default_transition_seconds")]
    pub transition_seconds: f64,

    /// How far short of the crop the actor stops (default: 2).
    #[serde(default = "default_approach_standoff")]
    pub approach_standoff: f64,

    /// Delay between transition completion and removal (default: 2).
    #[serde(default = "default_removal_delay_seconds")]
    pub removal_delay_seconds: f64,

    /// Delay between removal and replanting (default: 3).
    #[serde(default = "default_replant_delay_seconds")]
    pub replant_delay_seconds: f64,

    /// Growth of a replanted seedling (default: 5).
    #[serde(default = "default_seedling_growth")]
    pub seedling_growth: f64,
}

fn default_min_growth() -> f64 {
    80.0
}

fn default_min_health() -> f64 {
    30.0
}

fn default_transition_seconds() -> f64 {
    3.0
}

fn default_approach_standoff() -> f64 {
    2.0
}

fn default_removal_delay_seconds() -> f64 {
    2.0
}

fn default_replant_delay_seconds() -> f64 {
    3.0
}

fn default_seedling_growth() -> f64 {
    5.0
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            min_growth: default_min_growth(),
            min_health: default_min_health(),
            transition_seconds: default_transition_seconds(),
            approach_standoff: default_approach_standoff(),
            removal_delay_seconds: default_removal_delay_seconds(),
            replant_delay_seconds: default_replant_delay_seconds(),
            seedling_growth: default_seedling_growth(),
        }
    }
}
