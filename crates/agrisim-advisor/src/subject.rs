//! The crop snapshot an advisory report is computed from.
//!
//! Reports are built from a detached copy of the crop's vitals, taken on the
//! tick thread, so a request in flight never reads a crop that has since
//! changed or been removed.

use agrisim_crops::days_planted;
use agrisim_types::{CropEntity, CropId, CropKind, SimTime, WaterNeed, clamp_percent, clamp_unit};
use agrisim_world::species;
use serde::Serialize;

/// Snapshot of one crop plus the species facts the advisor needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorySubject {
    /// Crop the snapshot was taken from.
    pub crop: CropId,
    /// Species.
    pub kind: CropKind,
    /// 0--100.
    pub growth: f64,
    /// 0--100.
    pub health: f64,
    /// 0--100.
    pub water_level: f64,
    /// 0--100.
    pub soil_moisture: f64,
    /// 0--100.
    pub nutrient_level: f64,
    /// 0--100.
    pub disease_level: f64,
    /// 0--1.
    pub environmental_stress: f64,
    /// Whole simulated days since planting.
    pub days_planted: u32,
    /// Whole simulated days left until nominal maturity, never negative.
    pub days_to_maturity: u32,
    /// Nominal days from planting to maturity.
    pub growth_days: u32,
    /// Water-need class.
    pub water_need: WaterNeed,
    /// Human-readable yield per plant.
    pub yield_descriptor: &'static str,
}

impl AdvisorySubject {
    /// Snapshot `entity` at simulated time `now`.
    pub fn from_crop(entity: &CropEntity, now: SimTime, sim_seconds_per_day: f64) -> Self {
        let spec = species(entity.kind);
        let planted = whole_days(days_planted(entity, now, sim_seconds_per_day));
        Self {
            crop: entity.id,
            kind: entity.kind,
            growth: clamp_percent(entity.growth),
            health: clamp_percent(entity.health),
            water_level: clamp_percent(entity.water_level),
            soil_moisture: clamp_percent(entity.soil_moisture),
            nutrient_level: clamp_percent(entity.nutrient_level),
            disease_level: clamp_percent(entity.disease_level),
            environmental_stress: clamp_unit(entity.environmental_stress),
            days_planted: planted,
            days_to_maturity: spec.growth_days.saturating_sub(planted),
            growth_days: spec.growth_days,
            water_need: spec.water_need,
            yield_descriptor: spec.yield_descriptor,
        }
    }

    /// Coarse cache key for this snapshot.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            kind: self.kind,
            growth: decile(self.growth),
            health: decile(self.health),
            water: decile(self.water_level),
            disease: decile(self.disease_level),
        }
    }
}

/// Species plus the deciles of growth, health, water and disease.
///
/// Any change that moves one of those values into another decile produces
/// a different key, which is how cached reports go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    /// Species.
    pub kind: CropKind,
    /// `floor(growth / 10)`.
    pub growth: u8,
    /// `floor(health / 10)`.
    pub health: u8,
    /// `floor(water / 10)`.
    pub water: u8,
    /// `floor(disease / 10)`.
    pub disease: u8,
}

impl core::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}",
            self.kind, self.growth, self.health, self.water, self.disease
        )
    }
}

/// Decile of a percentage, 0--10.
fn decile(value: f64) -> u8 {
    // Clamped to 0..=100 first, so the result fits in 0..=10.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bucket = (clamp_percent(value) / 10.0).floor() as u8;
    bucket
}

/// Floor of a non-negative day count.
fn whole_days(days: f64) -> u32 {
    if days.is_nan() || days <= 0.0 {
        return 0;
    }
    // Saturates at u32::MAX for absurd inputs.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = days.floor() as u32;
    whole
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A snapshot with the given vitals and neutral everything else.
    pub(crate) fn subject(growth: f64, health: f64, water: f64, nutrients: f64, disease: f64) -> AdvisorySubject {
        AdvisorySubject {
            crop: CropId::new(),
            kind: CropKind::Tomato,
            growth,
            health,
            water_level: water,
            soil_moisture: 60.0,
            nutrient_level: nutrients,
            disease_level: disease,
            environmental_stress: 0.1,
            days_planted: 20,
            days_to_maturity: 55,
            growth_days: 75,
            water_need: WaterNeed::Medium,
            yield_descriptor: "3-5 tomatoes per plant",
        }
    }

    #[test]
    fn fingerprint_buckets_by_decile() {
        let a = subject(41.0, 79.9, 50.0, 50.0, 9.0).fingerprint();
        let b = subject(49.9, 70.0, 59.0, 10.0, 0.0).fingerprint();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "tomato_4_7_5_0");

        let c = subject(50.0, 70.0, 59.0, 10.0, 0.0).fingerprint();
        assert_ne!(a, c);
    }

    #[test]
    fn full_values_land_in_top_decile() {
        let fp = subject(100.0, 100.0, 100.0, 100.0, 100.0).fingerprint();
        assert_eq!(fp.growth, 10);
        assert_eq!(fp.disease, 10);
    }

    #[test]
    fn whole_days_floors_and_rejects_nan() {
        assert_eq!(whole_days(3.9), 3);
        assert_eq!(whole_days(-1.0), 0);
        assert_eq!(whole_days(f64::NAN), 0);
    }
}
