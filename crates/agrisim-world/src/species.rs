//! Static species catalog.
//!
//! Species are immutable and shared by every crop of that kind.

use agrisim_types::{CropKind, WaterNeed};
use serde::Serialize;

use crate::error::WorldError;

/// Immutable per-species constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropSpecies {
    /// Which species this describes.
    pub kind: CropKind,
    /// Mature plant height in metres.
    pub canonical_height: f64,
    /// Number of visual growth stages.
    pub stages: u32,
    /// Water-need class.
    pub water_need: WaterNeed,
    /// Nominal days from planting to maturity.
    pub growth_days: u32,
    /// Human-readable yield per plant.
    pub yield_descriptor: &'static str,
    /// Root depth in metres.
    pub root_depth: f64,
}

impl CropSpecies {
    /// Growth value of an established plant at `stage` (1-based).
    ///
    /// `stage / (stages - 1) * 100`, clamped to 100.
    pub fn growth_for_stage(&self, stage: u32) -> f64 {
        let denominator = f64::from(self.stages.saturating_sub(1).max(1));
        (f64::from(stage) / denominator * 100.0).clamp(0.0, 100.0)
    }

    /// Visual stage (0-based) for a growth value.
    pub fn stage_for_growth(&self, growth: f64) -> u32 {
        let last = self.stages.saturating_sub(1);
        let fraction = (growth / 100.0).clamp(0.0, 1.0);
        let mut stage = 0_u32;
        while stage < last && f64::from(stage.saturating_add(1)) <= fraction * f64::from(last) {
            stage = stage.saturating_add(1);
        }
        stage
    }
}

/// The catalog, in [`CropKind::ALL`] order.
pub static CATALOG: [CropSpecies; 5] = [
    CropSpecies {
        kind: CropKind::Wheat,
        canonical_height: 1.2,
        stages: 5,
        water_need: WaterNeed::Medium,
        growth_days: 60,
        yield_descriptor: "2-3 kg per plant",
        root_depth: 1.5,
    },
    CropSpecies {
        kind: CropKind::Corn,
        canonical_height: 2.5,
        stages: 6,
        water_need: WaterNeed::High,
        growth_days: 90,
        yield_descriptor: "1-2 ears per plant",
        root_depth: 2.0,
    },
    CropSpecies {
        kind: CropKind::Tomato,
        canonical_height: 1.8,
        stages: 5,
        water_need: WaterNeed::Medium,
        growth_days: 75,
        yield_descriptor: "3-5 tomatoes per plant",
        root_depth: 1.2,
    },
    CropSpecies {
        kind: CropKind::Lettuce,
        canonical_height: 0.8,
        stages: 4,
        water_need: WaterNeed::High,
        growth_days: 30,
        yield_descriptor: "1 head per plant",
        root_depth: 0.6,
    },
    CropSpecies {
        kind: CropKind::Carrot,
        canonical_height: 0.9,
        stages: 4,
        water_need: WaterNeed::Low,
        growth_days: 45,
        yield_descriptor: "1 carrot per plant",
        root_depth: 1.0,
    },
];

/// Constants for `kind`.
pub fn species(kind: CropKind) -> &'static CropSpecies {
    match kind {
        CropKind::Wheat => &CATALOG[0],
        CropKind::Corn => &CATALOG[1],
        CropKind::Tomato => &CATALOG[2],
        CropKind::Lettuce => &CATALOG[3],
        CropKind::Carrot => &CATALOG[4],
    }
}

/// Look a species up by case-insensitive name.
pub fn species_by_name(name: &str) -> Result<&'static CropSpecies, WorldError> {
    let wanted = name.trim();
    CATALOG
        .iter()
        .find(|s| s.kind.name().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| WorldError::UnknownSpecies(wanted.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn catalog_matches_kinds() {
        for kind in CropKind::ALL {
            assert_eq!(species(kind).kind, kind);
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(species_by_name("Corn").unwrap().growth_days, 90);
        assert!(matches!(
            species_by_name("rice"),
            Err(WorldError::UnknownSpecies(name)) if name == "rice"
        ));
    }

    #[test]
    fn stage_growth_is_clamped() {
        let lettuce = species(CropKind::Lettuce);
        assert!((lettuce.growth_for_stage(3) - 100.0).abs() < f64::EPSILON);
        assert!((lettuce.growth_for_stage(4) - 100.0).abs() < f64::EPSILON);
        let wheat = species(CropKind::Wheat);
        assert!((wheat.growth_for_stage(1) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn stage_for_growth_spans_all_stages() {
        let wheat = species(CropKind::Wheat);
        assert_eq!(wheat.stage_for_growth(0.0), 0);
        assert_eq!(wheat.stage_for_growth(50.0), 2);
        assert_eq!(wheat.stage_for_growth(100.0), 4);
    }
}
