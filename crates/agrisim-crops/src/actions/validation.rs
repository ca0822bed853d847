//! Action preconditions.
//!
//! Each check returns `Ok(())` or the [`CropError`] describing the rejection.
//! A rejected action must not have touched the crop.

use agrisim_types::CropEntity;

use crate::config::HarvestConfig;
use crate::error::CropError;

/// Every action except removal requires an unharvested crop.
pub const fn ensure_active(entity: &CropEntity) -> Result<(), CropError> {
    if entity.harvested {
        Err(CropError::AlreadyHarvested(entity.id))
    } else {
        Ok(())
    }
}

/// Harvest requires growth at or above `min_growth` and health strictly
/// above `min_health`. Readiness is checked before health.
pub fn validate_harvest(entity: &CropEntity, config: &HarvestConfig) -> Result<(), CropError> {
    ensure_active(entity)?;
    if entity.growth < config.min_growth {
        return Err(CropError::NotReady {
            growth: entity.growth,
        });
    }
    if entity.health <= config.min_health {
        return Err(CropError::TooUnhealthy {
            health: entity.health,
        });
    }
    Ok(())
}
