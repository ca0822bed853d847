//! Initial farm layout.
//!
//! The farm is a 2-wide grid of plots. Plot `i` grows species `i mod 5`;
//! within a plot, slots form a `rows x columns` grid centred on the plot and
//! each slot is planted with probability `farm.fill_ratio`.

use agrisim_types::{CropId, CropKind, Position};
use rand::Rng;
use tracing::info;

use crate::config::FarmConfig;
use crate::registry::{CropRegistry, Planting};

/// Distance between plot centres along x.
const PLOT_PITCH_X: f64 = 20.0;
/// Distance between plot centres along z.
const PLOT_PITCH_Z: f64 = 18.0;
/// Shift that centres the two plot columns on the origin.
const FARM_OFFSET_X: f64 = -10.0;
/// Shift that centres the plot rows on the origin.
const FARM_OFFSET_Z: f64 = -9.0;

/// Position of a slot in the farm grid.
pub fn slot_position(farm: &FarmConfig, plot: usize, row: usize, column: usize) -> Position {
    let plot_col = index(plot % 2);
    let plot_row = index(plot / 2);
    let half_columns = index(farm.columns / 2);
    let half_rows = index(farm.rows / 2);

    let x = (index(column) - half_columns)
        .mul_add(farm.column_spacing, plot_col.mul_add(PLOT_PITCH_X, FARM_OFFSET_X));
    let z = (index(row) - half_rows)
        .mul_add(farm.row_spacing, plot_row.mul_add(PLOT_PITCH_Z, FARM_OFFSET_Z));
    Position::new(x, 0.0, z)
}

/// Plant the initial farm. Returns the planted crops in planting order.
pub fn populate_farm(registry: &mut CropRegistry) -> Vec<CropId> {
    let farm = registry.config.farm.clone();
    let mut planted = Vec::new();

    for plot in 0..farm.plots {
        let kind = CropKind::for_plot(plot);
        for row in 0..farm.rows {
            for column in 0..farm.columns {
                if registry.rng.random::<f64>() >= farm.fill_ratio {
                    continue;
                }
                let position = slot_position(&farm, plot, row, column);
                let entity = registry.plant(kind, position, Planting::Established);
                planted.push(entity.id);
            }
        }
    }

    info!(
        plots = farm.plots,
        crops = planted.len(),
        fill_ratio = farm.fill_ratio,
        "farm populated"
    );
    planted
}

/// Grid indices are small; anything beyond `u32` saturates.
fn index(i: usize) -> f64 {
    f64::from(u32::try_from(i).unwrap_or(u32::MAX))
}
