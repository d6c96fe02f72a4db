//! Venue heatmap: a fixed grid of density cells seeded with hotspot regions.

use rand::Rng;
use serde::{Deserialize, Serialize};

use sentri_protocol::{HeatCell, Heatmap, Trend};

use crate::generator::{drift_density, trend_between};

pub const GRID_WIDTH: usize = 20;
pub const GRID_HEIGHT: usize = 15;

/// Per-tick density swing of a cell (±7.5).
const CELL_SPREAD: f64 = 15.0;
const TREND_THRESHOLD: f64 = 5.0;
const PEOPLE_PER_DENSITY_POINT: f64 = 5.0;

/// Hotspot regions as inclusive (x range, y range, base density, extra spread).
const HOTSPOTS: [((usize, usize), (usize, usize), f64, f64); 4] = [
    // main stage
    ((8, 12), (2, 5), 70.0, 25.0),
    // food court
    ((2, 5), (6, 9), 45.0, 20.0),
    // exit area
    ((15, 18), (11, 13), 60.0, 30.0),
    // entrance
    ((1, 3), (1, 3), 50.0, 20.0),
];
const BACKGROUND_SPREAD: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    cells: Vec<HeatCell>,
}

fn people_for(density: f64) -> u64 {
    (density * PEOPLE_PER_DENSITY_POINT).floor() as u64
}

impl HeatmapGrid {
    /// Seed a fresh grid, row-major.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cells = Vec::with_capacity(GRID_WIDTH * GRID_HEIGHT);
        for y in 0..GRID_HEIGHT {
            for x in 0..GRID_WIDTH {
                let hotspot = HOTSPOTS.iter().find(|((x0, x1), (y0, y1), _, _)| {
                    (*x0..=*x1).contains(&x) && (*y0..=*y1).contains(&y)
                });
                let density = match hotspot {
                    Some((_, _, base, spread)) => base + rng.gen::<f64>() * spread,
                    None => rng.gen::<f64>() * BACKGROUND_SPREAD,
                }
                .min(100.0);
                cells.push(HeatCell {
                    x,
                    y,
                    density,
                    trend: Trend::Stable,
                    people_count: people_for(density),
                });
            }
        }
        Self { cells }
    }

    /// Advance every cell by one tick.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for cell in &mut self.cells {
            let next = drift_density(cell.density, CELL_SPREAD, rng);
            cell.trend = trend_between(cell.density, next, TREND_THRESHOLD);
            cell.density = next;
            cell.people_count = people_for(next);
        }
    }

    /// Wire form served on the heatmap endpoint.
    pub fn snapshot(&self) -> Heatmap {
        Heatmap {
            cells: self.cells.clone(),
        }
    }

    pub fn cells(&self) -> &[HeatCell] {
        &self.cells
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&HeatCell> {
        if x >= GRID_WIDTH || y >= GRID_HEIGHT {
            return None;
        }
        self.cells.get(y * GRID_WIDTH + x)
    }

    /// Cells at or above `threshold`, densest first.
    pub fn hotspots(&self, threshold: f64) -> Vec<&HeatCell> {
        let mut hot: Vec<_> = self.cells.iter().filter(|c| c.density >= threshold).collect();
        hot.sort_by(|a, b| b.density.total_cmp(&a.density));
        hot
    }

    pub fn average_density(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().map(|c| c.density).sum::<f64>() / self.cells.len() as f64
    }

    pub fn total_people(&self) -> u64 {
        self.cells.iter().map(|c| c.people_count).sum()
    }
}
