//! Heat-tile generation over a map viewport.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::color::ColorRamp;
use crate::region::Region;
use crate::solar::SolarEstimator;

pub const DEFAULT_GRID_SIZE: u32 = 14;
pub const DEFAULT_MIN_VALUE: f64 = 0.02;
/// Largest accepted grid side; larger requests are clamped.
pub const MAX_GRID_SIZE: u32 = 256;

/// Row/column position of a cell; row 0 is the northernmost row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CellPos {
    pub row: u32,
    pub col: u32,
}

/// Square grid laid over a region. Edges are shared between neighbouring
/// cells so the cells cover the region exactly.
#[derive(Debug, Clone, Copy)]
pub struct TileGrid {
    region: Region,
    size: u32,
}

impl TileGrid {
    pub fn new(region: Region, size: u32) -> Self {
        Self {
            region,
            size: size.min(MAX_GRID_SIZE),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn cell_count(&self) -> u32 {
        self.size * self.size
    }

    pub fn pos_to_index(&self, pos: CellPos) -> Option<u32> {
        if pos.row < self.size && pos.col < self.size {
            Some(pos.row * self.size + pos.col)
        } else {
            None
        }
    }

    pub fn index_to_pos(&self, index: u32) -> Option<CellPos> {
        if index < self.cell_count() {
            Some(CellPos {
                row: index / self.size,
                col: index % self.size,
            })
        } else {
            None
        }
    }

    fn lat_edge(&self, i: u32) -> f64 {
        let north = self.region.north();
        if i == self.size {
            return self.region.south();
        }
        north - self.region.latitude_delta * i as f64 / self.size as f64
    }

    fn lon_edge(&self, i: u32) -> f64 {
        let west = self.region.west();
        if i == self.size {
            return self.region.east();
        }
        west + self.region.longitude_delta * i as f64 / self.size as f64
    }

    /// Corners as `(lat, lon)` in NW, NE, SE, SW order.
    pub fn cell_corners(&self, pos: CellPos) -> [(f64, f64); 4] {
        let north = self.lat_edge(pos.row);
        let south = self.lat_edge(pos.row + 1);
        let west = self.lon_edge(pos.col);
        let east = self.lon_edge(pos.col + 1);
        [(north, west), (north, east), (south, east), (south, west)]
    }

    pub fn cell_center(&self, pos: CellPos) -> (f64, f64) {
        let north = self.lat_edge(pos.row);
        let south = self.lat_edge(pos.row + 1);
        let west = self.lon_edge(pos.col);
        let east = self.lon_edge(pos.col + 1);
        ((north + south) / 2.0, (west + east) / 2.0)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        (0..self.cell_count()).filter_map(move |index| self.index_to_pos(index))
    }
}

/// One evaluated grid cell, kept or not.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSample {
    pub pos: CellPos,
    pub center: (f64, f64),
    pub corners: [(f64, f64); 4],
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub coordinates: [(f64, f64); 4],
    pub fill_color: String,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct HeatTileGenerator {
    estimator: SolarEstimator,
    ramp: ColorRamp,
    min_value: f64,
}

impl Default for HeatTileGenerator {
    fn default() -> Self {
        Self::new(SolarEstimator::default(), ColorRamp::default(), DEFAULT_MIN_VALUE)
    }
}

impl HeatTileGenerator {
    pub fn new(estimator: SolarEstimator, ramp: ColorRamp, min_value: f64) -> Self {
        Self {
            estimator,
            ramp,
            min_value,
        }
    }

    pub fn estimator(&self) -> &SolarEstimator {
        &self.estimator
    }

    /// Evaluates every cell of the grid, before filtering.
    pub fn sample_cells(&self, region: &Region, at: DateTime<Utc>, grid_size: u32) -> Vec<CellSample> {
        let grid = TileGrid::new(*region, grid_size);
        grid.cells()
            .map(|pos| {
                let center = grid.cell_center(pos);
                CellSample {
                    pos,
                    center,
                    corners: grid.cell_corners(pos),
                    value: self.estimator.potential(center.0, center.1, at, region),
                }
            })
            .collect()
    }

    /// Colored tiles for every cell whose potential exceeds the threshold,
    /// row-major from the north-west corner.
    pub fn generate(&self, region: &Region, at: DateTime<Utc>, grid_size: u32) -> Vec<Tile> {
        self.sample_cells(region, at, grid_size)
            .into_iter()
            .filter(|cell| cell.value > self.min_value)
            .map(|cell| Tile {
                coordinates: cell.corners,
                fill_color: self.ramp.interpolate(cell.value).to_string(),
                value: cell.value,
            })
            .collect()
    }
}

/// Tiles with the default estimator, ramp and threshold.
pub fn generate_tiles(region: &Region, at: DateTime<Utc>, grid_size: u32) -> Vec<Tile> {
    HeatTileGenerator::default().generate(region, at, grid_size)
}
