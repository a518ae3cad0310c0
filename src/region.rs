//! Map viewport geometry.

use serde::{Deserialize, Serialize};

/// Smallest extent, in degrees, a region may have along either axis.
pub const MIN_DELTA_DEG: f64 = 1e-4;

/// Rectangular viewport described by its center and full extents in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    pub fn new(latitude: f64, longitude: f64, latitude_delta: f64, longitude_delta: f64) -> Self {
        Self {
            latitude,
            longitude,
            latitude_delta: clamp_delta(latitude_delta),
            longitude_delta: clamp_delta(longitude_delta),
        }
    }

    /// Same extents, new center.
    pub fn recentered(&self, latitude: f64, longitude: f64) -> Self {
        Self::new(
            latitude,
            longitude,
            self.latitude_delta,
            self.longitude_delta,
        )
    }

    /// Re-applies the delta floor, for regions built by deserialization.
    pub fn normalized(self) -> Self {
        Self::new(
            self.latitude,
            self.longitude,
            self.latitude_delta,
            self.longitude_delta,
        )
    }

    pub fn south(&self) -> f64 {
        self.latitude - self.latitude_delta / 2.0
    }

    pub fn north(&self) -> f64 {
        self.latitude + self.latitude_delta / 2.0
    }

    pub fn west(&self) -> f64 {
        self.longitude - self.longitude_delta / 2.0
    }

    pub fn east(&self) -> f64 {
        self.longitude + self.longitude_delta / 2.0
    }

    /// Area in square degrees.
    pub fn area(&self) -> f64 {
        self.latitude_delta * self.longitude_delta
    }

    /// Euclidean distance from the center with each axis scaled by its extent.
    pub fn normalized_distance(&self, lat: f64, lon: f64) -> f64 {
        let d_lat = (lat - self.latitude) / self.latitude_delta;
        let d_lon = (lon - self.longitude) / self.longitude_delta;
        d_lat.hypot(d_lon)
    }
}

fn clamp_delta(delta: f64) -> f64 {
    if delta.is_finite() {
        delta.abs().max(MIN_DELTA_DEG)
    } else {
        MIN_DELTA_DEG
    }
}
