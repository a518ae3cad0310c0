//! Map synchronisation: turns viewport events into refreshed frames.
//!
//! The current view is an explicit [`ViewState`] owned by the caller. Every
//! refresh recomputes tiles, score and sun summary from that view; nothing is
//! cached between refreshes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::color::ColorRamp;
use crate::config::AppConfig;
use crate::geo::{GeoClient, GeoError};
use crate::noise::SeededNoise;
use crate::region::Region;
use crate::score::{score_location, ScoreResult};
use crate::solar::SolarEstimator;
use crate::sun::SunSummary;
use crate::tiles::{HeatTileGenerator, Tile};

pub const LOCATE_FAILED_MESSAGE: &str = "Could not detect your location; showing the default region.";
pub const SEARCH_NOT_FOUND_MESSAGE: &str = "Location not found. Try another address.";
pub const SEARCH_FAILED_MESSAGE: &str = "Search is unavailable right now. Try another address later.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub region: Region,
    pub location_name: Option<String>,
}

impl ViewState {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            location_name: None,
        }
    }

    /// Moves the viewport; the resolved location name survives a pan.
    pub fn pan(&mut self, region: Region) {
        self.region = region.normalized();
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFrame {
    pub region: Region,
    pub location_name: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub tiles: Vec<Tile>,
    pub score: ScoreResult,
    pub sun: SunSummary,
}

#[derive(Debug, Clone)]
pub struct Recentered {
    pub view: ViewState,
    /// Set when the default region was used instead of a geolocation fix.
    pub status: Option<String>,
}

pub struct MapSync {
    tiles: HeatTileGenerator,
    grid_size: u32,
    default_region: Region,
    search_span_deg: f64,
    geo: GeoClient,
}

impl MapSync {
    pub fn from_config(config: &AppConfig) -> Result<Self, GeoError> {
        let estimator = SolarEstimator::new(SeededNoise::new(config.heatmap.noise_seed));
        Ok(Self {
            tiles: HeatTileGenerator::new(estimator, ColorRamp::default(), config.heatmap.min_value),
            grid_size: config.heatmap.grid_size,
            default_region: config.default_region.region(),
            search_span_deg: config.services.search_span_deg,
            geo: GeoClient::new(&config.services)?,
        })
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn default_region(&self) -> Region {
        self.default_region
    }

    pub fn default_view(&self) -> ViewState {
        ViewState::new(self.default_region)
    }

    pub fn tiles(&self, region: &Region, at: DateTime<Utc>, grid_size: u32) -> Vec<Tile> {
        self.tiles.generate(region, at, grid_size)
    }

    /// Recomputes everything shown for `view` at instant `at`.
    pub fn refresh(&self, view: &ViewState, at: DateTime<Utc>) -> MapFrame {
        let region = view.region;
        let tiles = self.tiles.generate(&region, at, self.grid_size);
        let score = score_location(region.latitude, region.longitude, view.location_name.as_deref());
        let sun = SunSummary::at(at, region.latitude, region.longitude);
        debug!(
            lat = region.latitude,
            lon = region.longitude,
            tiles = tiles.len(),
            score = score.score,
            "refreshed map frame"
        );
        MapFrame {
            region,
            location_name: view.location_name.clone(),
            generated_at: at,
            tiles,
            score,
            sun,
        }
    }

    /// Centers on the caller's IP location, or the default region when the
    /// lookup fails or times out. The location name is cleared either way.
    pub async fn recenter(&self) -> Recentered {
        match self.geo.locate().await {
            Ok(fix) => {
                info!(lat = fix.latitude, lon = fix.longitude, city = ?fix.city, "located visitor");
                Recentered {
                    view: ViewState::new(self.default_region.recentered(fix.latitude, fix.longitude)),
                    status: None,
                }
            }
            Err(err) => {
                warn!(error = %err, "geolocation failed, using default region");
                Recentered {
                    view: self.default_view(),
                    status: Some(LOCATE_FAILED_MESSAGE.to_string()),
                }
            }
        }
    }

    /// Resolves `query` and returns a view centered on the first match.
    pub async fn search(&self, query: &str) -> Result<ViewState, GeoError> {
        let place = self.geo.geocode(query).await.map_err(|err| {
            warn!(query, error = %err, "geocoding failed");
            err
        })?;
        info!(query, name = %place.display_name, "geocoded search");
        Ok(ViewState {
            region: Region::new(
                place.latitude,
                place.longitude,
                self.search_span_deg,
                self.search_span_deg,
            ),
            location_name: Some(place.display_name),
        })
    }
}

/// Status text for a failed search.
pub fn search_failure_message(err: &GeoError) -> &'static str {
    match err {
        GeoError::NotFound(_) => SEARCH_NOT_FOUND_MESSAGE,
        _ => SEARCH_FAILED_MESSAGE,
    }
}
