//! Clients for the external IP-geolocation and geocoding services.
//!
//! Both calls are bounded by a timeout. Callers decide on fallbacks; this
//! module only reports what went wrong.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::ServicesConfig;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service responded with status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("no location found for '{0}'")]
    NotFound(String),
}

/// Coordinates reported by the IP-geolocation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
}

/// First geocoding match for a free-text query.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(&self) -> Option<f64> {
        let value = match self {
            Coordinate::Number(value) => Some(*value),
            Coordinate::Text(text) => text.trim().parse::<f64>().ok(),
        };
        value.filter(|value| value.is_finite())
    }
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    lat: Coordinate,
    lon: Coordinate,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeoClient {
    http: reqwest::Client,
    geolocation_url: String,
    geocoding_url: String,
    geolocation_timeout: Duration,
    geocoding_timeout: Duration,
}

impl GeoClient {
    pub fn new(config: &ServicesConfig) -> Result<Self, GeoError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            geolocation_url: config.geolocation_url.clone(),
            geocoding_url: config.geocoding_url.clone(),
            geolocation_timeout: config.geolocation_timeout(),
            geocoding_timeout: config.geocoding_timeout(),
        })
    }

    /// Looks up the caller's approximate position from their IP address.
    pub async fn locate(&self) -> Result<GeoFix, GeoError> {
        match tokio::time::timeout(self.geolocation_timeout, self.fetch_fix()).await {
            Ok(result) => result,
            Err(_) => Err(GeoError::Timeout(self.geolocation_timeout)),
        }
    }

    async fn fetch_fix(&self) -> Result<GeoFix, GeoError> {
        debug!(url = %self.geolocation_url, "requesting ip geolocation");
        let response = self.http.get(&self.geolocation_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Status(status.as_u16()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|err| GeoError::Malformed(err.to_string()))?;
        parse_fix(&body)
    }

    /// Resolves a free-text address to its first match.
    pub async fn geocode(&self, query: &str) -> Result<Place, GeoError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeoError::NotFound(String::new()));
        }
        match tokio::time::timeout(self.geocoding_timeout, self.fetch_place(query)).await {
            Ok(result) => result,
            Err(_) => Err(GeoError::Timeout(self.geocoding_timeout)),
        }
    }

    async fn fetch_place(&self, query: &str) -> Result<Place, GeoError> {
        debug!(url = %self.geocoding_url, query, "geocoding");
        let response = self
            .http
            .get(&self.geocoding_url)
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GeoError::NotFound(query.to_string()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|err| GeoError::Malformed(err.to_string()))?;
        parse_place(query, body)
    }
}

pub fn parse_fix(body: &Value) -> Result<GeoFix, GeoError> {
    let coordinate = |key: &str| {
        body.get(key)
            .and_then(Value::as_f64)
            .filter(|value| value.is_finite())
            .ok_or_else(|| GeoError::Malformed(format!("missing numeric '{key}'")))
    };
    let latitude = coordinate("latitude")?;
    let longitude = coordinate("longitude")?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(GeoError::Malformed(format!(
            "coordinate ({latitude}, {longitude}) out of range"
        )));
    }
    let city = body
        .get("city")
        .and_then(Value::as_str)
        .filter(|city| !city.is_empty())
        .map(str::to_string);
    Ok(GeoFix {
        latitude,
        longitude,
        city,
    })
}

pub fn parse_place(query: &str, body: Value) -> Result<Place, GeoError> {
    let places: Vec<RawPlace> =
        serde_json::from_value(body).map_err(|err| GeoError::Malformed(err.to_string()))?;
    let first = places
        .into_iter()
        .next()
        .ok_or_else(|| GeoError::NotFound(query.to_string()))?;
    let (Some(latitude), Some(longitude)) = (first.lat.value(), first.lon.value()) else {
        return Err(GeoError::Malformed("non-numeric lat/lon".into()));
    };
    Ok(Place {
        latitude,
        longitude,
        display_name: first.display_name.unwrap_or_else(|| query.to_string()),
    })
}
