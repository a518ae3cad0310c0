//! Sun position and daily event times.
//!
//! Low-precision solar equations working in Julian days since J2000. Accurate
//! to about a minute for event times, which is all the map summary needs.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use serde::Serialize;

const DAY_MS: f64 = 86_400_000.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;
const J0: f64 = 0.0009;
const OBLIQUITY_DEG: f64 = 23.4397;
const PERIHELION_DEG: f64 = 102.9372;

const SUNRISE_ALTITUDE_DEG: f64 = -0.833;
const CIVIL_TWILIGHT_DEG: f64 = -6.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunPosition {
    /// Radians above the horizon.
    pub altitude: f64,
    /// Radians clockwise from north.
    pub azimuth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SunTimes {
    pub dawn: Option<DateTime<Utc>>,
    pub sunrise: Option<DateTime<Utc>>,
    pub solar_noon: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub dusk: Option<DateTime<Utc>>,
}

/// What the map status panel shows for the viewport center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SunSummary {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub sunrise: Option<DateTime<Utc>>,
    pub solar_noon: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

impl SunSummary {
    pub fn at(at: DateTime<Utc>, lat: f64, lon: f64) -> Self {
        let position = sun_position(at, lat, lon);
        let times = sun_times(at, lat, lon);
        Self {
            elevation_deg: position.altitude.to_degrees(),
            azimuth_deg: position.azimuth.to_degrees(),
            sunrise: times.sunrise,
            solar_noon: times.solar_noon,
            sunset: times.sunset,
        }
    }
}

fn to_julian(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / DAY_MS - 0.5 + J1970
}

fn from_julian(j: f64) -> Option<DateTime<Utc>> {
    if !j.is_finite() {
        return None;
    }
    let ms = ((j + 0.5 - J1970) * DAY_MS).round();
    DateTime::from_timestamp_millis(ms as i64)
}

fn to_days(at: DateTime<Utc>) -> f64 {
    to_julian(at) - J2000
}

fn obliquity() -> f64 {
    OBLIQUITY_DEG.to_radians()
}

fn right_ascension(l: f64, b: f64) -> f64 {
    let e = obliquity();
    (l.sin() * e.cos() - b.tan() * e.sin()).atan2(l.cos())
}

fn declination(l: f64, b: f64) -> f64 {
    let e = obliquity();
    (b.sin() * e.cos() + b.cos() * e.sin() * l.sin()).asin()
}

fn sidereal_time(d: f64, lw: f64) -> f64 {
    (280.16 + 360.985_623_5 * d).to_radians() - lw
}

fn solar_mean_anomaly(d: f64) -> f64 {
    (357.5291 + 0.985_600_28 * d).to_radians()
}

fn ecliptic_longitude(m: f64) -> f64 {
    let center = (1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin()).to_radians();
    m + center + PERIHELION_DEG.to_radians() + PI
}

fn julian_cycle(d: f64, lw: f64) -> f64 {
    (d - J0 - lw / (2.0 * PI)).round()
}

fn approx_transit(ht: f64, lw: f64, n: f64) -> f64 {
    J0 + (ht + lw) / (2.0 * PI) + n
}

fn solar_transit_j(ds: f64, m: f64, l: f64) -> f64 {
    J2000 + ds + 0.0053 * m.sin() - 0.0069 * (2.0 * l).sin()
}

/// NaN when the sun never reaches altitude `h` that day.
fn hour_angle(h: f64, phi: f64, dec: f64) -> f64 {
    ((h.sin() - phi.sin() * dec.sin()) / (phi.cos() * dec.cos())).acos()
}

pub fn sun_position(at: DateTime<Utc>, lat: f64, lon: f64) -> SunPosition {
    let lw = -lon.to_radians();
    let phi = lat.to_radians();
    let d = to_days(at);

    let m = solar_mean_anomaly(d);
    let l = ecliptic_longitude(m);
    let dec = declination(l, 0.0);
    let ra = right_ascension(l, 0.0);
    let h = sidereal_time(d, lw) - ra;

    let altitude = (phi.sin() * dec.sin() + phi.cos() * dec.cos() * h.cos()).asin();
    // measured from south, positive westward
    let from_south = h.sin().atan2(h.cos() * phi.sin() - dec.tan() * phi.cos());

    SunPosition {
        altitude,
        azimuth: (from_south + PI).rem_euclid(2.0 * PI),
    }
}

/// Event times for the solar day nearest `at` at the given location.
pub fn sun_times(at: DateTime<Utc>, lat: f64, lon: f64) -> SunTimes {
    let lw = -lon.to_radians();
    let phi = lat.to_radians();
    let d = to_days(at);

    let n = julian_cycle(d, lw);
    let ds = approx_transit(0.0, lw, n);
    let m = solar_mean_anomaly(ds);
    let l = ecliptic_longitude(m);
    let dec = declination(l, 0.0);
    let j_noon = solar_transit_j(ds, m, l);

    let rise_set = |altitude_deg: f64| {
        let w = hour_angle(altitude_deg.to_radians(), phi, dec);
        let a = approx_transit(w, lw, n);
        let j_set = solar_transit_j(a, m, l);
        let j_rise = j_noon - (j_set - j_noon);
        (from_julian(j_rise), from_julian(j_set))
    };

    let (sunrise, sunset) = rise_set(SUNRISE_ALTITUDE_DEG);
    let (dawn, dusk) = rise_set(CIVIL_TWILIGHT_DEG);

    SunTimes {
        dawn,
        sunrise,
        solar_noon: from_julian(j_noon),
        sunset,
        dusk,
    }
}
