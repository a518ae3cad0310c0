//! Daily solar-potential estimate for a map cell.
//!
//! The estimate is the product of four factors: noon sun altitude, a haze
//! texture, a relief texture and a vignette that fades cells away from the
//! viewport center. It is a visual approximation, not an irradiance model.

use chrono::{DateTime, Datelike, Utc};

use crate::noise::SeededNoise;
use crate::region::Region;

const AXIAL_TILT_DEG: f64 = 23.44;
const HAZE_BASE: f64 = 0.75;
const HAZE_SPAN: f64 = 0.25;
const RELIEF_BASE: f64 = 0.85;
const RELIEF_SPAN: f64 = 0.25;
const RELIEF_MAX: f64 = 1.1;
const RELIEF_COORD_SCALE: f64 = 0.7;
const DISTANCE_PENALTY: f64 = 0.45;
const DISTANCE_FLOOR: f64 = 0.55;

/// Day of the year of the UTC calendar date, with 1 January as day 1.
pub fn day_of_year(at: DateTime<Utc>) -> u32 {
    at.date_naive().ordinal()
}

/// Approximate solar declination in degrees.
pub fn declination_deg(day: u32) -> f64 {
    let angle = (360.0 / 365.0) * (284.0 + day as f64);
    AXIAL_TILT_DEG * angle.to_radians().sin()
}

/// Sun altitude at local solar noon, in radians. Ignores the hour angle.
pub fn noon_altitude(lat_deg: f64, declination_deg: f64) -> f64 {
    let lat = lat_deg.to_radians();
    let dec = declination_deg.to_radians();
    let arg = lat.sin() * dec.sin() + lat.cos() * dec.cos();
    arg.clamp(-1.0, 1.0).asin()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolarEstimator {
    noise: SeededNoise,
}

impl SolarEstimator {
    pub fn new(noise: SeededNoise) -> Self {
        Self { noise }
    }

    pub fn noise(&self) -> SeededNoise {
        self.noise
    }

    pub fn altitude_factor(&self, lat: f64, at: DateTime<Utc>) -> f64 {
        let dec = declination_deg(day_of_year(at));
        noon_altitude(lat, dec).sin().clamp(0.0, 1.0)
    }

    pub fn haze_factor(&self, lat: f64, lon: f64) -> f64 {
        HAZE_BASE + self.noise.sample(lat, lon) * HAZE_SPAN
    }

    pub fn relief_factor(&self, lat: f64, lon: f64) -> f64 {
        let texture = self
            .noise
            .sample(lat * RELIEF_COORD_SCALE, lon * RELIEF_COORD_SCALE);
        (RELIEF_BASE + (texture - 0.5) * RELIEF_SPAN).clamp(0.0, RELIEF_MAX)
    }

    pub fn distance_factor(&self, lat: f64, lon: f64, region: &Region) -> f64 {
        let distance = region.normalized_distance(lat, lon);
        (1.0 - distance * DISTANCE_PENALTY).clamp(DISTANCE_FLOOR, 1.0)
    }

    /// Potential in `[0, 1]` for the point `(lat, lon)` viewed inside `region`.
    pub fn potential(&self, lat: f64, lon: f64, at: DateTime<Utc>, region: &Region) -> f64 {
        let value = self.altitude_factor(lat, at)
            * self.haze_factor(lat, lon)
            * self.relief_factor(lat, lon)
            * self.distance_factor(lat, lon, region);
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }
}

/// Potential with the default noise seed.
pub fn potential(lat: f64, lon: f64, at: DateTime<Utc>, region: &Region) -> f64 {
    SolarEstimator::default().potential(lat, lon, at, region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn day_of_year_uses_utc_date() {
        assert_eq!(day_of_year(utc(2024, 1, 1, 0)), 1);
        assert_eq!(day_of_year(utc(2024, 1, 1, 23)), 1);
        assert_eq!(day_of_year(utc(2024, 2, 1, 12)), 32);
        assert_eq!(day_of_year(utc(2024, 12, 31, 12)), 366);
        assert_eq!(day_of_year(utc(2023, 12, 31, 12)), 365);
    }

    #[test]
    fn declination_peaks_near_solstices() {
        let june = declination_deg(172);
        let december = declination_deg(355);
        assert!(june > 23.0 && june <= AXIAL_TILT_DEG, "june {june}");
        assert!(december < -23.0, "december {december}");
        assert!(declination_deg(81).abs() < 1.0);
    }

    #[test]
    fn noon_altitude_is_overhead_when_latitude_matches_declination() {
        let altitude = noon_altitude(20.0, 20.0);
        assert!((altitude - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
        let polar = noon_altitude(-90.0, 23.0);
        assert!(polar < 0.0);
    }

    #[test]
    fn factors_respect_their_ranges() {
        let estimator = SolarEstimator::default();
        let region = Region::new(10.0, 10.0, 1.0, 1.0);
        for lat in (-90..=90).step_by(10) {
            for lon in (-180..=180).step_by(30) {
                let (lat, lon) = (lat as f64, lon as f64);
                let haze = estimator.haze_factor(lat, lon);
                assert!((HAZE_BASE..=1.0).contains(&haze));
                let relief = estimator.relief_factor(lat, lon);
                assert!((0.725..=0.975).contains(&relief), "relief {relief}");
                let distance = estimator.distance_factor(lat, lon, &region);
                assert!((DISTANCE_FLOOR..=1.0).contains(&distance));
            }
        }
    }

    #[test]
    fn distance_factor_is_one_at_center_and_floored_far_away() {
        let estimator = SolarEstimator::default();
        let region = Region::new(28.0, 77.0, 0.4, 0.4);
        assert_eq!(estimator.distance_factor(28.0, 77.0, &region), 1.0);
        assert_eq!(estimator.distance_factor(40.0, 90.0, &region), DISTANCE_FLOOR);
    }

    #[test]
    fn polar_night_has_no_potential() {
        let region = Region::new(-85.0, 0.0, 1.0, 1.0);
        assert_eq!(potential(-85.0, 0.0, utc(2024, 6, 21, 12), &region), 0.0);
    }
}
