//! Heuristic solar-suitability score for a location.
//!
//! Lookup order: city names, then geographic boxes, then a flat default. Box
//! and default scores are scaled by a latitude multiplier; city scores are
//! returned as listed.

use serde::Serialize;

pub const MIN_SCORE: f64 = 5.0;
pub const MAX_SCORE: f64 = 10.0;
pub const DEFAULT_BASE_SCORE: f64 = 7.0;

/// Lowercase city keys matched as substrings of the location name. Order is
/// significant: a name containing two keys takes the earlier one.
pub const CITY_SCORES: &[(&str, f64)] = &[
    ("jaisalmer", 9.6),
    ("jodhpur", 9.5),
    ("bikaner", 9.4),
    ("barmer", 9.4),
    ("bhuj", 9.1),
    ("jaipur", 9.0),
    ("udaipur", 8.9),
    ("ahmedabad", 8.8),
    ("rajkot", 8.7),
    ("hyderabad", 8.4),
    ("nagpur", 8.3),
    ("bhopal", 8.3),
    ("delhi", 8.2),
    ("chennai", 8.1),
    ("pune", 8.0),
    ("bengaluru", 7.9),
    ("bangalore", 7.9),
    ("lucknow", 7.8),
    ("mumbai", 7.4),
    ("kolkata", 7.2),
    ("kochi", 7.0),
    ("guwahati", 6.6),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub name: &'static str,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub base_score: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Evaluated in order; the first box containing the point wins.
pub const REGION_RULES: &[BoundingBox] = &[
    BoundingBox {
        name: "thar-kutch",
        min_lat: 23.0,
        max_lat: 27.0,
        min_lon: 69.0,
        max_lon: 78.0,
        base_score: 9.2,
    },
    BoundingBox {
        name: "ladakh",
        min_lat: 32.0,
        max_lat: 36.0,
        min_lon: 75.0,
        max_lon: 80.0,
        base_score: 8.8,
    },
    BoundingBox {
        name: "deccan",
        min_lat: 15.0,
        max_lat: 23.0,
        min_lon: 73.0,
        max_lon: 81.0,
        base_score: 8.4,
    },
    BoundingBox {
        name: "southern-peninsula",
        min_lat: 8.0,
        max_lat: 15.0,
        min_lon: 74.0,
        max_lon: 80.5,
        base_score: 7.8,
    },
    BoundingBox {
        name: "gangetic-plain",
        min_lat: 24.0,
        max_lat: 30.0,
        min_lon: 78.0,
        max_lon: 88.0,
        base_score: 7.6,
    },
    BoundingBox {
        name: "northeast",
        min_lat: 22.0,
        max_lat: 29.5,
        min_lon: 88.0,
        max_lon: 97.5,
        base_score: 6.4,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    City,
    Region,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: f64,
    pub source: ScoreSource,
}

pub fn city_score(location_name: &str) -> Option<f64> {
    let name = location_name.to_lowercase();
    if name.trim().is_empty() {
        return None;
    }
    CITY_SCORES
        .iter()
        .find(|(city, _)| name.contains(city))
        .map(|(_, score)| *score)
}

pub fn region_base_score(lat: f64, lon: f64) -> f64 {
    REGION_RULES
        .iter()
        .find(|rule| rule.contains(lat, lon))
        .map(|rule| rule.base_score)
        .unwrap_or(DEFAULT_BASE_SCORE)
}

pub fn latitude_multiplier(lat: f64) -> f64 {
    if lat < 25.0 {
        1.1
    } else if lat < 30.0 {
        1.0
    } else {
        0.95
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn score_location(lat: f64, lon: f64, location_name: Option<&str>) -> ScoreResult {
    if let Some(score) = location_name.and_then(city_score) {
        return ScoreResult {
            score,
            source: ScoreSource::City,
        };
    }

    let raw = region_base_score(lat, lon) * latitude_multiplier(lat);
    ScoreResult {
        score: round_one_decimal(raw.clamp(MIN_SCORE, MAX_SCORE)),
        source: ScoreSource::Region,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_match_is_case_insensitive_substring() {
        assert_eq!(city_score("Near JODHPUR airport"), Some(9.5));
        assert_eq!(city_score("New Delhi, India"), Some(8.2));
        assert_eq!(city_score("Springfield"), None);
        assert_eq!(city_score("   "), None);
    }

    #[test]
    fn earlier_table_entry_wins() {
        // both "jaipur" and "jodhpur" appear; jodhpur is listed first
        assert_eq!(city_score("Jaipur to Jodhpur highway"), Some(9.5));
    }

    #[test]
    fn latitude_bands() {
        assert_eq!(latitude_multiplier(24.999), 1.1);
        assert_eq!(latitude_multiplier(25.0), 1.0);
        assert_eq!(latitude_multiplier(29.9), 1.0);
        assert_eq!(latitude_multiplier(30.0), 0.95);
        assert_eq!(latitude_multiplier(-40.0), 1.1);
    }

    #[test]
    fn boxes_are_inclusive() {
        assert_eq!(region_base_score(23.0, 69.0), 9.2);
        assert_eq!(region_base_score(27.0, 78.0), 9.2);
        assert_eq!(region_base_score(28.0, 80.0), 7.6);
        assert_eq!(region_base_score(-33.9, 151.2), DEFAULT_BASE_SCORE);
    }

    #[test]
    fn scores_stay_within_bounds() {
        for lat in (-90..=90).step_by(5) {
            for lon in (-180..=180).step_by(5) {
                let result = score_location(lat as f64, lon as f64, None);
                assert!((MIN_SCORE..=MAX_SCORE).contains(&result.score));
                assert_eq!(result.source, ScoreSource::Region);
            }
        }
    }

    #[test]
    fn serializes_lowercase_source() {
        let result = score_location(26.3, 73.0, Some("Jodhpur, Rajasthan"));
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["source"], "city");
        assert_eq!(json["score"], 9.5);
    }
}
