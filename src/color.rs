//! Potential-to-color mapping for heat tiles.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

const ALPHA_BASE: f64 = 0.18;
const ALPHA_SPAN: f64 = 0.55;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub value: f64,
    pub rgb: [u8; 3],
}

impl ColorStop {
    pub const fn new(value: f64, rgb: [u8; 3]) -> Self {
        Self { value, rgb }
    }
}

/// Deep blue through yellow to red.
pub const DEFAULT_STOPS: [ColorStop; 5] = [
    ColorStop::new(0.0, [37, 52, 148]),
    ColorStop::new(0.25, [44, 127, 184]),
    ColorStop::new(0.5, [254, 217, 118]),
    ColorStop::new(0.75, [253, 141, 60]),
    ColorStop::new(1.0, [215, 25, 28]),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ColorRampError {
    #[error("color ramp needs at least two stops")]
    TooFewStops,
    #[error("color stops must be in ascending order (stop {index})")]
    NotAscending { index: usize },
    #[error("color ramp must span 0.0 to 1.0")]
    IncompleteRange,
}

/// Ordered stop table with piecewise-linear interpolation between stops.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self {
            stops: DEFAULT_STOPS.to_vec(),
        }
    }
}

impl ColorRamp {
    pub fn new(stops: Vec<ColorStop>) -> Result<Self, ColorRampError> {
        if stops.len() < 2 {
            return Err(ColorRampError::TooFewStops);
        }
        for (index, pair) in stops.windows(2).enumerate() {
            if pair[1].value < pair[0].value {
                return Err(ColorRampError::NotAscending { index: index + 1 });
            }
        }
        let first = stops[0].value;
        let last = stops[stops.len() - 1].value;
        if first != 0.0 || last != 1.0 {
            return Err(ColorRampError::IncompleteRange);
        }
        Ok(Self { stops })
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Maps a potential to a color. Alpha grows with the value so weak cells
    /// stay translucent; it is not interpolated between stops.
    pub fn interpolate(&self, value: f64) -> Rgba {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };

        let (lower, upper) = self
            .stops
            .windows(2)
            .find(|pair| pair[0].value <= value && value <= pair[1].value)
            .map(|pair| (pair[0], pair[1]))
            .unwrap_or_else(|| (self.stops[0], self.stops[self.stops.len() - 1]));

        let mut width = upper.value - lower.value;
        if width == 0.0 {
            width = 1.0;
        }
        let t = (value - lower.value) / width;
        let channel = |i: usize| {
            let from = lower.rgb[i] as f64;
            let to = upper.rgb[i] as f64;
            (from + (to - from) * t).round().clamp(0.0, 255.0) as u8
        };

        Rgba {
            r: channel(0),
            g: channel(1),
            b: channel(2),
            a: ALPHA_BASE + value * ALPHA_SPAN,
        }
    }
}

/// Interpolates against the default ramp.
pub fn interpolate(value: f64) -> Rgba {
    ColorRamp::default().interpolate(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_first_and_last_stop() {
        let low = interpolate(0.0);
        assert_eq!([low.r, low.g, low.b], DEFAULT_STOPS[0].rgb);
        assert!((low.a - 0.18).abs() < 1e-12);

        let high = interpolate(1.0);
        assert_eq!([high.r, high.g, high.b], DEFAULT_STOPS[4].rgb);
        assert!((high.a - 0.73).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_values_clamp() {
        assert_eq!(interpolate(-3.0), interpolate(0.0));
        assert_eq!(interpolate(7.5), interpolate(1.0));
        assert_eq!(interpolate(f64::NAN), interpolate(0.0));
    }

    #[test]
    fn midpoint_between_stops_is_linear() {
        let ramp = ColorRamp::new(vec![
            ColorStop::new(0.0, [0, 0, 0]),
            ColorStop::new(1.0, [200, 100, 50]),
        ])
        .unwrap();
        let mid = ramp.interpolate(0.5);
        assert_eq!((mid.r, mid.g, mid.b), (100, 50, 25));
        assert!((mid.a - (0.18 + 0.5 * 0.55)).abs() < 1e-12);
    }

    #[test]
    fn zero_width_segment_does_not_divide_by_zero() {
        let ramp = ColorRamp::new(vec![
            ColorStop::new(0.0, [10, 10, 10]),
            ColorStop::new(0.5, [20, 20, 20]),
            ColorStop::new(0.5, [90, 90, 90]),
            ColorStop::new(1.0, [100, 100, 100]),
        ])
        .unwrap();
        let at_step = ramp.interpolate(0.5);
        assert_eq!(at_step.r, 20);
    }

    #[test]
    fn rejects_malformed_tables() {
        assert_eq!(
            ColorRamp::new(vec![ColorStop::new(0.0, [0, 0, 0])]),
            Err(ColorRampError::TooFewStops)
        );
        assert_eq!(
            ColorRamp::new(vec![
                ColorStop::new(0.0, [0, 0, 0]),
                ColorStop::new(0.8, [0, 0, 0]),
                ColorStop::new(0.4, [0, 0, 0]),
                ColorStop::new(1.0, [0, 0, 0]),
            ]),
            Err(ColorRampError::NotAscending { index: 2 })
        );
        assert_eq!(
            ColorRamp::new(vec![
                ColorStop::new(0.1, [0, 0, 0]),
                ColorStop::new(1.0, [0, 0, 0]),
            ]),
            Err(ColorRampError::IncompleteRange)
        );
    }

    #[test]
    fn renders_css_rgba() {
        let color = Rgba {
            r: 1,
            g: 2,
            b: 3,
            a: 0.5,
        };
        assert_eq!(color.to_string(), "rgba(1, 2, 3, 0.500)");
        assert_eq!(
            serde_json::to_string(&color).unwrap(),
            "\"rgba(1, 2, 3, 0.500)\""
        );
    }
}
