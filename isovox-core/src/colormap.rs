//! Scalar-to-color transfer functions

use crate::point::Rgb;
use serde::{Deserialize, Serialize};

/// Viridis control points, evenly spaced over [0, 1]
const VIRIDIS: [Rgb; 11] = [
    Rgb::new(0.267, 0.004, 0.329),
    Rgb::new(0.282, 0.140, 0.457),
    Rgb::new(0.253, 0.265, 0.529),
    Rgb::new(0.206, 0.371, 0.553),
    Rgb::new(0.163, 0.471, 0.558),
    Rgb::new(0.127, 0.566, 0.550),
    Rgb::new(0.134, 0.658, 0.517),
    Rgb::new(0.266, 0.749, 0.440),
    Rgb::new(0.477, 0.821, 0.318),
    Rgb::new(0.741, 0.873, 0.150),
    Rgb::new(0.993, 0.906, 0.144),
];

const COOL: Rgb = Rgb::new(0.0, 0.0, 1.0);
const WARM: Rgb = Rgb::new(1.0, 0.0, 0.0);

/// Available transfer functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMap {
    /// Sequential perceptually-uniform palette, interpolated between entries
    #[default]
    Viridis,
    /// Diverging blue -> white -> red, white at the midpoint
    CoolWarm,
}

impl ColorMap {
    /// Sample the map at `t`, clamped into [0, 1]
    pub fn sample(&self, t: f32) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        match self {
            ColorMap::Viridis => sample_palette(&VIRIDIS, t),
            ColorMap::CoolWarm => {
                if t < 0.5 {
                    COOL.lerp(Rgb::WHITE, t * 2.0)
                } else {
                    Rgb::WHITE.lerp(WARM, (t - 0.5) * 2.0)
                }
            }
        }
    }

    /// Map `value` from `[min_value, max_value]` onto the palette
    ///
    /// A zero-width range yields the midpoint color.
    pub fn map(&self, value: f32, min_value: f32, max_value: f32) -> Rgb {
        let width = max_value - min_value;
        if width == 0.0 || !width.is_finite() {
            return self.sample(0.5);
        }
        self.sample((value - min_value) / width)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorMap::Viridis => "viridis",
            ColorMap::CoolWarm => "coolwarm",
        }
    }

    /// Look a map up by its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "viridis" => Some(ColorMap::Viridis),
            "coolwarm" => Some(ColorMap::CoolWarm),
            _ => None,
        }
    }
}

fn sample_palette(palette: &[Rgb], t: f32) -> Rgb {
    let n = palette.len() - 1;
    let scaled = t * n as f32;
    let idx = (scaled.floor() as usize).min(n - 1);
    let frac = scaled - idx as f32;

    palette[idx].lerp(palette[idx + 1], frac)
}

/// Map a scalar onto the default palette
pub fn colorize(value: f32, min_value: f32, max_value: f32) -> Rgb {
    ColorMap::default().map(value, min_value, max_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_extremes_hit_palette_ends() {
        assert_eq!(colorize(-3.0, -3.0, 9.0), VIRIDIS[0]);
        let top = colorize(9.0, -3.0, 9.0);
        assert_relative_eq!(top.r, VIRIDIS[10].r, epsilon = 1e-6);
        assert_relative_eq!(top.g, VIRIDIS[10].g, epsilon = 1e-6);
        assert_relative_eq!(top.b, VIRIDIS[10].b, epsilon = 1e-6);
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        assert_eq!(colorize(-100.0, 0.0, 1.0), colorize(0.0, 0.0, 1.0));
        assert_eq!(colorize(100.0, 0.0, 1.0), colorize(1.0, 0.0, 1.0));
        assert_eq!(colorize(f32::NAN, 0.0, 1.0), colorize(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_degenerate_range_returns_midpoint() {
        let mid = ColorMap::Viridis.sample(0.5);
        assert_eq!(colorize(4.0, 4.0, 4.0), mid);
        assert_eq!(colorize(-7.0, 4.0, 4.0), mid);
        assert_eq!(ColorMap::CoolWarm.map(1.0, 2.0, 2.0), Rgb::WHITE);
    }

    #[test]
    fn test_viridis_monotonic_and_continuous() {
        let steps = 1000;
        let mut previous = colorize(0.0, 0.0, 1.0);
        for s in 1..=steps {
            let color = colorize(s as f32 / steps as f32, 0.0, 1.0);
            assert!(color.g >= previous.g - 1e-6, "green must not decrease");
            assert!((color.r - previous.r).abs() < 0.01);
            assert!((color.g - previous.g).abs() < 0.01);
            assert!((color.b - previous.b).abs() < 0.01);
            previous = color;
        }
    }

    #[test]
    fn test_coolwarm_piecewise() {
        let map = ColorMap::CoolWarm;
        assert_eq!(map.sample(0.0), COOL);
        assert_eq!(map.sample(0.5), Rgb::WHITE);
        assert_eq!(map.sample(1.0), WARM);

        let quarter = map.sample(0.25);
        assert_relative_eq!(quarter.r, 0.5);
        assert_relative_eq!(quarter.b, 1.0);
    }

    #[test]
    fn test_names_round_trip() {
        for map in [ColorMap::Viridis, ColorMap::CoolWarm] {
            assert_eq!(ColorMap::from_name(map.name()), Some(map));
        }
        assert_eq!(ColorMap::from_name("jet"), None);
    }
}
