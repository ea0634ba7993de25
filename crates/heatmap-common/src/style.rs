//! Render style configuration: color gradient, density layer and basemap.
//!
//! Defaults reproduce the reference rendering exactly; every value can be
//! overridden from the service's YAML config.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CartoDB Positron raster tiles.
const POSITRON_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
const POSITRON_ATTRIBUTION: &str = "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>";

/// Number of entries in a colorization palette (one per alpha level).
pub const PALETTE_SIZE: usize = 256;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StyleError {
    #[error("Invalid color '{0}': expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    #[error("Invalid gradient: {0}")]
    InvalidGradient(String),

    #[error("Invalid value for '{param}': {message}")]
    InvalidParameter { param: &'static str, message: String },
}

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(s: &str) -> Result<Self, StyleError> {
        let hex = s.trim().trim_start_matches('#');
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| StyleError::InvalidColor(s.to_string()))
        };

        match hex.len() {
            6 => Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(StyleError::InvalidColor(s.to_string())),
        }
    }

    /// Lowercase `#rrggbb`, alpha appended only when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Linear interpolation between two colors, rounded per channel.
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8;

        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// A gradient stop as written in config: position in [0, 1] and a hex color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: String,
}

impl GradientStop {
    pub fn new(position: f64, color: impl Into<String>) -> Self {
        Self {
            position,
            color: color.into(),
        }
    }
}

/// Air-quality style ramp: green, yellow, orange, red, purple, maroon.
pub fn default_gradient() -> Vec<GradientStop> {
    vec![
        GradientStop::new(0.0, "#00e400"),
        GradientStop::new(0.2, "#ffff00"),
        GradientStop::new(0.4, "#ff7e00"),
        GradientStop::new(0.6, "#ff0000"),
        GradientStop::new(0.8, "#8f3f97"),
        GradientStop::new(1.0, "#7e0023"),
    ]
}

/// Validated, parsed gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<(f64, Color)>,
}

impl Gradient {
    pub fn from_stops(stops: &[GradientStop]) -> Result<Self, StyleError> {
        if stops.len() < 2 {
            return Err(StyleError::InvalidGradient(
                "at least 2 color stops are required".to_string(),
            ));
        }

        let mut parsed = Vec::with_capacity(stops.len());
        for stop in stops {
            if !(0.0..=1.0).contains(&stop.position) {
                return Err(StyleError::InvalidGradient(format!(
                    "stop position {} is outside [0, 1]",
                    stop.position
                )));
            }
            if let Some((previous, _)) = parsed.last() {
                if stop.position <= *previous {
                    return Err(StyleError::InvalidGradient(
                        "stop positions must be strictly ascending".to_string(),
                    ));
                }
            }
            parsed.push((stop.position, Color::from_hex(&stop.color)?));
        }

        Ok(Self { stops: parsed })
    }

    pub fn stops(&self) -> &[(f64, Color)] {
        &self.stops
    }

    /// Color at position `t`, clamped to the first/last stop outside their range.
    pub fn color_at(&self, t: f64) -> Color {
        let (first_pos, first_color) = self.stops[0];
        let (last_pos, last_color) = self.stops[self.stops.len() - 1];

        if t <= first_pos {
            return first_color;
        }
        if t >= last_pos {
            return last_color;
        }

        for pair in self.stops.windows(2) {
            let (low_pos, low_color) = pair[0];
            let (high_pos, high_color) = pair[1];
            if t <= high_pos {
                return low_color.lerp(&high_color, (t - low_pos) / (high_pos - low_pos));
            }
        }

        last_color
    }

    /// 256-entry lookup table, sampled at pixel centers of a 256px strip.
    ///
    /// Entry `i` colors a pixel whose accumulated alpha is `i`.
    pub fn palette(&self) -> Vec<Color> {
        (0..PALETTE_SIZE)
            .map(|i| self.color_at((i as f64 + 0.5) / PALETTE_SIZE as f64))
            .collect()
    }
}

/// Weighted density overlay parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatLayerConfig {
    pub gradient: Vec<GradientStop>,
    /// Point radius in pixels
    pub radius: f64,
    /// Blur amount in pixels
    pub blur: f64,
    pub min_opacity: f64,
    pub max_opacity: f64,
    /// Zoom at which points reach full weight
    pub max_zoom: u8,
}

impl Default for HeatLayerConfig {
    fn default() -> Self {
        Self {
            gradient: default_gradient(),
            radius: 36.0,
            blur: 55.0,
            min_opacity: 0.01,
            max_opacity: 0.05,
            max_zoom: 18,
        }
    }
}

impl HeatLayerConfig {
    pub fn validate(&self) -> Result<(), StyleError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(StyleError::InvalidParameter {
                param: "radius",
                message: format!("must be a positive number, got {}", self.radius),
            });
        }
        if !self.blur.is_finite() || self.blur < 0.0 {
            return Err(StyleError::InvalidParameter {
                param: "blur",
                message: format!("must be zero or positive, got {}", self.blur),
            });
        }
        for (param, value) in [("min_opacity", self.min_opacity), ("max_opacity", self.max_opacity)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(StyleError::InvalidParameter {
                    param,
                    message: format!("must be within [0, 1], got {}", value),
                });
            }
        }
        if self.min_opacity > self.max_opacity {
            return Err(StyleError::InvalidParameter {
                param: "min_opacity",
                message: format!(
                    "must not exceed max_opacity ({} > {})",
                    self.min_opacity, self.max_opacity
                ),
            });
        }

        Gradient::from_stops(&self.gradient).map(|_| ())
    }

    pub fn parsed_gradient(&self) -> Result<Gradient, StyleError> {
        Gradient::from_stops(&self.gradient)
    }

    /// Combined radius of the blurred point stamp.
    pub fn stamp_radius(&self) -> f64 {
        self.radius + self.blur
    }
}

/// Raster tile basemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSource {
    pub url: String,
    pub attribution: String,
    pub subdomains: String,
    pub max_zoom: u8,
}

impl Default for TileSource {
    fn default() -> Self {
        Self {
            url: POSITRON_URL.to_string(),
            attribution: POSITRON_ATTRIBUTION.to_string(),
            subdomains: "abcd".to_string(),
            max_zoom: 18,
        }
    }
}

/// Base map construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Zoom used before bounds fitting takes over
    pub zoom_start: u8,
    /// Pixel padding kept around the fitted bounds, `[x, y]`
    pub fit_padding: [u32; 2],
    pub zoom_control: bool,
    pub scroll_wheel_zoom: bool,
    pub tiles: TileSource,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom_start: 5,
            fit_padding: [50, 50],
            zoom_control: false,
            scroll_wheel_zoom: false,
            tiles: TileSource::default(),
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.zoom_start > self.tiles.max_zoom {
            return Err(StyleError::InvalidParameter {
                param: "zoom_start",
                message: format!(
                    "must not exceed the tile max zoom ({} > {})",
                    self.zoom_start, self.tiles.max_zoom
                ),
            });
        }
        if self.tiles.url.is_empty() {
            return Err(StyleError::InvalidParameter {
                param: "tiles.url",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Everything the map renderer needs besides the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub map: MapConfig,
    pub heat: HeatLayerConfig,
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), StyleError> {
        self.map.validate()?;
        self.heat.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::from_hex("#00e400").unwrap(), Color::rgb(0, 228, 0));
        assert_eq!(Color::from_hex("7e0023").unwrap(), Color::rgb(126, 0, 35));
        assert_eq!(
            Color::from_hex("#ff000080").unwrap(),
            Color::new(255, 0, 0, 128)
        );
    }

    #[test]
    fn test_parse_hex_invalid() {
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn test_hex_round_trip_lowercase() {
        let color = Color::from_hex("#8F3F97").unwrap();
        assert_eq!(color.to_hex(), "#8f3f97");
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = Color::rgb(0, 0, 0).lerp(&Color::rgb(255, 100, 10), 0.5);
        assert_eq!(mid, Color::rgb(128, 50, 5));
    }

    #[test]
    fn test_default_gradient_stops() {
        let gradient = Gradient::from_stops(&default_gradient()).unwrap();
        assert_eq!(gradient.stops().len(), 6);
        assert_eq!(gradient.color_at(0.0), Color::rgb(0, 228, 0));
        assert_eq!(gradient.color_at(0.6), Color::rgb(255, 0, 0));
        assert_eq!(gradient.color_at(1.0), Color::rgb(126, 0, 35));
    }

    #[test]
    fn test_color_at_between_stops() {
        let gradient = Gradient::from_stops(&default_gradient()).unwrap();
        // Halfway between #ff7e00 and #ff0000
        assert_eq!(gradient.color_at(0.5), Color::rgb(255, 63, 0));
    }

    #[test]
    fn test_color_at_clamps() {
        let gradient = Gradient::from_stops(&default_gradient()).unwrap();
        assert_eq!(gradient.color_at(-1.0), gradient.color_at(0.0));
        assert_eq!(gradient.color_at(2.0), gradient.color_at(1.0));
    }

    #[test]
    fn test_palette_size_and_ends() {
        let palette = Gradient::from_stops(&default_gradient()).unwrap().palette();
        assert_eq!(palette.len(), PALETTE_SIZE);
        // First sample sits just past the green stop, last just before maroon
        assert_eq!(palette[0].g, 228);
        assert_eq!(palette[255].r, 126);
    }

    #[test]
    fn test_gradient_rejects_unsorted() {
        let stops = vec![GradientStop::new(0.5, "#000000"), GradientStop::new(0.2, "#ffffff")];
        assert!(matches!(
            Gradient::from_stops(&stops),
            Err(StyleError::InvalidGradient(_))
        ));
    }

    #[test]
    fn test_gradient_rejects_out_of_range() {
        let stops = vec![GradientStop::new(0.0, "#000000"), GradientStop::new(1.5, "#ffffff")];
        assert!(Gradient::from_stops(&stops).is_err());
    }

    #[test]
    fn test_heat_defaults_are_valid() {
        let heat = HeatLayerConfig::default();
        assert_eq!(heat.radius, 36.0);
        assert_eq!(heat.blur, 55.0);
        assert_eq!(heat.min_opacity, 0.01);
        assert_eq!(heat.max_opacity, 0.05);
        assert_eq!(heat.stamp_radius(), 91.0);
        assert!(heat.validate().is_ok());
    }

    #[test]
    fn test_heat_rejects_inverted_opacity() {
        let heat = HeatLayerConfig {
            min_opacity: 0.5,
            max_opacity: 0.1,
            ..Default::default()
        };
        assert!(matches!(
            heat.validate(),
            Err(StyleError::InvalidParameter {
                param: "min_opacity",
                ..
            })
        ));
    }

    #[test]
    fn test_map_defaults() {
        let map = MapConfig::default();
        assert_eq!(map.zoom_start, 5);
        assert_eq!(map.fit_padding, [50, 50]);
        assert!(!map.zoom_control);
        assert!(!map.scroll_wheel_zoom);
        assert!(map.tiles.url.contains("light_all"));
    }

    #[test]
    fn test_render_config_partial_json() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"heat": {"radius": 20}}"#).unwrap();
        assert_eq!(config.heat.radius, 20.0);
        assert_eq!(config.heat.blur, 55.0);
        assert_eq!(config.map.zoom_start, 5);
    }
}
