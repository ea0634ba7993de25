//! Leaflet map documents.
//!
//! A document is a standalone HTML page that loads Leaflet and Leaflet.heat
//! from a CDN and draws the map described by a JSON data island:
//!
//! ```html
//! <script type="application/json" id="heatmap-description">{...}</script>
//! ```
//!
//! The page script and the native rasterizer both read that island, so the
//! browser render and the software render agree on every parameter. Output
//! is a pure function of the inputs: no generated element ids, no timestamps.

use heatmap_common::{BoundingRegion, GeoPoint, GradientStop, HeatLayerConfig, MapConfig, TileSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RenderError, RenderStage, Result};

/// DOM id of the embedded map description.
pub const DESCRIPTION_ELEMENT_ID: &str = "heatmap-description";

const LEAFLET_CSS: &str = "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.css";
const LEAFLET_JS: &str = "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js";
const LEAFLET_HEAT_JS: &str =
    "https://cdn.jsdelivr.net/gh/python-visualization/folium@main/folium/templates/leaflet_heat.min.js";

/// One weighted point of the density layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

impl HeatPoint {
    pub fn new(lat: f64, lon: f64, intensity: f64) -> Self {
        Self {
            lat,
            lon,
            intensity,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

impl From<[f64; 3]> for HeatPoint {
    fn from(triple: [f64; 3]) -> Self {
        Self::new(triple[0], triple[1], triple[2])
    }
}

/// Density layer options as Leaflet.heat receives them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatLayerOptions {
    pub radius: f64,
    pub blur: f64,
    pub min_opacity: f64,
    pub max_opacity: f64,
    pub max_zoom: u8,
    pub gradient: Vec<GradientStop>,
}

impl From<&HeatLayerConfig> for HeatLayerOptions {
    fn from(config: &HeatLayerConfig) -> Self {
        Self {
            radius: config.radius,
            blur: config.blur,
            min_opacity: config.min_opacity,
            max_opacity: config.max_opacity,
            max_zoom: config.max_zoom,
            gradient: config.gradient.clone(),
        }
    }
}

impl HeatLayerOptions {
    pub fn to_config(&self) -> HeatLayerConfig {
        HeatLayerConfig {
            gradient: self.gradient.clone(),
            radius: self.radius,
            blur: self.blur,
            min_opacity: self.min_opacity,
            max_opacity: self.max_opacity,
            max_zoom: self.max_zoom,
        }
    }
}

/// Everything needed to draw one heatmap, serialized into the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDescription {
    pub title: String,
    /// `[lat, lon]` the map opens on before bounds fitting
    pub center: [f64; 2],
    pub zoom_start: u8,
    pub zoom_control: bool,
    pub scroll_wheel_zoom: bool,
    pub tiles: TileSource,
    /// `[[south, west], [north, east]]`
    pub bounds: [[f64; 2]; 2],
    pub fit_padding: [u32; 2],
    pub heat: HeatLayerOptions,
    /// `[lat, lon, intensity]`
    pub points: Vec<[f64; 3]>,
}

impl MapDescription {
    pub fn south_west(&self) -> GeoPoint {
        GeoPoint::new(self.bounds[0][0], self.bounds[0][1])
    }

    pub fn north_east(&self) -> GeoPoint {
        GeoPoint::new(self.bounds[1][0], self.bounds[1][1])
    }

    pub fn heat_points(&self) -> impl Iterator<Item = HeatPoint> + '_ {
        self.points.iter().map(|&p| HeatPoint::from(p))
    }
}

/// Base map awaiting bounds.
#[derive(Debug, Clone)]
pub struct MapBuilder {
    title: String,
    center: GeoPoint,
    config: MapConfig,
}

/// Base map fitted to a region, awaiting its density layer.
#[derive(Debug, Clone)]
pub struct FittedMap {
    builder: MapBuilder,
    bounds: [[f64; 2]; 2],
}

impl MapBuilder {
    /// Start a map centered on `center`.
    pub fn new(title: impl Into<String>, center: GeoPoint, config: &MapConfig) -> Result<Self> {
        if !center.lat.is_finite() || !center.lon.is_finite() {
            return Err(RenderError::stage(
                RenderStage::MapConstruction,
                format!("map center [{}, {}] is not finite", center.lat, center.lon),
            ));
        }
        config
            .validate()
            .map_err(|e| RenderError::stage(RenderStage::MapConstruction, e.to_string()))?;

        Ok(Self {
            title: title.into(),
            center,
            config: config.clone(),
        })
    }

    /// Fit the view to `region` with the configured padding.
    pub fn fit_bounds(self, region: &BoundingRegion) -> Result<FittedMap> {
        let bounds = region.corners();
        let [[south, west], [north, east]] = bounds;

        if bounds.iter().flatten().any(|v| !v.is_finite()) {
            return Err(RenderError::stage(
                RenderStage::FitBounds,
                format!("bounds {:?} contain non-finite coordinates", bounds),
            ));
        }
        if south > north || west > east {
            return Err(RenderError::stage(
                RenderStage::FitBounds,
                format!("bounds {:?} are not ordered south-west to north-east", bounds),
            ));
        }

        Ok(FittedMap {
            builder: self,
            bounds,
        })
    }
}

impl FittedMap {
    /// Overlay the density layer, completing the document.
    pub fn heat_layer(self, points: &[HeatPoint], config: &HeatLayerConfig) -> Result<MapDocument> {
        config
            .validate()
            .map_err(|e| RenderError::stage(RenderStage::HeatLayer, e.to_string()))?;

        let mut triples = Vec::with_capacity(points.len());
        for point in points {
            if !point.lat.is_finite() || !point.lon.is_finite() {
                return Err(RenderError::stage(
                    RenderStage::HeatLayer,
                    format!("point [{}, {}] is not finite", point.lat, point.lon),
                ));
            }
            if !(0.0..=1.0).contains(&point.intensity) {
                return Err(RenderError::stage(
                    RenderStage::HeatLayer,
                    format!("intensity {} is outside [0, 1]", point.intensity),
                ));
            }
            triples.push([point.lat, point.lon, point.intensity]);
        }

        let MapBuilder {
            title,
            center,
            config: map,
        } = self.builder;

        Ok(MapDocument {
            description: MapDescription {
                title,
                center: center.to_array(),
                zoom_start: map.zoom_start,
                zoom_control: map.zoom_control,
                scroll_wheel_zoom: map.scroll_wheel_zoom,
                tiles: map.tiles,
                bounds: self.bounds,
                fit_padding: map.fit_padding,
                heat: HeatLayerOptions::from(config),
                points: triples,
            },
        })
    }
}

/// A finished map document.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    description: MapDescription,
}

impl MapDocument {
    pub fn description(&self) -> &MapDescription {
        &self.description
    }

    /// Render the standalone HTML page.
    pub fn to_html(&self) -> Result<String> {
        let json = serde_json::to_string(&self.description)
            .map_err(|e| RenderError::InvalidDescription(e.to_string()))?;
        let island = escape_script_json(&json);
        let title = escape_html(&self.description.title);

        debug!(
            title = %self.description.title,
            points = self.description.points.len(),
            bytes = island.len(),
            "Rendered map document"
        );

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no" />
<title>{title}</title>
<link rel="stylesheet" href="{css}" />
<script src="{leaflet}"></script>
<script src="{heat}"></script>
<style>
html, body {{ width: 100%; height: 100%; margin: 0; padding: 0; }}
#map {{ position: absolute; top: 0; bottom: 0; right: 0; left: 0; }}
</style>
</head>
<body>
<div id="map"></div>
<script type="application/json" id="{id}">{island}</script>
<script>
(function () {{
  var view = JSON.parse(document.getElementById("{id}").textContent);
  var map = L.map("map", {{
    center: view.center,
    zoom: view.zoom_start,
    zoomControl: view.zoom_control,
    scrollWheelZoom: view.scroll_wheel_zoom
  }});
  L.tileLayer(view.tiles.url, {{
    attribution: view.tiles.attribution,
    subdomains: view.tiles.subdomains,
    maxZoom: view.tiles.max_zoom
  }}).addTo(map);
  map.fitBounds(view.bounds, {{ padding: view.fit_padding }});
  var gradient = {{}};
  view.heat.gradient.forEach(function (stop) {{ gradient[stop.position] = stop.color; }});
  L.heatLayer(view.points, {{
    radius: view.heat.radius,
    blur: view.heat.blur,
    minOpacity: view.heat.min_opacity,
    maxOpacity: view.heat.max_opacity,
    maxZoom: view.heat.max_zoom,
    gradient: gradient
  }}).addTo(map);
}}());
</script>
</body>
</html>
"#,
            title = title,
            css = LEAFLET_CSS,
            leaflet = LEAFLET_JS,
            heat = LEAFLET_HEAT_JS,
            id = DESCRIPTION_ELEMENT_ID,
            island = island,
        ))
    }
}

/// Read the map description back out of a rendered document.
pub fn extract_description(html: &str) -> Result<MapDescription> {
    let open_tag = format!(
        r#"<script type="application/json" id="{}">"#,
        DESCRIPTION_ELEMENT_ID
    );
    let start = html
        .find(&open_tag)
        .map(|i| i + open_tag.len())
        .ok_or(RenderError::MissingDescription)?;
    let len = html[start..]
        .find("</script>")
        .ok_or(RenderError::MissingDescription)?;

    serde_json::from_str(&html[start..start + len])
        .map_err(|e| RenderError::InvalidDescription(e.to_string()))
}

/// Keep `</script>` and friends inside JSON strings from closing the island.
fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
