//! Density layer compositor.
//!
//! Reproduces the Leaflet.heat drawing model so a static render matches what
//! the browser shows:
//!
//! 1. project points into the viewport and drop those further than the stamp
//!    radius `r` outside it
//! 2. cluster into a grid of `r / 2` cells; each cell keeps the
//!    weight-averaged position and the summed weight, capped at 1
//! 3. weights are attenuated by `2^-(max_zoom - zoom)` (at most 12 levels)
//! 4. every cell draws a blurred disc with alpha `clamp(weight, min_opacity, 1)`,
//!    composited source-over on an alpha-only canvas
//! 5. the accumulated alpha indexes a 256-entry gradient palette; the pixel
//!    keeps its alpha

use std::collections::BTreeMap;

use heatmap_common::{Color, Gradient, HeatLayerConfig};
use image::{GrayImage, Luma, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;
use imageproc::filter::gaussian_blur_f32;
use projection::Viewport;
use rayon::prelude::*;
use tracing::debug;

use crate::document::HeatPoint;
use crate::error::Result;

/// Highest per-cell weight; also the divisor for stamp opacity.
const MAX_WEIGHT: f64 = 1.0;

/// Zoom attenuation never exceeds this many halvings.
const MAX_ATTENUATION_LEVELS: f64 = 12.0;

/// Grid cells are offset so negative container coordinates stay indexable.
const CELL_INDEX_OFFSET: i64 = 2;

/// Blurred disc drawn for every cluster.
#[derive(Debug, Clone)]
pub struct Stamp {
    /// Offset from the stamp's top-left to its center
    radius: u32,
    /// Alpha coverage in [0, 1], row-major, `size x size`
    alpha: Vec<f32>,
    size: u32,
}

impl Stamp {
    /// Disc of `radius` blurred with a Gaussian of sigma `blur / 2`, on a
    /// square canvas of edge `2 * (radius + blur)`.
    pub fn new(radius: f64, blur: f64) -> Self {
        let outer = (radius + blur).round().max(1.0) as u32;
        let size = outer * 2;

        let mut disc = GrayImage::new(size, size);
        draw_filled_circle_mut(
            &mut disc,
            (outer as i32, outer as i32),
            radius.round() as i32,
            Luma([255u8]),
        );
        let blurred = if blur > 0.0 {
            gaussian_blur_f32(&disc, (blur / 2.0) as f32)
        } else {
            disc
        };

        let alpha = blurred.pixels().map(|p| p.0[0] as f32 / 255.0).collect();

        Self {
            radius: outer,
            alpha,
            size,
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Coverage at stamp pixel `(x, y)`.
    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        self.alpha[(y * self.size + x) as usize]
    }
}

/// A clustered, weighted draw position in container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

/// Weight multiplier applied at `zoom` for a layer reaching full weight at
/// `max_zoom`.
pub fn zoom_attenuation(zoom: f64, max_zoom: u8) -> f64 {
    let levels = (max_zoom as f64 - zoom).clamp(0.0, MAX_ATTENUATION_LEVELS);
    1.0 / 2f64.powf(levels)
}

/// Cluster points into `r / 2` grid cells in viewport space.
///
/// Clusters come back in row-major cell order with rounded positions and
/// weights capped at [`MAX_WEIGHT`].
pub fn cluster_points(
    points: impl IntoIterator<Item = HeatPoint>,
    viewport: &Viewport,
    stamp_radius: f64,
    max_zoom: u8,
) -> Vec<Cluster> {
    let r = stamp_radius;
    let cell_size = r / 2.0;
    let attenuation = zoom_attenuation(viewport.zoom, max_zoom);
    let (min_x, min_y) = (-r, -r);
    let (max_x, max_y) = (viewport.width as f64 + r, viewport.height as f64 + r);

    let mut grid: BTreeMap<(i64, i64), Cluster> = BTreeMap::new();
    for point in points {
        let p = viewport.to_container(point.location());
        if p.x < min_x || p.x > max_x || p.y < min_y || p.y > max_y {
            continue;
        }

        let col = (p.x / cell_size).floor() as i64 + CELL_INDEX_OFFSET;
        let row = (p.y / cell_size).floor() as i64 + CELL_INDEX_OFFSET;
        let k = point.intensity * attenuation;

        grid.entry((row, col))
            .and_modify(|cell| {
                // Zero total weight yields NaN, which is never drawn
                cell.x = (cell.x * cell.weight + p.x * k) / (cell.weight + k);
                cell.y = (cell.y * cell.weight + p.y * k) / (cell.weight + k);
                cell.weight += k;
            })
            .or_insert(Cluster {
                x: p.x,
                y: p.y,
                weight: k,
            });
    }

    grid.into_values()
        .map(|cell| Cluster {
            x: cell.x.round(),
            y: cell.y.round(),
            weight: cell.weight.min(MAX_WEIGHT),
        })
        .collect()
}

/// Alpha-only canvas the stamps accumulate on.
#[derive(Debug, Clone)]
pub struct HeatCanvas {
    width: u32,
    height: u32,
    alpha: Vec<f32>,
}

impl HeatCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0.0; (width as usize) * (height as usize)],
        }
    }

    /// Draw `stamp` centered on `(cx, cy)` with the given global alpha.
    pub fn draw(&mut self, stamp: &Stamp, cx: f64, cy: f64, opacity: f32) {
        if !cx.is_finite() || !cy.is_finite() || opacity <= 0.0 {
            return;
        }

        let left = cx as i64 - stamp.radius() as i64;
        let top = cy as i64 - stamp.radius() as i64;
        let size = stamp.size() as i64;

        let x0 = left.max(0);
        let y0 = top.max(0);
        let x1 = (left + size).min(self.width as i64);
        let y1 = (top + size).min(self.height as i64);

        for y in y0..y1 {
            let row = (y as usize) * self.width as usize;
            let sy = (y - top) as u32;
            for x in x0..x1 {
                let src = stamp.coverage((x - left) as u32, sy) * opacity;
                if src <= 0.0 {
                    continue;
                }
                let dst = &mut self.alpha[row + x as usize];
                *dst = src + *dst * (1.0 - src);
            }
        }
    }

    /// Accumulated alpha quantized to 8 bits.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        quantize(self.alpha[(y * self.width + x) as usize])
    }

    /// Map accumulated alpha through the palette.
    pub fn colorize(&self, palette: &[Color]) -> RgbaImage {
        let width = self.width as usize;
        if width == 0 || self.height == 0 {
            return RgbaImage::new(self.width, self.height);
        }
        let mut pixels = vec![0u8; width * self.height as usize * 4];

        pixels
            .par_chunks_mut(width * 4)
            .zip(self.alpha.par_chunks(width))
            .for_each(|(out_row, alpha_row)| {
                for (out, &a) in out_row.chunks_exact_mut(4).zip(alpha_row) {
                    let j = quantize(a);
                    if j == 0 {
                        continue;
                    }
                    let color = palette[j as usize];
                    out.copy_from_slice(&[color.r, color.g, color.b, j]);
                }
            });

        RgbaImage::from_raw(self.width, self.height, pixels)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}

fn quantize(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Draw the density layer for `points` over a transparent viewport-sized image.
pub fn render_heat_layer(
    points: impl IntoIterator<Item = HeatPoint>,
    viewport: &Viewport,
    config: &HeatLayerConfig,
) -> Result<RgbaImage> {
    let gradient: Gradient = config.parsed_gradient()?;
    let palette = gradient.palette();
    let stamp = Stamp::new(config.radius, config.blur);

    let clusters = cluster_points(points, viewport, config.stamp_radius(), config.max_zoom);
    debug!(
        clusters = clusters.len(),
        zoom = viewport.zoom,
        stamp = stamp.size(),
        "Drawing heat layer"
    );

    let mut canvas = HeatCanvas::new(viewport.width, viewport.height);
    for cluster in &clusters {
        let opacity = (cluster.weight / MAX_WEIGHT).max(config.min_opacity).min(1.0);
        canvas.draw(&stamp, cluster.x, cluster.y, opacity as f32);
    }

    Ok(canvas.colorize(&palette))
}
