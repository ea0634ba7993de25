//! Static rendering of a map description.

use image::imageops;
use image::RgbaImage;
use projection::Viewport;
use tracing::debug;

use crate::basemap::draw_basemap;
use crate::document::MapDescription;
use crate::error::Result;
use crate::heat::render_heat_layer;
use crate::png;

/// Zoom floor when fitting bounds; tile layers start at zoom 0.
const MIN_ZOOM: u8 = 0;

/// Viewport a browser of `width x height` lands on after fitting the
/// description's bounds.
pub fn fitted_viewport(description: &MapDescription, width: u32, height: u32) -> Result<Viewport> {
    Ok(Viewport::fit_bounds(
        description.south_west(),
        description.north_east(),
        width,
        height,
        description.fit_padding,
        MIN_ZOOM,
        description.tiles.max_zoom,
    )?)
}

/// Basemap with the density layer composited on top.
pub fn render_static(description: &MapDescription, width: u32, height: u32) -> Result<RgbaImage> {
    let viewport = fitted_viewport(description, width, height)?;
    debug!(
        title = %description.title,
        zoom = viewport.zoom,
        center_lat = viewport.center.lat,
        center_lon = viewport.center.lon,
        "Fitted viewport"
    );

    let mut image = draw_basemap(&viewport);
    let layer = render_heat_layer(description.heat_points(), &viewport, &description.heat.to_config())?;
    imageops::overlay(&mut image, &layer, 0, 0);

    Ok(image)
}

/// [`render_static`] encoded as PNG.
pub fn render_png(description: &MapDescription, width: u32, height: u32) -> Result<Vec<u8>> {
    let image = render_static(description, width, height)?;
    Ok(png::encode_auto(
        image.as_raw(),
        image.width() as usize,
        image.height() as usize,
    )?)
}
