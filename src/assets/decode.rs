use anyhow::Context;

use crate::foundation::error::GeoCamResult;
use crate::render::raster::Raster;

/// Decode an encoded image (PNG tiles, JPEG stills) into a premultiplied [`Raster`].
pub fn decode_image(bytes: &[u8]) -> GeoCamResult<Raster> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Raster::from_straight_rgba8(width, height, rgba.as_raw())
}

pub fn parse_svg(bytes: &[u8]) -> GeoCamResult<usvg::Tree> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
