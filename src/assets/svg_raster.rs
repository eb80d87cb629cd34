use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::render::raster::Raster;

// Pathological sizes are rejected before allocating a pixmap.
const MAX_DIM: u32 = 4096;

/// Rasterize `tree` scaled to exactly `width x height` pixels.
pub fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> GeoCamResult<Raster> {
    if width == 0 || height == 0 || width > MAX_DIM || height > MAX_DIM {
        return Err(GeoCamError::render(format!(
            "svg raster size {width}x{height} is out of range (1..={MAX_DIM})"
        )));
    }
    let size = tree.size();
    if !size.width().is_finite() || size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(GeoCamError::render("svg has invalid width/height"));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| GeoCamError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    // tiny-skia pixmaps are premultiplied RGBA8 already.
    Raster::from_premul(width, height, pixmap.take())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/svg_raster.rs"]
mod tests;
