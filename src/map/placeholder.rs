use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::GeoCamResult;
use crate::render::canvas::Canvas;
use crate::render::raster::Raster;

pub const GRADIENT_TOP: Rgba8 = Rgba8::rgb(0xE6, 0xE9, 0xF9);
pub const GRADIENT_BOTTOM: Rgba8 = Rgba8::rgb(0xC9, 0xD0, 0xF2);
pub const GRID_STEP: u32 = 16;

const GRID_LINE: Rgba8 = Rgba8::rgba(0x42, 0x54, 0xD3, 40);
const ROAD: Rgba8 = Rgba8::rgb(0xFF, 0xFF, 0xFF);
const ROAD_OUTLINE: Rgba8 = Rgba8::rgb(0xA4, 0xAD, 0xE0);
const ROAD_WIDTH: f64 = 4.0;
const OUTLINE_WIDTH: f64 = 1.0;

/// Synthetic map art used when no tile could be fetched.
///
/// Purely decorative and deterministic: a vertical gradient, a 16 px grid and two crossing
/// diagonal roads.
pub fn draw_placeholder(width: u32, height: u32) -> GeoCamResult<Raster> {
    let mut out = Raster::new(width, height);
    fill_vertical_gradient(&mut out, GRADIENT_TOP, GRADIENT_BOTTOM);

    let mut x = GRID_STEP;
    while x < width {
        out.fill_rect_over(i64::from(x), 0, 1, height, GRID_LINE);
        x += GRID_STEP;
    }
    let mut y = GRID_STEP;
    while y < height {
        out.fill_rect_over(0, i64::from(y), width, 1, GRID_LINE);
        y += GRID_STEP;
    }

    let (w, h) = (f64::from(width), f64::from(height));
    let roads = [
        (Point::new(0.0, h * 0.15), Point::new(w, h * 0.9)),
        (Point::new(w * 0.2, h), Point::new(w * 0.85, 0.0)),
    ];
    let mut canvas = Canvas::new(width, height)?;
    for (from, to) in roads {
        canvas.stroke_line(from, to, ROAD_WIDTH + 2.0 * OUTLINE_WIDTH, ROAD_OUTLINE);
    }
    for (from, to) in roads {
        canvas.stroke_line(from, to, ROAD_WIDTH, ROAD);
    }
    out.draw_over(&canvas.finish(), 0, 0);

    Ok(out)
}

fn fill_vertical_gradient(dst: &mut Raster, top: Rgba8, bottom: Rgba8) {
    let h = dst.height();
    let w = dst.width();
    for y in 0..h {
        let t = if h > 1 {
            f64::from(y) / f64::from(h - 1)
        } else {
            0.0
        };
        let lerp = |a: u8, b: u8| -> u8 {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
        };
        let color = Rgba8::rgb(
            lerp(top.r, bottom.r),
            lerp(top.g, bottom.g),
            lerp(top.b, bottom.b),
        );
        dst.fill_rect_over(0, i64::from(y), w, 1, color);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/map/placeholder.rs"]
mod tests;
