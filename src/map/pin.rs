use crate::assets::decode::parse_svg;
use crate::assets::svg_raster::rasterize_svg;
use crate::foundation::error::GeoCamResult;
use crate::render::raster::Raster;

const PIN_SVG: &[u8] = include_bytes!("pin.svg");

// Artwork geometry in SVG user units; the tip sits at (16, 40) of a 32x44 box.
const ART_W: f64 = 32.0;
const ART_H: f64 = 44.0;
const TIP_X: f64 = 16.0;
const TIP_Y: f64 = 40.0;

/// The location pin: drop shadow, teardrop body and a two-tone center dot.
pub struct PinGlyph {
    tree: usvg::Tree,
}

impl PinGlyph {
    pub fn new() -> GeoCamResult<Self> {
        Ok(Self {
            tree: parse_svg(PIN_SVG)?,
        })
    }

    /// Rasterize at `height` pixels tall, preserving the artwork aspect.
    pub fn render(&self, height: u32) -> GeoCamResult<PinRaster> {
        let height = height.max(1);
        let width = ((f64::from(height) * ART_W / ART_H).round() as u32).max(1);
        let raster = rasterize_svg(&self.tree, width, height)?;
        Ok(PinRaster {
            tip_x: TIP_X / ART_W * f64::from(width),
            tip_y: TIP_Y / ART_H * f64::from(height),
            raster,
        })
    }

    /// Draw the pin with its tip on (`x`, `y`).
    pub fn draw_tip_at(&self, dst: &mut Raster, height: u32, x: f64, y: f64) -> GeoCamResult<()> {
        let pin = self.render(height)?;
        let dx = (x - pin.tip_x).round() as i64;
        let dy = (y - pin.tip_y).round() as i64;
        dst.draw_over(&pin.raster, dx, dy);
        Ok(())
    }
}

pub struct PinRaster {
    pub raster: Raster,
    /// Tip position inside `raster`, in pixels.
    pub tip_x: f64,
    pub tip_y: f64,
}

/// Pin height for a thumbnail of `thumb_height` pixels.
pub fn pin_height(thumb_height: u32) -> u32 {
    (f64::from(thumb_height) * 0.35).clamp(14.0, 40.0).round() as u32
}

#[cfg(test)]
#[path = "../../tests/unit/map/pin.rs"]
mod tests;
