use chrono::{DateTime, FixedOffset, Offset as _, Utc};

use crate::foundation::core::{AddressResult, GeoFix, Point, Rect, Rgba8};
use crate::foundation::error::GeoCamResult;
use crate::footer::layout::{FooterLayout, PixelBox};
use crate::footer::text::{
    address_text, coordinate_line, datetime_line, location_title, truncate_to_width, wrap_lines,
};
use crate::map::cache::ThumbnailCache;
use crate::map::pin::pin_height;
use crate::map::thumbnail::{MapRenderer, ThumbnailKey};
use crate::render::canvas::Canvas;
use crate::render::raster::Raster;
use crate::render::text::TextRenderer;
use crate::tiles::source::TileSource;

pub const BACKDROP: Rgba8 = Rgba8::rgba(0, 0, 0, 217);
pub const TITLE_COLOR: Rgba8 = Rgba8::rgb(0xB8, 0xBF, 0xE6);
pub const BODY_COLOR: Rgba8 = Rgba8::rgb(0xFF, 0xFF, 0xFF);
pub const MAP_BORDER: Rgba8 = Rgba8::rgb(0x42, 0x54, 0xD3);
pub const MAP_BORDER_WIDTH: f64 = 2.0;
pub const FALLBACK_BOX: Rgba8 = Rgba8::rgb(0xE6, 0xE9, 0xF9);

const WATERMARK_BACKING: Rgba8 = Rgba8::rgba(0, 0, 0, 140);
const WATERMARK_INSET: f64 = 4.0;

/// Presentation settings that do not depend on the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct FooterStyle {
    pub watermark: String,
    pub utc_offset: FixedOffset,
    pub zoom: u8,
}

impl Default for FooterStyle {
    fn default() -> Self {
        Self {
            watermark: "GeoCam".to_string(),
            utc_offset: ist_offset(),
            zoom: 15,
        }
    }
}

fn ist_offset() -> FixedOffset {
    FixedOffset::east_opt(330 * 60).unwrap_or_else(|| Utc.fix())
}

/// Volatile data read once per render.
#[derive(Clone, Copy, Debug)]
pub struct FooterInputs<'a> {
    pub fix: Option<&'a GeoFix>,
    pub address: Option<&'a AddressResult>,
    pub now: DateTime<Utc>,
}

/// Where the map thumbnail comes from.
pub enum ThumbnailMode<'a> {
    /// Always render a new thumbnail (photos).
    Fresh,
    /// Reuse the cached thumbnail while its key matches (recordings).
    Cached(&'a mut ThumbnailCache),
}

/// Draws the information band: backdrop, map thumbnail, title, address, coordinates, time.
pub struct FooterCompositor<S, T> {
    map: MapRenderer<S>,
    text: T,
    style: FooterStyle,
}

impl<S: TileSource, T: TextRenderer> FooterCompositor<S, T> {
    pub fn new(map: MapRenderer<S>, text: T, style: FooterStyle) -> Self {
        Self { map, text, style }
    }

    pub fn map(&self) -> &MapRenderer<S> {
        &self.map
    }

    pub fn text(&self) -> &T {
        &self.text
    }

    pub fn style(&self) -> &FooterStyle {
        &self.style
    }

    /// Render the footer into `dst` rows `[offset_y, offset_y + footer_height)`.
    ///
    /// `surface_height` is the height of the captured frame above the band. Failures are
    /// logged and replaced by fallback drawing; nothing is propagated.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(width = dst.width(), offset_y = offset_y)
    )]
    pub async fn render_footer(
        &mut self,
        dst: &mut Raster,
        offset_y: u32,
        surface_height: u32,
        footer_height: u32,
        inputs: &FooterInputs<'_>,
        mode: ThumbnailMode<'_>,
    ) {
        let width = dst.width();
        if width == 0 || footer_height == 0 {
            return;
        }
        dst.fill_rect_over(0, i64::from(offset_y), width, footer_height, BACKDROP);
        let layout = FooterLayout::compute(width, surface_height, footer_height);

        if let (Some(map_box), Some(fix)) = (layout.map_box, inputs.fix)
            && let Err(err) = self.draw_map(dst, offset_y, map_box, fix, mode).await
        {
            tracing::warn!(error = %err, "map thumbnail failed, drawing fallback box");
            self.draw_map_fallback(dst, offset_y, map_box);
        }

        if let Err(err) = self.draw_text(dst, offset_y, &layout, inputs) {
            tracing::warn!(error = %err, "footer text failed, drawing fallback pin");
            self.draw_text_fallback(dst, offset_y, &layout);
        }
    }

    async fn draw_map(
        &mut self,
        dst: &mut Raster,
        offset_y: u32,
        map_box: PixelBox,
        fix: &GeoFix,
        mode: ThumbnailMode<'_>,
    ) -> GeoCamResult<()> {
        let (x, y) = (i64::from(map_box.x), i64::from(offset_y + map_box.y));
        let (w, h, zoom) = (map_box.width, map_box.height, self.style.zoom);
        match mode {
            ThumbnailMode::Fresh => {
                if let Some(thumb) = self.map.render(Some(fix), w, h, zoom).await? {
                    dst.copy_from(&thumb.raster, x, y);
                }
            }
            ThumbnailMode::Cached(cache) => {
                let key = ThumbnailKey::new(fix, zoom, w, h);
                if let Some(thumb) = cache.lookup(key) {
                    dst.copy_from(&thumb.raster, x, y);
                } else if let Some(thumb) = self.map.render(Some(fix), w, h, zoom).await? {
                    dst.copy_from(&thumb.raster, x, y);
                    cache.store(thumb);
                }
            }
        }
        stroke_border(dst, offset_y, map_box)
    }

    fn draw_map_fallback(&self, dst: &mut Raster, offset_y: u32, map_box: PixelBox) {
        let y = offset_y + map_box.y;
        dst.fill_rect_over(
            i64::from(map_box.x),
            i64::from(y),
            map_box.width,
            map_box.height,
            FALLBACK_BOX,
        );
        let tip_x = f64::from(map_box.x) + f64::from(map_box.width) / 2.0;
        let tip_y = f64::from(y) + f64::from(map_box.height) / 2.0;
        let pin_h = pin_height(map_box.height);
        let drawn = self
            .map
            .pin()
            .draw_tip_at(dst, pin_h, tip_x, tip_y)
            .and_then(|()| stroke_border(dst, offset_y, map_box));
        if let Err(err) = drawn {
            tracing::warn!(error = %err, "fallback map box incomplete");
        }
    }

    fn draw_text(
        &mut self,
        dst: &mut Raster,
        offset_y: u32,
        layout: &FooterLayout,
        inputs: &FooterInputs<'_>,
    ) -> GeoCamResult<()> {
        let mut canvas = Canvas::new(layout.width, layout.footer_height)?;
        let result = self.draw_text_lines(&mut canvas, layout, inputs);
        // Whatever was drawn before a failure is kept.
        dst.draw_over(&canvas.finish(), 0, i64::from(offset_y));
        result
    }

    fn draw_text_lines(
        &mut self,
        canvas: &mut Canvas,
        layout: &FooterLayout,
        inputs: &FooterInputs<'_>,
    ) -> GeoCamResult<()> {
        let col = layout.text_width;
        let x = layout.text_x;
        let (title_size, body_size) = (layout.title_size, layout.body_size);

        let title = location_title(inputs.address);
        let title = truncate_to_width(&mut self.text, &title, title_size, col)?;
        let origin = Point::new(x, layout.title_y);
        self.text.draw(canvas, &title, origin, title_size, TITLE_COLOR)?;

        let address = address_text(inputs.address);
        let address = wrap_lines(&mut self.text, address, body_size, col, 2)?;
        for (line, y) in address.iter().zip(layout.body_ys) {
            self.text.draw(canvas, line, Point::new(x, y), body_size, BODY_COLOR)?;
        }

        let coords = coordinate_line(inputs.fix);
        let coords = truncate_to_width(&mut self.text, &coords, body_size, col)?;
        self.text.draw(
            canvas,
            &coords,
            Point::new(x, layout.body_ys[2]),
            body_size,
            BODY_COLOR,
        )?;

        let when = datetime_line(inputs.now, self.style.utc_offset);
        let when = truncate_to_width(&mut self.text, &when, body_size, col)?;
        self.text.draw(
            canvas,
            &when,
            Point::new(x, layout.body_ys[3]),
            body_size,
            BODY_COLOR,
        )?;

        if let (Some(map_box), Some(_)) = (layout.map_box, inputs.fix) {
            self.draw_watermark(canvas, layout, map_box)?;
        }
        Ok(())
    }

    fn draw_watermark(
        &mut self,
        canvas: &mut Canvas,
        layout: &FooterLayout,
        map_box: PixelBox,
    ) -> GeoCamResult<()> {
        let size = layout.watermark_size;
        let max_w = f64::from(map_box.width) - 2.0 * WATERMARK_INSET;
        let text = truncate_to_width(&mut self.text, &self.style.watermark, size, max_w)?;
        if text.is_empty() {
            return Ok(());
        }
        let text_w = f64::from(self.text.measure(&text, size)?);
        let line_h = f64::from(size) * 1.25;
        let x = f64::from(map_box.x) + WATERMARK_INSET;
        let y = f64::from(map_box.bottom()) - WATERMARK_INSET - line_h;
        canvas.fill_rect(
            Rect::new(x - 2.0, y, x + text_w + 2.0, y + line_h),
            WATERMARK_BACKING,
        );
        self.text.draw(canvas, &text, Point::new(x, y), size, BODY_COLOR)
    }

    fn draw_text_fallback(&self, dst: &mut Raster, offset_y: u32, layout: &FooterLayout) {
        let pin_h = layout.title_line_height.round().max(1.0) as u32;
        let tip_x = layout.text_x + f64::from(pin_h) / 2.0;
        let tip_y = f64::from(offset_y) + layout.title_y + layout.title_line_height;
        if let Err(err) = self.map.pin().draw_tip_at(dst, pin_h, tip_x, tip_y) {
            tracing::warn!(error = %err, "fallback pin failed");
        }
    }
}

fn stroke_border(dst: &mut Raster, offset_y: u32, map_box: PixelBox) -> GeoCamResult<()> {
    let mut canvas = Canvas::new(map_box.width, map_box.height)?;
    let half = MAP_BORDER_WIDTH / 2.0;
    canvas.stroke_rect(
        Rect::new(
            half,
            half,
            f64::from(map_box.width) - half,
            f64::from(map_box.height) - half,
        ),
        MAP_BORDER_WIDTH,
        MAP_BORDER,
    );
    dst.draw_over(
        &canvas.finish(),
        i64::from(map_box.x),
        i64::from(offset_y + map_box.y),
    );
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/footer/compositor.rs"]
mod tests;
