use crate::foundation::core::{Point, Rect, Rgba8, point_to_cpu, rect_to_cpu};
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::render::raster::Raster;

/// Vector drawing surface backed by a vello_cpu render context.
///
/// Draw calls are recorded and rasterized in [`Canvas::finish`], which yields a transparent
/// [`Raster`] that callers composite over their destination.
pub struct Canvas {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> GeoCamResult<Self> {
        let width: u16 = width
            .try_into()
            .map_err(|_| GeoCamError::render("canvas width exceeds u16"))?;
        let height: u16 = height
            .try_into()
            .map_err(|_| GeoCamError::render("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(GeoCamError::render("canvas width/height must be non-zero"));
        }
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(width, height),
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color.to_cpu());
        self.ctx.fill_rect(&rect_to_cpu(rect));
    }

    pub fn stroke_rect(&mut self, rect: Rect, width: f64, color: Rgba8) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color.to_cpu());
        self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx.stroke_rect(&rect_to_cpu(rect));
    }

    pub fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba8) {
        let mut path = vello_cpu::kurbo::BezPath::new();
        path.move_to(point_to_cpu(from));
        path.line_to(point_to_cpu(to));

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color.to_cpu());
        self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx.stroke_path(&path);
    }

    /// Fill positioned glyphs with `font`; glyph coordinates are relative to `origin`.
    pub(crate) fn fill_glyphs(
        &mut self,
        font: &vello_cpu::peniko::FontData,
        size_px: f32,
        origin: Point,
        color: Rgba8,
        glyphs: impl Iterator<Item = vello_cpu::Glyph>,
    ) {
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((origin.x, origin.y)));
        self.ctx.set_paint(color.to_cpu());
        self.ctx.glyph_run(font).font_size(size_px).fill_glyphs(glyphs);
    }

    /// Rasterize everything drawn so far.
    pub fn finish(mut self) -> Raster {
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);
        Raster::from_pixmap(&pixmap)
    }
}
