use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::render::canvas::Canvas;

/// Measures and draws single-line text.
///
/// The footer compositor only needs these two operations, which keeps it testable with
/// fixed-advance fakes in place of real font shaping.
pub trait TextRenderer {
    /// Advance width of `text` at `size_px`, in pixels.
    fn measure(&mut self, text: &str, size_px: f32) -> GeoCamResult<f32>;

    /// Draw `text` with the top-left of its line box at `origin`.
    fn draw(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        origin: Point,
        size_px: f32,
        color: Rgba8,
    ) -> GeoCamResult<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Stateful helper for building Parley text layouts from one registered font.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    pub fn new(font_bytes: &[u8]) -> GeoCamResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            GeoCamError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| GeoCamError::validation("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape and lay out `text` on a single unbounded line.
    pub fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> GeoCamResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(GeoCamError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Font-backed [`TextRenderer`] using Parley shaping and vello_cpu glyph rasterization.
pub struct ParleyText {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
    widths: HashMap<(String, u32), f32>,
}

impl ParleyText {
    pub fn new(font_bytes: Arc<Vec<u8>>) -> GeoCamResult<Self> {
        let engine = TextLayoutEngine::new(font_bytes.as_slice())?;
        tracing::debug!(family = engine.family_name(), "footer font registered");
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.as_ref().clone()),
            0,
        );
        Ok(Self {
            engine,
            font,
            widths: HashMap::new(),
        })
    }

    /// Load the font at `path`, or the system sans-serif face when `path` is `None`.
    pub fn from_font_path(path: Option<&Path>) -> GeoCamResult<Self> {
        Self::new(Arc::new(load_font_bytes(path)?))
    }
}

impl TextRenderer for ParleyText {
    fn measure(&mut self, text: &str, size_px: f32) -> GeoCamResult<f32> {
        let key = (text.to_string(), size_px.to_bits());
        if let Some(w) = self.widths.get(&key) {
            return Ok(*w);
        }
        let layout = self
            .engine
            .layout_line(text, size_px, TextBrushRgba8::default())?;
        let w = layout.width();
        // Bounded: the address text changes as the fix moves.
        if self.widths.len() > 4096 {
            self.widths.clear();
        }
        self.widths.insert(key, w);
        Ok(w)
    }

    fn draw(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        origin: Point,
        size_px: f32,
        color: Rgba8,
    ) -> GeoCamResult<()> {
        let brush = TextBrushRgba8 {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        let layout = self.engine.layout_line(text, size_px, brush)?;
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                canvas.fill_glyphs(&self.font, run.run().font_size(), origin, color, glyphs);
            }
        }
        Ok(())
    }
}

/// Read font bytes from `path`, or query the system font database for a sans-serif face.
pub fn load_font_bytes(path: Option<&Path>) -> GeoCamResult<Vec<u8>> {
    if let Some(path) = path {
        return std::fs::read(path)
            .with_context(|| format!("read font file '{}'", path.display()))
            .map_err(GeoCamError::from);
    }

    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    let families = [
        usvg::fontdb::Family::SansSerif,
        usvg::fontdb::Family::Name("DejaVu Sans"),
        usvg::fontdb::Family::Name("Arial"),
    ];
    let query = usvg::fontdb::Query {
        families: &families,
        ..Default::default()
    };
    let id = db
        .query(&query)
        .or_else(|| db.faces().next().map(|f| f.id))
        .ok_or_else(|| GeoCamError::render("no system fonts available for footer text"))?;
    db.with_face_data(id, |data, _index| data.to_vec())
        .ok_or_else(|| GeoCamError::render("failed to read system font data"))
}
