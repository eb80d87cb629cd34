use chrono::TimeZone as _;

use super::*;
use crate::foundation::error::GeoCamError;
use crate::footer::layout::footer_height;
use crate::tiles::fetcher::TileFetcher;
use crate::tiles::source::OfflineTileSource;

/// Draws each character as a solid block and records what was drawn.
#[derive(Default)]
struct BlockText {
    drawn: Vec<String>,
}

impl TextRenderer for BlockText {
    fn measure(&mut self, text: &str, size_px: f32) -> GeoCamResult<f32> {
        Ok(text.chars().count() as f32 * size_px * 0.5)
    }

    fn draw(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        origin: Point,
        size_px: f32,
        color: Rgba8,
    ) -> GeoCamResult<()> {
        let advance = f64::from(size_px) * 0.5;
        for (i, ch) in text.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let x0 = origin.x + i as f64 * advance;
            canvas.fill_rect(
                Rect::new(x0, origin.y, x0 + advance * 0.8, origin.y + f64::from(size_px)),
                color,
            );
        }
        self.drawn.push(text.to_string());
        Ok(())
    }
}

struct BrokenText;

impl TextRenderer for BrokenText {
    fn measure(&mut self, _text: &str, _size_px: f32) -> GeoCamResult<f32> {
        Err(GeoCamError::render("no font"))
    }

    fn draw(
        &mut self,
        _canvas: &mut Canvas,
        _text: &str,
        _origin: Point,
        _size_px: f32,
        _color: Rgba8,
    ) -> GeoCamResult<()> {
        Err(GeoCamError::render("no font"))
    }
}

fn compositor<T: TextRenderer>(text: T) -> FooterCompositor<OfflineTileSource, T> {
    let map = MapRenderer::new(TileFetcher::with_defaults(OfflineTileSource)).unwrap();
    FooterCompositor::new(map, text, FooterStyle::default())
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 5).unwrap()
}

fn delhi() -> GeoFix {
    GeoFix::new(28.6139, 77.209, now()).unwrap()
}

const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);

#[tokio::test]
async fn band_gets_the_dark_backdrop_and_rows_above_are_untouched() {
    let mut c = compositor(BlockText::default());
    let mut dst = Raster::filled(320, 300, WHITE);
    let inputs = FooterInputs {
        fix: None,
        address: None,
        now: now(),
    };
    c.render_footer(&mut dst, 200, 200, 100, &inputs, ThumbnailMode::Fresh).await;

    assert_eq!(dst.pixel(319, 199), Some([255, 255, 255, 255]));
    let band = dst.pixel(319, 299).unwrap();
    assert!(band[0] < 50 && band[3] == 255);
}

#[tokio::test]
async fn absent_inputs_draw_placeholder_text_and_skip_the_map() {
    let mut c = compositor(BlockText::default());
    let (w, h) = (800u32, 600u32);
    let fh = footer_height(w);
    let mut dst = Raster::filled(w, h + fh, WHITE);
    let inputs = FooterInputs {
        fix: None,
        address: None,
        now: now(),
    };
    c.render_footer(&mut dst, h, h, fh, &inputs, ThumbnailMode::Fresh).await;

    let drawn = &c.text().drawn;
    assert_eq!(drawn[0], "Unknown Location");
    assert_eq!(drawn[1], "Address not available");
    assert!(drawn.iter().any(|s| s == "Lat N/A Long N/A"));
    assert!(!drawn.iter().any(|s| s == "GeoCam"));
    assert_eq!(c.map().fetcher().batches_issued(), 0);

    // The map box center shows only the backdrop.
    let layout = FooterLayout::compute(w, h, fh);
    let b = layout.map_box.unwrap();
    let center = dst
        .pixel(b.x + b.width / 2, h + b.y + b.height / 2)
        .unwrap();
    let backdrop = dst.pixel(w - 1, h + fh - 1).unwrap();
    assert_eq!(center, backdrop);
}

#[tokio::test]
async fn cached_mode_fetches_once_per_key() {
    let mut c = compositor(BlockText::default());
    let mut cache = ThumbnailCache::new();
    let fix = delhi();
    let mut dst = Raster::filled(800, 720, WHITE);

    for _ in 0..3 {
        let inputs = FooterInputs {
            fix: Some(&fix),
            address: None,
            now: now(),
        };
        c.render_footer(&mut dst, 600, 600, 120, &inputs, ThumbnailMode::Cached(&mut cache)).await;
    }
    assert_eq!(c.map().fetcher().batches_issued(), 1);
    assert!(!cache.is_empty());

    let moved = GeoFix::new(28.62, 77.21, now()).unwrap();
    let inputs = FooterInputs {
        fix: Some(&moved),
        address: None,
        now: now(),
    };
    c.render_footer(&mut dst, 600, 600, 120, &inputs, ThumbnailMode::Cached(&mut cache)).await;
    assert_eq!(c.map().fetcher().batches_issued(), 2);
}

#[tokio::test]
async fn fresh_mode_fetches_every_time() {
    let mut c = compositor(BlockText::default());
    let fix = delhi();
    let mut dst = Raster::filled(800, 720, WHITE);
    let inputs = FooterInputs {
        fix: Some(&fix),
        address: None,
        now: now(),
    };
    c.render_footer(&mut dst, 600, 600, 120, &inputs, ThumbnailMode::Fresh).await;
    c.render_footer(&mut dst, 600, 600, 120, &inputs, ThumbnailMode::Fresh).await;
    assert_eq!(c.map().fetcher().batches_issued(), 2);
}

#[tokio::test]
async fn map_box_gets_a_blue_border() {
    let mut c = compositor(BlockText::default());
    let fix = delhi();
    let mut dst = Raster::filled(800, 720, WHITE);
    let inputs = FooterInputs {
        fix: Some(&fix),
        address: None,
        now: now(),
    };
    c.render_footer(&mut dst, 600, 600, 120, &inputs, ThumbnailMode::Fresh).await;

    let b = FooterLayout::compute(800, 600, 120).map_box.unwrap();
    let edge = dst.pixel(b.x, 600 + b.y + b.height / 2).unwrap();
    assert_eq!(edge, [0x42, 0x54, 0xD3, 255]);
}

#[tokio::test]
async fn rendering_is_pixel_identical_for_identical_inputs() {
    let fix = delhi();
    let addr = AddressResult::new("Janpath, New Delhi, Delhi, India", now());
    let inputs = FooterInputs {
        fix: Some(&fix),
        address: Some(&addr),
        now: now(),
    };
    let mut a = Raster::filled(640, 600, WHITE);
    let mut b = Raster::filled(640, 600, WHITE);
    compositor(BlockText::default())
        .render_footer(&mut a, 480, 480, 120, &inputs, ThumbnailMode::Fresh)
        .await;
    compositor(BlockText::default())
        .render_footer(&mut b, 480, 480, 120, &inputs, ThumbnailMode::Fresh)
        .await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn text_failure_draws_the_fallback_pin_and_does_not_propagate() {
    let mut c = compositor(BrokenText);
    let (w, h) = (800u32, 600u32);
    let mut dst = Raster::filled(w, h + 120, WHITE);
    let inputs = FooterInputs {
        fix: None,
        address: None,
        now: now(),
    };
    c.render_footer(&mut dst, h, h, 120, &inputs, ThumbnailMode::Fresh).await;

    let layout = FooterLayout::compute(w, h, 120);
    let pin_h = layout.title_line_height.round() as u32;
    // Pin body sits roughly 60% of its height above the tip.
    let body_x = (layout.text_x + f64::from(pin_h) / 2.0) as u32;
    let body_y = (f64::from(h) + layout.title_y + layout.title_line_height
        - f64::from(pin_h) * 0.6) as u32;
    let px = dst.pixel(body_x, body_y).unwrap();
    let backdrop = dst.pixel(w - 1, h + 119).unwrap();
    assert_ne!(px, backdrop);
}
