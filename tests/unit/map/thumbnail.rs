use std::cell::Cell;
use std::io::Cursor;

use chrono::TimeZone as _;

use super::*;
use crate::geo::projection::TILE_SIZE;
use crate::tiles::source::OfflineTileSource;

/// Serves 256x256 solid tiles whose color encodes the tile x/y.
#[derive(Default)]
struct ColoredTiles {
    requests: Cell<usize>,
}

fn tile_color(x: u32, y: u32) -> [u8; 4] {
    [(x * 37 % 256) as u8, (y * 91 % 256) as u8, 200, 255]
}

impl TileSource for ColoredTiles {
    async fn fetch(&self, url: &str) -> GeoCamResult<Vec<u8>> {
        self.requests.set(self.requests.get() + 1);
        let mut parts = url.rsplit('/');
        let y: u32 = parts
            .next()
            .and_then(|s| s.strip_suffix(".png"))
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| GeoCamError::network("bad url"))?;
        let x: u32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| GeoCamError::network("bad url"))?;
        let img = image::RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, image::Rgba(tile_color(x, y)));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| GeoCamError::render(e.to_string()))?;
        Ok(buf)
    }
}

fn delhi() -> GeoFix {
    let t = chrono::Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
    GeoFix::new(28.6139, 77.209, t).unwrap()
}

#[test]
fn key_changes_with_every_component() {
    let fix = delhi();
    let base = ThumbnailKey::new(&fix, 15, 224, 112);
    assert_eq!(base, ThumbnailKey::new(&fix, 15, 224, 112));
    assert_ne!(base, ThumbnailKey::new(&fix, 16, 224, 112));
    assert_ne!(base, ThumbnailKey::new(&fix, 15, 225, 112));
    assert_ne!(base, ThumbnailKey::new(&fix, 15, 224, 113));
    let mut moved = fix;
    moved.latitude += 2e-6;
    assert_ne!(base, ThumbnailKey::new(&moved, 15, 224, 112));
}

#[test]
fn key_ignores_sub_micro_degree_jitter() {
    let fix = delhi();
    let mut jitter = fix;
    jitter.longitude += 1e-8;
    assert_eq!(
        ThumbnailKey::new(&fix, 15, 224, 112),
        ThumbnailKey::new(&jitter, 15, 224, 112)
    );
}

#[tokio::test]
async fn absent_fix_renders_nothing_and_fetches_nothing() {
    let renderer = MapRenderer::new(TileFetcher::with_defaults(ColoredTiles::default())).unwrap();
    let out = renderer.render(None, 224, 112, 15).await.unwrap();
    assert!(out.is_none());
    assert_eq!(renderer.fetcher().batches_issued(), 0);
}

#[tokio::test]
async fn tiles_are_offset_so_the_coordinate_lands_on_the_center() {
    let renderer = MapRenderer::new(TileFetcher::with_defaults(ColoredTiles::default())).unwrap();
    let fix = delhi();
    let (w, h) = (224u32, 112u32);
    let thumb = renderer.render(Some(&fix), w, h, 15).await.unwrap().unwrap();
    assert_eq!(thumb.origin, ThumbnailOrigin::Tiles);
    assert_eq!(renderer.fetcher().source().requests.get(), 9);

    let pos = TilePosition::from_fix(&fix, 15).unwrap();
    let tile = pos.tile();
    let (fx, _) = pos.fraction();
    let (cx, cy) = pos.world_px();
    let left = cx - f64::from(w) / 2.0;
    let top = cy - f64::from(h) / 2.0;

    // Column where the east neighbour starts.
    let boundary = ((f64::from(tile.x + 1) * 256.0) - left).round() as u32;
    let row = ((f64::from(tile.y) * 256.0 + 4.0) - top).max(0.0) as u32;
    assert!(boundary > 0 && boundary < w);
    assert_eq!(thumb.raster.pixel(boundary - 1, row), Some(tile_color(tile.x, tile.y)));
    assert_eq!(thumb.raster.pixel(boundary, row), Some(tile_color(tile.x + 1, tile.y)));

    // The coordinate sits within 1 px of the raster center.
    let coord_x = f64::from(boundary) - (1.0 - fx) * 256.0;
    assert!((coord_x - f64::from(w) / 2.0).abs() <= 1.0);
}

#[tokio::test(start_paused = true)]
async fn unavailable_tiles_fall_back_to_placeholder_with_centered_pin() {
    let renderer = MapRenderer::new(TileFetcher::with_defaults(OfflineTileSource)).unwrap();
    let thumb = renderer
        .render(Some(&delhi()), 200, 100, 15)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(thumb.origin, ThumbnailOrigin::Placeholder);

    let placeholder = draw_placeholder(200, 100).unwrap();
    // Corners show the placeholder, the center shows the pin.
    assert_eq!(thumb.raster.pixel(2, 2), placeholder.pixel(2, 2));
    assert_ne!(thumb.raster.pixel(100, 40), placeholder.pixel(100, 40));
}
