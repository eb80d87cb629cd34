use crate::foundation::core::{GeoFix, Rgba8};
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::foundation::math::Fnv1a64;
use crate::geo::projection::{TilePosition, validate_zoom};
use crate::map::pin::{PinGlyph, pin_height};
use crate::map::placeholder::{GRADIENT_TOP, draw_placeholder};
use crate::render::raster::Raster;
use crate::tiles::fetcher::TileFetcher;
use crate::tiles::grid::TileGrid;
use crate::tiles::source::TileSource;

/// Identity of a rendered thumbnail: coordinate (1e-6 degree), zoom and pixel size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThumbnailKey(u64);

impl ThumbnailKey {
    pub fn new(fix: &GeoFix, zoom: u8, width: u32, height: u32) -> Self {
        let mut h = Fnv1a64::new_default();
        h.write_i64(quantize_degrees(fix.latitude));
        h.write_i64(quantize_degrees(fix.longitude));
        h.write_u8(zoom);
        h.write_u32(width);
        h.write_u32(height);
        Self(h.finish())
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

fn quantize_degrees(deg: f64) -> i64 {
    (deg * 1e6).round() as i64
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThumbnailOrigin {
    /// At least one remote tile was composited.
    Tiles,
    /// No tile arrived; synthetic art was drawn instead.
    Placeholder,
}

/// A finished map thumbnail, centered on its coordinate, pin included.
#[derive(Clone, Debug)]
pub struct MapThumbnail {
    pub raster: Raster,
    pub key: ThumbnailKey,
    pub origin: ThumbnailOrigin,
}

/// Renders map thumbnails from fetched tiles, falling back to placeholder art.
pub struct MapRenderer<S> {
    fetcher: TileFetcher<S>,
    pin: PinGlyph,
}

impl<S: TileSource> MapRenderer<S> {
    pub fn new(fetcher: TileFetcher<S>) -> GeoCamResult<Self> {
        Ok(Self {
            fetcher,
            pin: PinGlyph::new()?,
        })
    }

    pub fn fetcher(&self) -> &TileFetcher<S> {
        &self.fetcher
    }

    pub fn pin(&self) -> &PinGlyph {
        &self.pin
    }

    /// Render a `width x height` thumbnail centered on `fix`.
    ///
    /// Returns `Ok(None)` when there is no fix. Tile failures never surface as errors; the
    /// worst case is the placeholder. Errors only come from drawing.
    #[tracing::instrument(level = "debug", skip(self, fix), fields(has_fix = fix.is_some()))]
    pub async fn render(
        &self,
        fix: Option<&GeoFix>,
        width: u32,
        height: u32,
        zoom: u8,
    ) -> GeoCamResult<Option<MapThumbnail>> {
        let Some(fix) = fix else {
            return Ok(None);
        };
        validate_zoom(zoom)?;
        if width == 0 || height == 0 {
            return Err(GeoCamError::render("thumbnail width/height must be non-zero"));
        }

        let position = TilePosition::from_fix(fix, zoom)?;
        let grid = TileGrid::covering(position, width, height);
        let tiles = self.fetcher.fetch_grid(&grid).await;

        let (center_x, center_y) = position.world_px();
        let left = center_x - f64::from(width) / 2.0;
        let top = center_y - f64::from(height) / 2.0;

        let mut raster = Raster::filled(width, height, MAP_BACKGROUND);
        let mut placed = 0usize;
        for tile in &tiles {
            let Some(tile_raster) = tile.raster.as_ref() else {
                continue;
            };
            let (ox, oy) = tile.coord.origin_px();
            let dx = (ox - left).round() as i64;
            let dy = (oy - top).round() as i64;
            raster.copy_from(tile_raster, dx, dy);
            placed += 1;
        }

        let origin = if placed == 0 {
            tracing::debug!("no tiles available, drawing placeholder map");
            raster = draw_placeholder(width, height)?;
            ThumbnailOrigin::Placeholder
        } else {
            ThumbnailOrigin::Tiles
        };

        self.pin.draw_tip_at(
            &mut raster,
            pin_height(height),
            f64::from(width) / 2.0,
            f64::from(height) / 2.0,
        )?;

        Ok(Some(MapThumbnail {
            raster,
            key: ThumbnailKey::new(fix, zoom, width, height),
            origin,
        }))
    }
}

/// Fill behind tiles, visible where a tile is missing.
pub const MAP_BACKGROUND: Rgba8 = GRADIENT_TOP;

#[cfg(test)]
#[path = "../../tests/unit/map/thumbnail.rs"]
mod tests;
