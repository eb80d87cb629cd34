//! Web-Mercator slippy-map projection.

use crate::foundation::core::GeoFix;
use crate::foundation::error::{GeoCamError, GeoCamResult};

/// Edge length of a map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level served by the default tile mirrors.
pub const MAX_ZOOM: u8 = 19;

/// Latitude limit of the square Web-Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Address of one map tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoordinate {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoordinate {
    /// Checked constructor; `x` and `y` must lie in `[0, 2^zoom)`.
    pub fn new(zoom: u8, x: i64, y: i64) -> Option<Self> {
        if zoom > MAX_ZOOM {
            return None;
        }
        let n = tiles_per_axis(zoom);
        if x < 0 || y < 0 || x >= n || y >= n {
            return None;
        }
        Some(Self {
            zoom,
            x: x as u32,
            y: y as u32,
        })
    }

    /// Top-left corner in world pixel space at this tile's zoom.
    pub fn origin_px(self) -> (f64, f64) {
        let s = f64::from(TILE_SIZE);
        (f64::from(self.x) * s, f64::from(self.y) * s)
    }
}

/// Fractional tile-space position of a coordinate at a zoom level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePosition {
    pub zoom: u8,
    pub x: f64,
    pub y: f64,
}

impl TilePosition {
    pub fn from_fix(fix: &GeoFix, zoom: u8) -> GeoCamResult<Self> {
        Self::from_lat_lon(fix.latitude, fix.longitude, zoom)
    }

    pub fn from_lat_lon(latitude: f64, longitude: f64, zoom: u8) -> GeoCamResult<Self> {
        validate_zoom(zoom)?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoCamError::validation("coordinate must be finite"));
        }
        let n = tiles_per_axis(zoom) as f64;
        let lat = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (longitude + 180.0) / 360.0 * n;
        let y = (1.0 - lat.tan().asinh() / std::f64::consts::PI) / 2.0 * n;
        // lon = 180 and the clamped poles land exactly on the far edge.
        let edge = n - 1e-9;
        Ok(Self {
            zoom,
            x: x.clamp(0.0, edge),
            y: y.clamp(0.0, edge),
        })
    }

    /// The tile containing this position.
    pub fn tile(self) -> TileCoordinate {
        TileCoordinate {
            zoom: self.zoom,
            x: self.x.floor() as u32,
            y: self.y.floor() as u32,
        }
    }

    /// Offset inside the containing tile, each component in `[0, 1)`.
    pub fn fraction(self) -> (f64, f64) {
        (self.x - self.x.floor(), self.y - self.y.floor())
    }

    /// Position in world pixel space.
    pub fn world_px(self) -> (f64, f64) {
        let s = f64::from(TILE_SIZE);
        (self.x * s, self.y * s)
    }
}

pub fn validate_zoom(zoom: u8) -> GeoCamResult<()> {
    if zoom > MAX_ZOOM {
        return Err(GeoCamError::validation(format!(
            "zoom {zoom} is outside 0..={MAX_ZOOM}"
        )));
    }
    Ok(())
}

fn tiles_per_axis(zoom: u8) -> i64 {
    1i64 << zoom
}

#[cfg(test)]
#[path = "../../tests/unit/geo/projection.rs"]
mod tests;
