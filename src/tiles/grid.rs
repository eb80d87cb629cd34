use crate::geo::projection::{TILE_SIZE, TileCoordinate, TilePosition};

/// Square block of tiles centered on the tile containing a position.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    pub position: TilePosition,
    pub radius: u32,
    /// In-range tiles only, row-major.
    pub tiles: Vec<TileCoordinate>,
}

impl TileGrid {
    /// Smallest grid whose half-extent covers half of a `width x height` box around `position`.
    pub fn covering(position: TilePosition, width: u32, height: u32) -> Self {
        let radius = grid_radius(width, height);
        let center = position.tile();
        let r = i64::from(radius);

        let mut tiles = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
        for dy in -r..=r {
            for dx in -r..=r {
                let x = i64::from(center.x) + dx;
                let y = i64::from(center.y) + dy;
                if let Some(coord) = TileCoordinate::new(position.zoom, x, y) {
                    tiles.push(coord);
                }
            }
        }

        Self {
            position,
            radius,
            tiles,
        }
    }
}

/// `ceil(max(width, height) / 2 / TILE_SIZE)`, never below 1.
pub fn grid_radius(width: u32, height: u32) -> u32 {
    let half = width.max(height).div_ceil(2);
    half.div_ceil(TILE_SIZE).max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/tiles/grid.rs"]
mod tests;
