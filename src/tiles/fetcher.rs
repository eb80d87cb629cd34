use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::assets::decode::decode_image;
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::foundation::math::Fnv1a64;
use crate::geo::projection::{TILE_SIZE, TileCoordinate};
use crate::render::raster::Raster;
use crate::tiles::grid::TileGrid;
use crate::tiles::source::TileSource;

/// OpenStreetMap tile servers.
pub const DEFAULT_MIRRORS: [&str; 3] = [
    "https://a.tile.openstreetmap.org",
    "https://b.tile.openstreetmap.org",
    "https://c.tile.openstreetmap.org",
];

pub const DEFAULT_TILE_TIMEOUT: Duration = Duration::from_millis(1500);
pub const MIN_TILE_TIMEOUT: Duration = Duration::from_millis(1000);
pub const MAX_TILE_TIMEOUT: Duration = Duration::from_millis(2000);

/// One settled tile request.
/// Outcome of one tile request.
#[derive(Clone, Debug)]
pub struct FetchedTile {
    pub coord: TileCoordinate,
    /// `None` when the tile timed out or failed to download or decode.
    pub raster: Option<Raster>,
}

impl FetchedTile {
    pub fn is_available(&self) -> bool {
        self.raster.is_some()
    }
}

/// Fetches tile grids concurrently, one attempt per tile, each raced against a fixed timeout.
pub struct TileFetcher<S> {
    source: S,
    mirrors: Vec<String>,
    timeout: Duration,
    batches_issued: AtomicU64,
}

impl<S: TileSource> TileFetcher<S> {
    /// Fails when `mirrors` is empty or `timeout` lies outside
    /// [`MIN_TILE_TIMEOUT`]..=[`MAX_TILE_TIMEOUT`].
    pub fn new(source: S, mirrors: Vec<String>, timeout: Duration) -> GeoCamResult<Self> {
        if mirrors.is_empty() {
            return Err(GeoCamError::validation("at least one tile mirror is required"));
        }
        if !(MIN_TILE_TIMEOUT..=MAX_TILE_TIMEOUT).contains(&timeout) {
            return Err(GeoCamError::validation(format!(
                "tile timeout {}ms is outside {}..={}ms",
                timeout.as_millis(),
                MIN_TILE_TIMEOUT.as_millis(),
                MAX_TILE_TIMEOUT.as_millis()
            )));
        }
        let mirrors = mirrors
            .into_iter()
            .map(|m| m.trim_end_matches('/').to_string())
            .collect();
        Ok(Self {
            source,
            mirrors,
            timeout,
            batches_issued: AtomicU64::new(0),
        })
    }

    /// Default OpenStreetMap mirrors and timeout.
    pub fn with_defaults(source: S) -> Self {
        Self {
            source,
            mirrors: DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect(),
            timeout: DEFAULT_TILE_TIMEOUT,
            batches_issued: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of [`TileFetcher::fetch_grid`] calls so far.
    pub fn batches_issued(&self) -> u64 {
        self.batches_issued.load(Ordering::Relaxed)
    }

    /// `<mirror>/<z>/<x>/<y>.png` on the tile's mirror.
    pub fn tile_url(&self, coord: TileCoordinate) -> String {
        let mirror = &self.mirrors[mirror_index(coord, self.mirrors.len())];
        format!("{mirror}/{}/{}/{}.png", coord.zoom, coord.x, coord.y)
    }

    /// Fetch every tile of `grid`. Resolves once each request has settled; never fails.
    #[tracing::instrument(level = "debug", skip_all, fields(tiles = grid.tiles.len()))]
    pub async fn fetch_grid(&self, grid: &TileGrid) -> Vec<FetchedTile> {
        self.batches_issued.fetch_add(1, Ordering::Relaxed);
        let requests = grid.tiles.iter().map(|&coord| self.fetch_one(coord));
        let tiles = futures::future::join_all(requests).await;
        tracing::debug!(
            available = tiles.iter().filter(|t| t.is_available()).count(),
            "tile batch settled"
        );
        tiles
    }

    async fn fetch_one(&self, coord: TileCoordinate) -> FetchedTile {
        let url = self.tile_url(coord);
        let attempt = async {
            let bytes = self.source.fetch(&url).await?;
            let raster = decode_image(&bytes)?;
            if raster.width() != TILE_SIZE || raster.height() != TILE_SIZE {
                return Err(GeoCamError::network(format!(
                    "tile is {}x{}, expected {TILE_SIZE}x{TILE_SIZE}",
                    raster.width(),
                    raster.height()
                )));
            }
            Ok(raster)
        };

        let raster = match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(raster)) => Some(raster),
            Ok(Err(err)) => {
                tracing::debug!(%url, error = %err, "tile unavailable");
                None
            }
            Err(_) => {
                tracing::debug!(
                    %url,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "tile timed out"
                );
                None
            }
        };
        FetchedTile { coord, raster }
    }
}

/// Deterministic mirror choice for a tile.
pub fn mirror_index(coord: TileCoordinate, mirror_count: usize) -> usize {
    if mirror_count == 0 {
        return 0;
    }
    let mut h = Fnv1a64::new_default();
    h.write_u8(coord.zoom);
    h.write_u32(coord.x);
    h.write_u32(coord.y);
    (h.finish() % mirror_count as u64) as usize
}

#[cfg(test)]
#[path = "../../tests/unit/tiles/fetcher.rs"]
mod tests;
