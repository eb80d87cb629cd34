use crate::map::thumbnail::{MapThumbnail, ThumbnailKey};

/// Single-entry thumbnail cache owned by a recording session.
///
/// Holds at most one thumbnail; storing a thumbnail under a new key replaces the old one.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entry: Option<MapThumbnail>,
    hits: u64,
    misses: u64,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached thumbnail when its key equals `key`.
    pub fn lookup(&mut self, key: ThumbnailKey) -> Option<&MapThumbnail> {
        match self.entry.as_ref() {
            Some(thumb) if thumb.key == key => {
                self.hits += 1;
                Some(thumb)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn store(&mut self, thumbnail: MapThumbnail) {
        tracing::debug!(
            key = thumbnail.key.as_u64(),
            origin = ?thumbnail.origin,
            "thumbnail cached"
        );
        self.entry = Some(thumbnail);
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub fn key(&self) -> Option<ThumbnailKey> {
        self.entry.as_ref().map(|t| t.key)
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
#[path = "../../tests/unit/map/cache.rs"]
mod tests;
