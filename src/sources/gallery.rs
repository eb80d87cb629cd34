use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::foundation::error::GeoCamResult;

/// What a gallery item holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Photo => "photo",
            Self::Video => "video",
        })
    }
}

/// A stamped artifact handed to the gallery.
/// One finished photo or video with its encoded bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedMediaItem {
    pub kind: MediaKind,
    pub payload: Vec<u8>,
    pub mime: String,
    /// Session-local handle, `blob:geocam/<n>`.
    pub origin_url: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for CapturedMediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedMediaItem")
            .field("kind", &self.kind)
            .field("bytes", &self.payload.len())
            .field("mime", &self.mime)
            .field("origin_url", &self.origin_url)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl CapturedMediaItem {
    /// `GeoCam_<kind>_<unix millis>.<ext>`.
    pub fn download_name(&self) -> String {
        format!(
            "GeoCam_{}_{}.{}",
            self.kind,
            self.created_at.timestamp_millis(),
            extension_for(&self.mime, self.kind)
        )
    }
}

fn extension_for(mime: &str, kind: MediaKind) -> &'static str {
    match mime.split(';').next().map(str::trim) {
        Some("image/jpeg") => "jpg",
        Some("image/png") => "png",
        Some("video/webm") => "webm",
        Some("video/mp4") => "mp4",
        _ => match kind {
            MediaKind::Photo => "jpg",
            MediaKind::Video => "webm",
        },
    }
}

/// Receives finished artifacts.
pub trait GallerySink {
    fn add_item(&mut self, kind: MediaKind, payload: Vec<u8>, mime: &str) -> CapturedMediaItem;
}

/// In-memory gallery for one session, newest item first.
#[derive(Debug, Default)]
pub struct SessionGallery {
    items: Vec<CapturedMediaItem>,
    next_handle: u64,
}

impl SessionGallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CapturedMediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, origin_url: &str) -> Option<&CapturedMediaItem> {
        self.items.iter().find(|i| i.origin_url == origin_url)
    }

    /// Delete by handle; returns the removed item.
    pub fn remove(&mut self, origin_url: &str) -> Option<CapturedMediaItem> {
        let idx = self.items.iter().position(|i| i.origin_url == origin_url)?;
        Some(self.items.remove(idx))
    }

    /// Write one item into `dir` under its download name.
    pub fn export(&self, origin_url: &str, dir: &Path) -> GeoCamResult<Option<PathBuf>> {
        let Some(item) = self.get(origin_url) else {
            return Ok(None);
        };
        write_item(item, dir).map(Some)
    }

    /// Write every item into `dir`, newest first.
    pub fn export_all(&self, dir: &Path) -> GeoCamResult<Vec<PathBuf>> {
        self.items.iter().map(|item| write_item(item, dir)).collect()
    }
}

impl GallerySink for SessionGallery {
    fn add_item(&mut self, kind: MediaKind, payload: Vec<u8>, mime: &str) -> CapturedMediaItem {
        self.next_handle += 1;
        let item = CapturedMediaItem {
            kind,
            payload,
            mime: mime.to_string(),
            origin_url: format!("blob:geocam/{}", self.next_handle),
            created_at: Utc::now(),
        };
        tracing::info!(
            kind = %item.kind,
            bytes = item.payload.len(),
            origin_url = %item.origin_url,
            "gallery item added"
        );
        self.items.insert(0, item.clone());
        item
    }
}

fn write_item(item: &CapturedMediaItem, dir: &Path) -> GeoCamResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory '{}'", dir.display()))?;
    let path = dir.join(item.download_name());
    std::fs::write(&path, &item.payload)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/sources/gallery.rs"]
mod tests;
