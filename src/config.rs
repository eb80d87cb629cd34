use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use chrono::FixedOffset;

use crate::capture::photo::DEFAULT_JPEG_QUALITY;
use crate::capture::video::{DEFAULT_BITRATE_BPS, DEFAULT_FPS, RecorderSettings};
use crate::encode::sink::{DEFAULT_CODEC_PREFERENCE, VideoCodec};
use crate::footer::compositor::FooterStyle;
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::geo::projection::validate_zoom;
use crate::sources::camera::AudioInput;
use crate::tiles::fetcher::{
    DEFAULT_MIRRORS, DEFAULT_TILE_TIMEOUT, MAX_TILE_TIMEOUT, MIN_TILE_TIMEOUT,
};

/// Sent with tile and geocoder requests.
pub const DEFAULT_USER_AGENT: &str = concat!("geocam/", env!("CARGO_PKG_VERSION"));

/// Engine settings, loadable from JSON. Missing fields take their defaults.
/// Engine settings loaded from a JSON file; missing keys take their defaults.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeoCamConfig {
    pub tiles: TileConfig,
    pub footer: FooterConfig,
    pub photo: PhotoConfig,
    pub video: VideoConfig,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TileConfig {
    /// Base URLs; tiles are requested as `<mirror>/<z>/<x>/<y>.png`.
    pub mirrors: Vec<String>,
    /// Per-tile timeout, 1000..=2000.
    pub timeout_ms: u64,
    /// Web-Mercator zoom level of the thumbnail.
    pub zoom: u8,
    pub user_agent: String,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            mirrors: DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect(),
            timeout_ms: DEFAULT_TILE_TIMEOUT.as_millis() as u64,
            zoom: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TileConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FooterConfig {
    /// Drawn at the bottom-right of the map thumbnail.
    pub watermark: String,
    /// Offset of the displayed clock from UTC.
    pub utc_offset_minutes: i32,
    /// Font for footer text; the system sans-serif face when absent.
    pub font_path: Option<PathBuf>,
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            watermark: "GeoCam".to_string(),
            utc_offset_minutes: 330,
            font_path: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotoConfig {
    /// 1..=100.
    pub jpeg_quality: u8,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    pub fps: u32,
    pub bitrate_bps: u32,
    /// Preference order; the first one ffmpeg can encode wins.
    pub codecs: Vec<VideoCodec>,
    /// Live audio to mux when the camera offers none.
    pub audio: Option<AudioInput>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            bitrate_bps: DEFAULT_BITRATE_BPS,
            codecs: DEFAULT_CODEC_PREFERENCE.to_vec(),
            audio: None,
        }
    }
}

impl GeoCamConfig {
    /// Parse and [`validate`](Self::validate) a JSON document.
    pub fn from_json_str(s: &str) -> GeoCamResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| GeoCamError::serde(format!("config json parse failed: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate the JSON file at `path`.
    pub fn load(path: &Path) -> GeoCamResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Reject out-of-range values before any pipeline is built from them.
    pub fn validate(&self) -> GeoCamResult<()> {
        if self.tiles.mirrors.is_empty() {
            return Err(GeoCamError::validation("tiles.mirrors must not be empty"));
        }
        for m in &self.tiles.mirrors {
            if !(m.starts_with("https://") || m.starts_with("http://")) {
                return Err(GeoCamError::validation(format!(
                    "tile mirror '{m}' must be an http(s) URL"
                )));
            }
        }
        let timeout = self.tiles.timeout();
        if !(MIN_TILE_TIMEOUT..=MAX_TILE_TIMEOUT).contains(&timeout) {
            return Err(GeoCamError::validation(format!(
                "tiles.timeout_ms must be in {}..={}",
                MIN_TILE_TIMEOUT.as_millis(),
                MAX_TILE_TIMEOUT.as_millis()
            )));
        }
        validate_zoom(self.tiles.zoom)?;
        self.utc_offset()?;
        if !(1..=100).contains(&self.photo.jpeg_quality) {
            return Err(GeoCamError::validation("photo.jpeg_quality must be in 1..=100"));
        }
        if self.video.fps == 0 || self.video.bitrate_bps == 0 {
            return Err(GeoCamError::validation(
                "video.fps and video.bitrate_bps must be > 0",
            ));
        }
        if self.video.codecs.is_empty() {
            return Err(GeoCamError::validation("video.codecs must not be empty"));
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> GeoCamResult<FixedOffset> {
        FixedOffset::east_opt(self.footer.utc_offset_minutes * 60)
            .ok_or_else(|| GeoCamError::validation("footer.utc_offset_minutes out of range"))
    }

    pub fn footer_style(&self) -> GeoCamResult<FooterStyle> {
        Ok(FooterStyle {
            watermark: self.footer.watermark.clone(),
            utc_offset: self.utc_offset()?,
            zoom: self.tiles.zoom,
        })
    }

    /// Video section as recorder settings.
    pub fn recorder_settings(&self) -> RecorderSettings {
        RecorderSettings {
            fps: self.video.fps,
            bitrate_bps: self.video.bitrate_bps,
            codecs: self.video.codecs.clone(),
            audio: self.video.audio.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
