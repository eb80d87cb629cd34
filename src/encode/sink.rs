use crate::foundation::core::Rgba8;
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::render::raster::Raster;
use crate::sources::camera::AudioInput;

/// Container/codec combinations, in the order the recorder prefers them by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoCodec {
    WebmVp9Opus,
    WebmVp8Opus,
    Mp4H264Aac,
}

pub const DEFAULT_CODEC_PREFERENCE: [VideoCodec; 3] = [
    VideoCodec::WebmVp9Opus,
    VideoCodec::WebmVp8Opus,
    VideoCodec::Mp4H264Aac,
];

impl VideoCodec {
    pub fn mime(self) -> &'static str {
        match self {
            Self::WebmVp9Opus => "video/webm;codecs=vp9,opus",
            Self::WebmVp8Opus => "video/webm;codecs=vp8,opus",
            Self::Mp4H264Aac => "video/mp4",
        }
    }

    /// ffmpeg muxer name.
    pub fn container(self) -> &'static str {
        match self {
            Self::WebmVp9Opus | Self::WebmVp8Opus => "webm",
            Self::Mp4H264Aac => "mp4",
        }
    }

    /// ffmpeg video encoder name.
    pub fn video_encoder(self) -> &'static str {
        match self {
            Self::WebmVp9Opus => "libvpx-vp9",
            Self::WebmVp8Opus => "libvpx",
            Self::Mp4H264Aac => "libx264",
        }
    }

    /// ffmpeg audio encoder name.
    pub fn audio_encoder(self) -> &'static str {
        match self {
            Self::WebmVp9Opus | Self::WebmVp8Opus => "libopus",
            Self::Mp4H264Aac => "aac",
        }
    }
}

/// Parameters for one encoded stream.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_bps: u32,
    pub codec: VideoCodec,
    pub audio: Option<AudioInput>,
}

impl StreamConfig {
    pub fn validate(&self) -> GeoCamResult<()> {
        if self.fps == 0 {
            return Err(GeoCamError::validation("fps must be non-zero"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(GeoCamError::validation("stream width/height must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(GeoCamError::validation(
                "stream width/height must be even (required for yuv420p output)",
            ));
        }
        if self.bitrate_bps == 0 {
            return Err(GeoCamError::validation("bitrate must be non-zero"));
        }
        Ok(())
    }
}

/// A finished recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedStream {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Consumes composited frames in order and produces the final blob.
///
/// `finish` may block; callers run it on the blocking pool.
pub trait StreamEncoder: Send + 'static {
    fn push_frame(&mut self, frame: &Raster) -> GeoCamResult<()>;
    fn finish(self) -> GeoCamResult<EncodedStream>;
}

pub trait EncoderFactory {
    type Encoder: StreamEncoder;

    /// First entry of `preference` this factory can encode.
    fn select_codec(&self, preference: &[VideoCodec]) -> GeoCamResult<VideoCodec>;

    fn open(&self, cfg: StreamConfig) -> GeoCamResult<Self::Encoder>;
}

pub const RAW_RGBA_MIME: &str = "video/x-raw-rgba";

/// Keeps frames as opaque straight RGBA8, concatenated. For tests and dry runs.
#[derive(Debug)]
pub struct InMemoryEncoder {
    cfg: StreamConfig,
    bytes: Vec<u8>,
    frames: u64,
    fail_after: Option<u64>,
}

impl InMemoryEncoder {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn config(&self) -> &StreamConfig {
        &self.cfg
    }
}

impl StreamEncoder for InMemoryEncoder {
    fn push_frame(&mut self, frame: &Raster) -> GeoCamResult<()> {
        if frame.width() != self.cfg.width || frame.height() != self.cfg.height {
            return Err(GeoCamError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.cfg.width,
                self.cfg.height
            )));
        }
        if self.fail_after.is_some_and(|n| self.frames >= n) {
            return Err(GeoCamError::encode("in-memory encoder rejected frame"));
        }
        let start = self.bytes.len();
        self.bytes.resize(start + frame.data().len(), 0);
        frame.flatten_into(&mut self.bytes[start..], Rgba8::rgb(0, 0, 0))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(self) -> GeoCamResult<EncodedStream> {
        Ok(EncodedStream {
            bytes: self.bytes,
            mime: RAW_RGBA_MIME.to_string(),
        })
    }
}

/// Opens [`InMemoryEncoder`]s. Supports every codec.
#[derive(Clone, Debug, Default)]
pub struct InMemoryEncoderFactory {
    fail_after: Option<u64>,
}

impl InMemoryEncoderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoders reject every frame after the first `frames`.
    pub fn failing_after(frames: u64) -> Self {
        Self {
            fail_after: Some(frames),
        }
    }
}

impl EncoderFactory for InMemoryEncoderFactory {
    type Encoder = InMemoryEncoder;

    fn select_codec(&self, preference: &[VideoCodec]) -> GeoCamResult<VideoCodec> {
        preference
            .first()
            .copied()
            .ok_or_else(|| GeoCamError::encode("empty codec preference list"))
    }

    fn open(&self, cfg: StreamConfig) -> GeoCamResult<Self::Encoder> {
        cfg.validate()?;
        Ok(InMemoryEncoder {
            cfg,
            bytes: Vec::new(),
            frames: 0,
            fail_after: self.fail_after,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
