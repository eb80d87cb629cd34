use std::future::Future;
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use anyhow::Context as _;

use crate::assets::decode::decode_image;
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::render::raster::Raster;

/// One decoded camera frame at native resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    pub raster: Raster,
}

impl VideoFrame {
    pub fn new(raster: Raster) -> Self {
        Self { raster }
    }

    /// From straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> GeoCamResult<Self> {
        if width == 0 || height == 0 {
            return Err(GeoCamError::device("camera frame has zero size"));
        }
        Ok(Self::new(Raster::from_straight_rgba8(width, height, rgba)?))
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }
}

/// An ffmpeg input carrying live or recorded audio.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AudioInput {
    /// ffmpeg `-i` argument: a file path or a device name.
    pub source: String,
    /// ffmpeg `-f` demuxer (e.g. `pulse`, `alsa`); `None` for files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl AudioInput {
    /// Audio track of a media file.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            source: path.as_ref().display().to_string(),
            format: None,
        }
    }

    /// Live capture device, e.g. `("pulse", "default")`.
    pub fn device(format: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: name.into(),
            format: Some(format.into()),
        }
    }
}

/// Live picture source.
pub trait CameraSource {
    fn is_active(&self) -> bool;

    /// Wait for the next decodable frame.
    fn next_frame(&mut self) -> impl Future<Output = GeoCamResult<VideoFrame>>;

    fn audio_input(&self) -> Option<AudioInput>;
}

/// A camera that keeps showing one still image.
/// Repeats one frame forever; always active.
#[derive(Clone, Debug)]
pub struct StillImageCamera {
    frame: VideoFrame,
    audio: Option<AudioInput>,
}

impl StillImageCamera {
    pub fn new(frame: VideoFrame) -> Self {
        Self { frame, audio: None }
    }

    pub fn open(path: &Path) -> GeoCamResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        let raster = decode_image(&bytes)?;
        Ok(Self::new(VideoFrame::new(raster)))
    }

    pub fn with_audio(mut self, audio: AudioInput) -> Self {
        self.audio = Some(audio);
        self
    }
}

impl CameraSource for StillImageCamera {
    fn is_active(&self) -> bool {
        true
    }

    async fn next_frame(&mut self) -> GeoCamResult<VideoFrame> {
        Ok(self.frame.clone())
    }

    fn audio_input(&self) -> Option<AudioInput> {
        self.audio.clone()
    }
}

/// Stream metadata reported by `ffprobe`.
/// Stream facts read by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub has_audio: bool,
}

/// Probe a video file through `ffprobe`.
pub fn probe_video(source_path: &Path) -> GeoCamResult<VideoSourceInfo> {
    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(source_path)
        .output()
        .map_err(|e| GeoCamError::device(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(GeoCamError::device(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_output(source_path, &out.stdout)
}

pub(crate) fn parse_probe_output(
    source_path: &Path,
    json: &[u8],
) -> GeoCamResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| GeoCamError::serde(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| GeoCamError::device("no video stream found"))?;
    let (Some(width), Some(height)) = (video.width, video.height) else {
        return Err(GeoCamError::device("missing video width/height from ffprobe"));
    };
    let frame_rate = video
        .r_frame_rate
        .as_deref()
        .and_then(parse_rational)
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(30.0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        frame_rate,
        has_audio,
    })
}

fn parse_rational(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((n, d)) => {
            let d: f64 = d.trim().parse().ok()?;
            (d != 0.0).then_some(n.trim().parse::<f64>().ok()? / d)
        }
        None => s.trim().parse().ok(),
    }
}

/// Plays a video file as a camera, decoding frames through the system `ffmpeg`.
///
/// A helper thread reads raw RGBA frames from ffmpeg's stdout into a small bounded channel;
/// the file's audio track, if any, is offered as the audio input.
pub struct VideoFileCamera {
    info: VideoSourceInfo,
    child: Child,
    frames: tokio::sync::mpsc::Receiver<VideoFrame>,
    reader: Option<std::thread::JoinHandle<()>>,
    ended: bool,
}

impl VideoFileCamera {
    pub fn open(path: &Path) -> GeoCamResult<Self> {
        let info = probe_video(path)?;
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(&info.source_path)
            .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                GeoCamError::device(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| GeoCamError::device("failed to open ffmpeg stdout (unexpected)"))?;

        let (tx, rx) = tokio::sync::mpsc::channel(4);
        let (w, h) = (info.width, info.height);
        let frame_len = w as usize * h as usize * 4;
        let reader = std::thread::spawn(move || {
            let mut buf = vec![0u8; frame_len];
            loop {
                if let Err(e) = stdout.read_exact(&mut buf) {
                    if e.kind() != std::io::ErrorKind::UnexpectedEof {
                        tracing::warn!(error = %e, "video decode read failed");
                    }
                    break;
                }
                let frame = match VideoFrame::from_rgba8(w, h, &buf) {
                    Ok(f) => f,
                    Err(err) => {
                        tracing::warn!(error = %err, "dropping undecodable frame");
                        continue;
                    }
                };
                if tx.blocking_send(frame).is_err() {
                    break;
                }
            }
        });

        tracing::info!(
            path = %info.source_path.display(),
            width = info.width,
            height = info.height,
            fps = info.frame_rate,
            has_audio = info.has_audio,
            "video file camera opened"
        );
        Ok(Self {
            info,
            child,
            frames: rx,
            reader: Some(reader),
            ended: false,
        })
    }

    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }
}

impl CameraSource for VideoFileCamera {
    fn is_active(&self) -> bool {
        !self.ended
    }

    async fn next_frame(&mut self) -> GeoCamResult<VideoFrame> {
        match self.frames.recv().await {
            Some(frame) => Ok(frame),
            None => {
                self.ended = true;
                Err(GeoCamError::device("video source ended"))
            }
        }
    }

    fn audio_input(&self) -> Option<AudioInput> {
        self.info
            .has_audio
            .then(|| AudioInput::file(&self.info.source_path))
    }
}

impl Drop for VideoFileCamera {
    fn drop(&mut self) {
        self.frames.close();
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sources/camera.rs"]
mod tests;
