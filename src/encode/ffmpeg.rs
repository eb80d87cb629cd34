use std::io::Write as _;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{EncodedStream, EncoderFactory, StreamConfig, StreamEncoder, VideoCodec};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::render::raster::Raster;

type ReaderHandle = JoinHandle<std::io::Result<Vec<u8>>>;

/// Opens [`FfmpegStreamEncoder`]s against the `ffmpeg` binary at `program`.
#[derive(Clone, Debug)]
pub struct FfmpegEncoderFactory {
    program: String,
}

impl Default for FfmpegEncoderFactory {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }
}

impl FfmpegEncoderFactory {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Encoder names listed by `ffmpeg -encoders`.
    pub fn available_encoders(&self) -> GeoCamResult<Vec<String>> {
        let out = Command::new(&self.program)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                GeoCamError::encode(format!(
                    "failed to run '{}' (is it installed and on PATH?): {e}",
                    self.program
                ))
            })?;
        if !out.status.success() {
            return Err(GeoCamError::encode(format!(
                "'{} -encoders' exited with status {}",
                self.program, out.status
            )));
        }
        Ok(parse_encoder_list(&String::from_utf8_lossy(&out.stdout)))
    }
}

/// Encoder names from `ffmpeg -encoders` output, skipping the legend above the `------` line.
pub(crate) fn parse_encoder_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("------"))
        .skip(1)
        .filter_map(|l| {
            let mut cols = l.split_whitespace();
            let _flags = cols.next()?;
            cols.next().map(str::to_string)
        })
        .collect()
}

/// First codec in `preference` whose video and audio encoders are both in `encoders`.
pub(crate) fn first_supported(
    preference: &[VideoCodec],
    encoders: &[String],
) -> Option<VideoCodec> {
    let has = |name: &str| encoders.iter().any(|e| e == name);
    preference
        .iter()
        .copied()
        .find(|c| has(c.video_encoder()) && has(c.audio_encoder()))
}

impl EncoderFactory for FfmpegEncoderFactory {
    type Encoder = FfmpegStreamEncoder;

    fn select_codec(&self, preference: &[VideoCodec]) -> GeoCamResult<VideoCodec> {
        let encoders = self.available_encoders()?;
        let codec = first_supported(preference, &encoders).ok_or_else(|| {
            GeoCamError::encode("ffmpeg supports none of the requested recording formats")
        })?;
        tracing::debug!(?codec, mime = codec.mime(), "recording format selected");
        Ok(codec)
    }

    fn open(&self, cfg: StreamConfig) -> GeoCamResult<Self::Encoder> {
        FfmpegStreamEncoder::spawn(&self.program, cfg)
    }
}

/// Streams opaque RGBA frames into `ffmpeg` and collects the muxed container from its stdout.
pub struct FfmpegStreamEncoder {
    cfg: StreamConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout_reader: Option<ReaderHandle>,
    stderr_drain: Option<ReaderHandle>,
    scratch: Vec<u8>,
}

impl std::fmt::Debug for FfmpegStreamEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegStreamEncoder")
            .field("cfg", &self.cfg)
            .field("pid", &self.child.id())
            .finish_non_exhaustive()
    }
}

/// Full ffmpeg argument list for `cfg`, reading frames from stdin and writing to stdout.
pub(crate) fn ffmpeg_args(cfg: &StreamConfig) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(format!("{}x{}", cfg.width, cfg.height));
    args.extend(["-r".to_string(), cfg.fps.to_string()]);
    args.extend(["-i".to_string(), "pipe:0".to_string()]);

    let codec = cfg.codec;
    if let Some(audio) = cfg.audio.as_ref() {
        if let Some(format) = audio.format.as_ref() {
            args.extend(["-f".to_string(), format.clone()]);
        }
        args.extend(["-i".to_string(), audio.source.clone()]);
        args.extend(
            ["-map", "0:v", "-map", "1:a?", "-c:a", codec.audio_encoder(), "-shortest"]
                .iter()
                .map(|s| s.to_string()),
        );
    } else {
        args.push("-an".to_string());
    }

    args.extend(["-c:v".to_string(), codec.video_encoder().to_string()]);
    args.extend(["-b:v".to_string(), cfg.bitrate_bps.to_string()]);
    args.extend(["-pix_fmt".to_string(), "yuv420p".to_string()]);
    match codec {
        VideoCodec::WebmVp9Opus | VideoCodec::WebmVp8Opus => {
            args.extend(["-deadline", "realtime", "-cpu-used", "8"].map(String::from));
        }
        // mp4 needs a fragmented layout to stream to a pipe.
        VideoCodec::Mp4H264Aac => {
            args.extend(["-movflags", "frag_keyframe+empty_moov"].map(String::from));
        }
    }
    args.extend(["-f".to_string(), codec.container().to_string()]);
    args.push("pipe:1".to_string());
    args
}

impl FfmpegStreamEncoder {
    pub fn spawn(program: &str, cfg: StreamConfig) -> GeoCamResult<Self> {
        cfg.validate()?;

        let mut child = Command::new(program)
            .args(ffmpeg_args(&cfg))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                GeoCamError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GeoCamError::encode("failed to open ffmpeg stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GeoCamError::encode("failed to open ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| GeoCamError::encode("failed to open ffmpeg stderr"))?;

        let stdout_reader = spawn_reader(stdout);
        let stderr_drain = spawn_reader(stderr);

        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            fps = cfg.fps,
            codec = cfg.codec.video_encoder(),
            audio = cfg.audio.is_some(),
            "ffmpeg encoder started"
        );

        Ok(Self {
            scratch: vec![0u8; cfg.width as usize * cfg.height as usize * 4],
            cfg,
            child,
            stdin: Some(stdin),
            stdout_reader: Some(stdout_reader),
            stderr_drain: Some(stderr_drain),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.cfg
    }
}

fn spawn_reader(mut pipe: impl std::io::Read + Send + 'static) -> ReaderHandle {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        pipe.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn join_reader(handle: Option<ReaderHandle>, what: &str) -> GeoCamResult<Vec<u8>> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| GeoCamError::encode(format!("ffmpeg {what} reader thread panicked")))?
            .map_err(|e| GeoCamError::encode(format!("ffmpeg {what} read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

impl StreamEncoder for FfmpegStreamEncoder {
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
        // ffmpeg reads straight rgba; flatten premultiplied pixels over black.
        frame.flatten_into(&mut self.scratch, Rgba8::rgb(0, 0, 0))?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(GeoCamError::encode("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            GeoCamError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn finish(mut self) -> GeoCamResult<EncodedStream> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| GeoCamError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let bytes = join_reader(self.stdout_reader.take(), "stdout")?;
        let stderr = join_reader(self.stderr_drain.take(), "stderr")?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(GeoCamError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }
        tracing::debug!(bytes = bytes.len(), "ffmpeg encoder finished");
        Ok(EncodedStream {
            bytes,
            mime: self.cfg.codec.mime().to_string(),
        })
    }
}

impl Drop for FfmpegStreamEncoder {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            // Abandoned mid-stream.
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Returns true if `ffmpeg -version` runs successfully.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
