use std::future::Future;

use chrono::{DateTime, Utc};

use crate::capture::CaptureRig;
use crate::capture::clock::FrameClock;
use crate::encode::sink::{
    DEFAULT_CODEC_PREFERENCE, EncoderFactory, StreamConfig, StreamEncoder, VideoCodec,
};
use crate::footer::compositor::ThumbnailMode;
use crate::footer::layout::footer_height;
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::map::cache::ThumbnailCache;
use crate::render::raster::Raster;
use crate::render::text::TextRenderer;
use crate::sources::camera::{AudioInput, CameraSource, VideoFrame};
use crate::sources::gallery::{CapturedMediaItem, GallerySink, MediaKind};
use crate::sources::location::{AddressProvider, LocationProvider};
use crate::sources::status::{Status, StatusSink};
use crate::tiles::source::TileSource;

pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_BITRATE_BPS: u32 = 2_500_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopping,
}

/// What one [`VideoRecorder::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not recording; nothing drawn.
    Idle,
    /// A stamped frame went to the encoder.
    Encoded,
    /// No frame this tick; the recording continues.
    Skipped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecorderSettings {
    pub fps: u32,
    pub bitrate_bps: u32,
    /// Tried in order; the first one the encoder factory supports is used.
    pub codecs: Vec<VideoCodec>,
    /// Muxed when the camera offers no audio of its own.
    pub audio: Option<AudioInput>,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            bitrate_bps: DEFAULT_BITRATE_BPS,
            codecs: DEFAULT_CODEC_PREFERENCE.to_vec(),
            audio: None,
        }
    }
}

struct Session<E> {
    encoder: E,
    surface: Raster,
    frame_width: u32,
    frame_height: u32,
    footer_height: u32,
    /// Frame read by `start` for sizing; encoded by the first tick.
    pending: Option<VideoFrame>,
    cache: ThumbnailCache,
    codec: VideoCodec,
    frames: u64,
}

/// Records stamped frames: `Idle -> Recording -> Stopping -> Idle`.
///
/// The surface and thumbnail cache live in the session, so they exist only while recording.
pub struct VideoRecorder<F: EncoderFactory> {
    factory: F,
    settings: RecorderSettings,
    state: RecorderState,
    session: Option<Session<F::Encoder>>,
}

impl<F: EncoderFactory> VideoRecorder<F> {
    pub fn new(factory: F, settings: RecorderSettings) -> Self {
        Self {
            factory,
            settings,
            state: RecorderState::Idle,
            session: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Thumbnail cache of the running session.
    pub fn cache(&self) -> Option<&ThumbnailCache> {
        self.session.as_ref().map(|s| &s.cache)
    }

    /// Frames pushed to the encoder in the running session.
    pub fn frames_encoded(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.frames)
    }

    pub fn codec(&self) -> Option<VideoCodec> {
        self.session.as_ref().map(|s| s.codec)
    }

    /// Size of the encoded frames, `(width, height)`.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.session
            .as_ref()
            .map(|s| (s.surface.width(), s.surface.height()))
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub async fn start<C, L, A, S, T, N>(
        &mut self,
        rig: &mut CaptureRig<C, L, A, S, T>,
        status: &N,
    ) -> GeoCamResult<()>
    where
        C: CameraSource,
        L: LocationProvider,
        A: AddressProvider,
        S: TileSource,
        T: TextRenderer,
        N: StatusSink,
    {
        if self.state != RecorderState::Idle {
            return Err(GeoCamError::validation("recorder is already running"));
        }
        match self.open_session(rig).await {
            Ok(session) => {
                tracing::info!(
                    width = session.surface.width(),
                    height = session.surface.height(),
                    codec = session.codec.mime(),
                    "recording started"
                );
                self.session = Some(session);
                self.state = RecorderState::Recording;
                status.notify(Status::Recording);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "recording could not start");
                status.notify(Status::RecordingFailed);
                status.notify(Status::Error(err.to_string()));
                Err(err)
            }
        }
    }

    async fn open_session<C, L, A, S, T>(
        &self,
        rig: &mut CaptureRig<C, L, A, S, T>,
    ) -> GeoCamResult<Session<F::Encoder>>
    where
        C: CameraSource,
        L: LocationProvider,
        A: AddressProvider,
        S: TileSource,
        T: TextRenderer,
    {
        if !rig.camera.is_active() {
            return Err(GeoCamError::device("camera is not active"));
        }
        let first = rig.camera.next_frame().await?;
        let (w, h) = (first.width(), first.height());
        let footer_h = footer_height(w);
        let (sw, sh) = (round_up_even(w), round_up_even(h + footer_h));

        let codec = self.factory.select_codec(&self.settings.codecs)?;
        let encoder = self.factory.open(StreamConfig {
            width: sw,
            height: sh,
            fps: self.settings.fps,
            bitrate_bps: self.settings.bitrate_bps,
            codec,
            audio: rig
                .camera
                .audio_input()
                .or_else(|| self.settings.audio.clone()),
        })?;

        Ok(Session {
            encoder,
            surface: Raster::new(sw, sh),
            frame_width: w,
            frame_height: h,
            footer_height: footer_h,
            pending: Some(first),
            cache: ThumbnailCache::new(),
            codec,
            frames: 0,
        })
    }

    /// One frame step: draw the current camera frame and footer, then encode the surface.
    ///
    /// The first tick encodes the frame `start` read. Camera failures and frames whose size
    /// differs from the session's are skipped; drawing failures fall back locally. An encoder
    /// failure ends the recording without an artifact.
    pub async fn tick<C, L, A, S, T, N>(
        &mut self,
        rig: &mut CaptureRig<C, L, A, S, T>,
        now: DateTime<Utc>,
        status: &N,
    ) -> GeoCamResult<TickOutcome>
    where
        C: CameraSource,
        L: LocationProvider,
        A: AddressProvider,
        S: TileSource,
        T: TextRenderer,
        N: StatusSink,
    {
        if self.state != RecorderState::Recording {
            return Ok(TickOutcome::Idle);
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(TickOutcome::Idle);
        };

        let frame = match session.pending.take() {
            Some(frame) => frame,
            None => match rig.camera.next_frame().await {
                Ok(frame) => frame,
                Err(err) => {
                    tracing::debug!(error = %err, "no camera frame, skipping tick");
                    return Ok(TickOutcome::Skipped);
                }
            },
        };
        if (frame.width(), frame.height()) != (session.frame_width, session.frame_height) {
            tracing::debug!(
                width = frame.width(),
                height = frame.height(),
                expected_width = session.frame_width,
                expected_height = session.frame_height,
                "camera frame size changed mid-recording, skipping"
            );
            return Ok(TickOutcome::Skipped);
        }

        session.surface.clear();
        rig.stamp(
            &mut session.surface,
            &frame.raster,
            session.footer_height,
            now,
            ThumbnailMode::Cached(&mut session.cache),
        )
        .await;

        if let Err(err) = session.encoder.push_frame(&session.surface) {
            tracing::warn!(
                error = %err,
                frames = session.frames,
                "encoder failed, recording dropped"
            );
            self.session = None;
            self.state = RecorderState::Idle;
            status.notify(Status::RecordingFailed);
            status.notify(Status::Error(err.to_string()));
            return Err(err);
        }
        session.frames += 1;
        Ok(TickOutcome::Encoded)
    }

    /// Finalize the recording and hand the video to `gallery`.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn stop<G, N>(
        &mut self,
        gallery: &mut G,
        status: &N,
    ) -> GeoCamResult<CapturedMediaItem>
    where
        G: GallerySink,
        N: StatusSink,
    {
        if self.state != RecorderState::Recording {
            return Err(GeoCamError::validation("recorder is not recording"));
        }
        self.state = RecorderState::Stopping;
        let Some(mut session) = self.session.take() else {
            self.state = RecorderState::Idle;
            return Err(GeoCamError::validation("recorder has no active session"));
        };
        session.cache.clear();
        status.notify(Status::Processing);

        let frames = session.frames;
        let encoder = session.encoder;
        let finished = tokio::task::spawn_blocking(move || encoder.finish())
            .await
            .map_err(|e| GeoCamError::encode(format!("encoder finalize task failed: {e}")))
            .and_then(|r| r);
        self.state = RecorderState::Idle;

        match finished {
            Ok(stream) => {
                let item = gallery.add_item(MediaKind::Video, stream.bytes, &stream.mime);
                tracing::info!(
                    url = %item.origin_url,
                    frames,
                    bytes = item.payload.len(),
                    "recording saved"
                );
                status.notify(Status::Ready);
                Ok(item)
            }
            Err(err) => {
                tracing::warn!(error = %err, "recording finalize failed");
                status.notify(Status::RecordingFailed);
                status.notify(Status::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Tick on every clock beat until `stop_signal` resolves or the camera goes inactive,
    /// then [`stop`](Self::stop).
    ///
    /// The stop branch is polled first, so no frame is drawn once a stop has been requested.
    pub async fn run<C, L, A, S, T, K, G, N>(
        &mut self,
        rig: &mut CaptureRig<C, L, A, S, T>,
        clock: &mut K,
        stop_signal: impl Future<Output = ()>,
        gallery: &mut G,
        status: &N,
    ) -> GeoCamResult<CapturedMediaItem>
    where
        C: CameraSource,
        L: LocationProvider,
        A: AddressProvider,
        S: TileSource,
        T: TextRenderer,
        K: FrameClock,
        G: GallerySink,
        N: StatusSink,
    {
        tokio::pin!(stop_signal);
        loop {
            tokio::select! {
                biased;
                () = &mut stop_signal => break,
                now = clock.tick() => {
                    self.tick(rig, now, status).await?;
                    if !rig.camera.is_active() {
                        tracing::info!("camera went inactive, stopping");
                        break;
                    }
                }
            }
        }
        self.stop(gallery, status).await
    }
}

fn round_up_even(v: u32) -> u32 {
    v + (v & 1)
}

#[cfg(test)]
#[path = "../../tests/unit/capture/video.rs"]
mod tests;
