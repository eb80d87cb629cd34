use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use chrono::{TimeDelta, TimeZone as _};

use super::*;
use crate::capture::clock::SteppedClock;
use crate::encode::sink::{InMemoryEncoderFactory, RAW_RGBA_MIME};
use crate::footer::compositor::{FooterCompositor, FooterStyle};
use crate::foundation::core::{AddressResult, GeoFix, Point, Rgba8};
use crate::map::thumbnail::MapRenderer;
use crate::render::canvas::Canvas;
use crate::sources::camera::{AudioInput, StillImageCamera, VideoFrame};
use crate::sources::gallery::SessionGallery;
use crate::tiles::fetcher::TileFetcher;
use crate::tiles::source::OfflineTileSource;

struct SilentText;

impl TextRenderer for SilentText {
    fn measure(&mut self, text: &str, size_px: f32) -> GeoCamResult<f32> {
        Ok(text.len() as f32 * size_px * 0.5)
    }

    fn draw(
        &mut self,
        _canvas: &mut Canvas,
        _text: &str,
        _origin: Point,
        _size_px: f32,
        _color: Rgba8,
    ) -> GeoCamResult<()> {
        Ok(())
    }
}

/// Delivers `left` frames, then reports itself inactive.
struct Countdown {
    left: u32,
}

impl CameraSource for Countdown {
    fn is_active(&self) -> bool {
        self.left > 0
    }

    async fn next_frame(&mut self) -> GeoCamResult<VideoFrame> {
        if self.left == 0 {
            return Err(GeoCamError::device("source ended"));
        }
        self.left -= 1;
        Ok(VideoFrame::new(Raster::filled(16, 16, Rgba8::rgb(9, 9, 9))))
    }

    fn audio_input(&self) -> Option<AudioInput> {
        None
    }
}

type TestRig<C> =
    CaptureRig<C, Option<GeoFix>, Option<AddressResult>, OfflineTileSource, SilentText>;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
}

fn rig<C: CameraSource>(camera: C, fix: Option<GeoFix>) -> TestRig<C> {
    let map = MapRenderer::new(TileFetcher::with_defaults(OfflineTileSource)).unwrap();
    let compositor = FooterCompositor::new(map, SilentText, FooterStyle::default());
    CaptureRig::new(camera, fix, None, compositor)
}

fn still(w: u32, h: u32) -> StillImageCamera {
    StillImageCamera::new(VideoFrame::new(Raster::filled(w, h, Rgba8::rgb(0, 0, 200))))
}

fn recorder(factory: InMemoryEncoderFactory) -> VideoRecorder<InMemoryEncoderFactory> {
    VideoRecorder::new(factory, RecorderSettings::default())
}

#[tokio::test]
async fn start_allocates_an_even_surface() {
    let mut rig = rig(still(41, 31), None);
    let mut rec = recorder(InMemoryEncoderFactory::new());
    let status = RefCell::new(Vec::new());

    rec.start(&mut rig, &status).await.unwrap();

    assert_eq!(rec.state(), RecorderState::Recording);
    assert_eq!(rec.surface_size(), Some((42, 132)));
    assert_eq!(rec.codec(), Some(VideoCodec::WebmVp9Opus));
    assert!(rec.cache().is_some_and(|c| c.is_empty()));
    assert_eq!(status.into_inner(), vec![Status::Recording]);
    assert!(rec.start(&mut rig, &RefCell::new(Vec::new())).await.is_err());
}

#[tokio::test]
async fn tick_does_nothing_while_idle() {
    let mut rig = rig(still(16, 16), None);
    let mut rec = recorder(InMemoryEncoderFactory::new());
    let status = RefCell::new(Vec::new());
    assert_eq!(
        rec.tick(&mut rig, now(), &status).await.unwrap(),
        TickOutcome::Idle
    );
    assert!(status.into_inner().is_empty());
}

#[tokio::test]
async fn ticks_then_stop_deliver_one_video() {
    let fix = GeoFix::new(28.6139, 77.209, now()).unwrap();
    let mut rig = rig(still(400, 300), Some(fix));
    let mut rec = recorder(InMemoryEncoderFactory::new());
    let mut gallery = SessionGallery::new();
    let status = RefCell::new(Vec::new());

    rec.start(&mut rig, &status).await.unwrap();
    for i in 0..3 {
        let at = now() + TimeDelta::seconds(i);
        assert_eq!(
            rec.tick(&mut rig, at, &status).await.unwrap(),
            TickOutcome::Encoded
        );
    }
    assert_eq!(rec.frames_encoded(), 3);
    let cache = rec.cache().unwrap();
    assert!(cache.key().is_some());
    assert_eq!((cache.misses(), cache.hits()), (1, 2));

    let item = rec.stop(&mut gallery, &status).await.unwrap();
    assert_eq!(rec.state(), RecorderState::Idle);
    assert!(rec.cache().is_none());
    assert_eq!(item.mime, RAW_RGBA_MIME);
    assert_eq!(item.payload.len(), 3 * 400 * 400 * 4);
    assert_eq!(gallery.len(), 1);
    assert_eq!(
        status.into_inner(),
        vec![Status::Recording, Status::Processing, Status::Ready]
    );
}

#[tokio::test]
async fn encoder_failure_drops_the_recording() {
    let mut rig = rig(still(16, 16), None);
    let mut rec = recorder(InMemoryEncoderFactory::failing_after(1));
    let mut gallery = SessionGallery::new();
    let status = RefCell::new(Vec::new());

    rec.start(&mut rig, &status).await.unwrap();
    assert!(rec.tick(&mut rig, now(), &status).await.is_ok());
    let err = rec.tick(&mut rig, now(), &status).await.unwrap_err();
    assert!(matches!(err, GeoCamError::Encode(_)));

    assert_eq!(rec.state(), RecorderState::Idle);
    assert!(rec.cache().is_none());
    assert!(rec.stop(&mut gallery, &status).await.is_err());
    assert!(gallery.is_empty());
    let status = status.into_inner();
    assert_eq!(status[..2], [Status::Recording, Status::RecordingFailed]);
    assert!(matches!(status[2], Status::Error(_)));
}

#[tokio::test]
async fn start_without_an_active_camera_fails() {
    let mut rig = rig(Countdown { left: 0 }, None);
    let mut rec = recorder(InMemoryEncoderFactory::new());
    let status = RefCell::new(Vec::new());
    let err = rec.start(&mut rig, &status).await.unwrap_err();
    assert!(matches!(err, GeoCamError::Device(_)));
    assert_eq!(rec.state(), RecorderState::Idle);
    assert_eq!(status.into_inner()[0], Status::RecordingFailed);
}

#[tokio::test(start_paused = true)]
async fn run_stops_on_request_without_extra_frames() {
    let mut rig = rig(still(16, 16), None);
    let mut rec = recorder(InMemoryEncoderFactory::new());
    let mut gallery = SessionGallery::new();
    let status = RefCell::new(Vec::new());
    let mut clock = SteppedClock::at_fps(now(), 30).unwrap().limit(3);

    rec.start(&mut rig, &status).await.unwrap();
    let stop = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
    };
    let item = rec
        .run(&mut rig, &mut clock, stop, &mut gallery, &status)
        .await
        .unwrap();
    assert_eq!(item.payload.len(), 3 * 16 * 116 * 4);
    assert_eq!(rec.state(), RecorderState::Idle);
}

#[tokio::test]
async fn run_ends_when_the_camera_runs_dry() {
    let mut rig = rig(Countdown { left: 5 }, None);
    let mut rec = recorder(InMemoryEncoderFactory::new());
    let mut gallery = SessionGallery::new();
    let status = RefCell::new(Vec::new());
    let mut clock = SteppedClock::at_fps(now(), 30).unwrap();

    rec.start(&mut rig, &status).await.unwrap();
    let item = rec
        .run(&mut rig, &mut clock, std::future::pending(), &mut gallery, &status)
        .await
        .unwrap();
    assert_eq!(item.payload.len(), 5 * 16 * 116 * 4);
}

/// Plays back a fixed list of frames, then reports itself inactive.
struct Script {
    frames: VecDeque<Raster>,
}

impl Script {
    fn new(frames: impl IntoIterator<Item = Raster>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl CameraSource for Script {
    fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }

    async fn next_frame(&mut self) -> GeoCamResult<VideoFrame> {
        self.frames
            .pop_front()
            .map(VideoFrame::new)
            .ok_or_else(|| GeoCamError::device("source ended"))
    }

    fn audio_input(&self) -> Option<AudioInput> {
        None
    }
}

fn gray(w: u32, h: u32, level: u8) -> Raster {
    Raster::filled(w, h, Rgba8::rgb(level, level, level))
}

#[tokio::test]
async fn every_source_frame_is_encoded_in_order() {
    let mut rig = rig(Script::new((1..=3).map(|l| gray(16, 16, l))), None);
    let mut rec = recorder(InMemoryEncoderFactory::new());
    let mut gallery = SessionGallery::new();
    let status = RefCell::new(Vec::new());
    let mut clock = SteppedClock::at_fps(now(), 30).unwrap();

    rec.start(&mut rig, &status).await.unwrap();
    let item = rec
        .run(&mut rig, &mut clock, std::future::pending(), &mut gallery, &status)
        .await
        .unwrap();

    let frame_bytes = 16 * 116 * 4;
    assert_eq!(item.payload.len(), 3 * frame_bytes);
    for (i, level) in (1u8..=3).enumerate() {
        let at = i * frame_bytes;
        assert_eq!(item.payload[at..at + 4], [level, level, level, 255]);
    }
}

#[tokio::test]
async fn frames_of_a_different_size_are_skipped() {
    let frames = [gray(16, 16, 1), gray(20, 16, 2), gray(16, 12, 3), gray(16, 16, 4)];
    let mut rig = rig(Script::new(frames), None);
    let mut rec = recorder(InMemoryEncoderFactory::new());
    let status = RefCell::new(Vec::new());

    rec.start(&mut rig, &status).await.unwrap();
    let mut outcomes = Vec::new();
    for _ in 0..4 {
        outcomes.push(rec.tick(&mut rig, now(), &status).await.unwrap());
    }
    assert_eq!(
        outcomes,
        [
            TickOutcome::Encoded,
            TickOutcome::Skipped,
            TickOutcome::Skipped,
            TickOutcome::Encoded
        ]
    );
    assert_eq!(rec.frames_encoded(), 2);
    assert_eq!(rec.surface_size(), Some((16, 116)));
}
