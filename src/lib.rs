//! GeoCam overlay engine.
//!
//! Stamps camera stills and live recordings with an information footer: a map thumbnail
//! built from OpenStreetMap tiles, the place name and address, coordinates and local time.
//!
//! The pieces, bottom-up:
//! - [`tiles`] fetches the tile grid around a fix, each tile under its own timeout.
//! - [`map`] stitches tiles into a centered thumbnail with a pin, or draws a placeholder.
//! - [`footer`] lays out and composites the band onto a frame.
//! - [`capture`] runs the photo pipeline and the clock-driven video recorder.
//! - [`encode`] turns recorded frames into a container stream.
#![forbid(unsafe_code)]

pub mod assets;
pub mod capture;
pub mod config;
pub mod encode;
pub mod footer;
pub mod foundation;
pub mod geo;
pub mod map;
pub mod render;
pub mod sources;
pub mod tiles;

pub use capture::CaptureRig;
pub use capture::clock::{FrameClock, IntervalClock, SteppedClock};
pub use capture::video::{RecorderSettings, RecorderState, TickOutcome, VideoRecorder};
pub use config::GeoCamConfig;
pub use encode::ffmpeg::{FfmpegEncoderFactory, FfmpegStreamEncoder};
pub use encode::sink::{
    EncodedStream, EncoderFactory, InMemoryEncoderFactory, StreamConfig, StreamEncoder,
    VideoCodec,
};
pub use footer::compositor::{FooterCompositor, FooterInputs, FooterStyle, ThumbnailMode};
pub use footer::layout::{FooterLayout, footer_height};
pub use foundation::core::{AddressResult, GeoFix, Point, Rect, Rgba8};
pub use foundation::error::{GeoCamError, GeoCamResult};
pub use map::cache::ThumbnailCache;
pub use map::thumbnail::{MapRenderer, MapThumbnail, ThumbnailKey, ThumbnailOrigin};
pub use render::raster::Raster;
pub use render::text::{ParleyText, TextRenderer};
pub use sources::camera::{
    AudioInput, CameraSource, StillImageCamera, VideoFileCamera, VideoFrame,
};
pub use sources::gallery::{CapturedMediaItem, GallerySink, MediaKind, SessionGallery};
pub use sources::location::{AddressProvider, LocationProvider, NominatimGeocoder};
pub use sources::status::{LogStatus, Status, StatusSink};
pub use tiles::fetcher::TileFetcher;
pub use tiles::source::{HttpTileSource, OfflineTileSource, TileSource};
