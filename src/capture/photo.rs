use chrono::{DateTime, Utc};

use crate::capture::CaptureRig;
use crate::footer::compositor::ThumbnailMode;
use crate::footer::layout::footer_height;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::render::raster::Raster;
use crate::render::text::TextRenderer;
use crate::sources::camera::CameraSource;
use crate::sources::gallery::{CapturedMediaItem, GallerySink, MediaKind};
use crate::sources::location::{AddressProvider, LocationProvider};
use crate::sources::status::{Status, StatusSink};
use crate::tiles::source::TileSource;

pub const DEFAULT_JPEG_QUALITY: u8 = 95;
pub const PHOTO_MIME: &str = "image/jpeg";

impl<C, L, A, S, T> CaptureRig<C, L, A, S, T>
where
    C: CameraSource,
    L: LocationProvider,
    A: AddressProvider,
    S: TileSource,
    T: TextRenderer,
{
    /// Snapshot one frame, stamp the footer below it and add the JPEG to `gallery`.
    #[tracing::instrument(level = "info", skip_all, fields(quality = jpeg_quality))]
    pub async fn capture_photo<G, N>(
        &mut self,
        gallery: &mut G,
        status: &N,
        jpeg_quality: u8,
        now: DateTime<Utc>,
    ) -> GeoCamResult<CapturedMediaItem>
    where
        G: GallerySink,
        N: StatusSink,
    {
        status.notify(Status::Capturing);
        let encoded = match self.compose_photo(now).await {
            Ok(raster) => encode_jpeg(&raster, jpeg_quality),
            Err(err) => Err(err),
        };
        match encoded {
            Ok(jpeg) => {
                let item = gallery.add_item(MediaKind::Photo, jpeg, PHOTO_MIME);
                tracing::info!(
                    url = %item.origin_url,
                    bytes = item.payload.len(),
                    "photo captured"
                );
                status.notify(Status::Ready);
                Ok(item)
            }
            Err(err) => {
                tracing::warn!(error = %err, "photo capture failed");
                status.notify(Status::CaptureFailed);
                status.notify(Status::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// The stamped still: camera frame at native size with the footer band appended.
    pub async fn compose_photo(&mut self, now: DateTime<Utc>) -> GeoCamResult<Raster> {
        if !self.camera.is_active() {
            return Err(GeoCamError::device("camera is not active"));
        }
        let frame = self.camera.next_frame().await?;
        let (w, h) = (frame.width(), frame.height());
        let footer_h = footer_height(w);
        let mut surface = Raster::new(w, h + footer_h);
        self.stamp(&mut surface, &frame.raster, footer_h, now, ThumbnailMode::Fresh)
            .await;
        Ok(surface)
    }
}

/// Baseline JPEG of `raster` flattened over black.
pub fn encode_jpeg(raster: &Raster, quality: u8) -> GeoCamResult<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(GeoCamError::validation("jpeg quality must be in 1..=100"));
    }
    let rgb = raster.to_rgb8(Rgba8::rgb(0, 0, 0));
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality)
        .encode(
            &rgb,
            raster.width(),
            raster.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| GeoCamError::encode(format!("jpeg encode failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/capture/photo.rs"]
mod tests;
