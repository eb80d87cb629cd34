//! Photo and video capture pipelines.

pub mod clock;
pub mod photo;
pub mod video;

use chrono::{DateTime, Utc};

use crate::footer::compositor::{FooterCompositor, FooterInputs, ThumbnailMode};
use crate::render::raster::Raster;
use crate::render::text::TextRenderer;
use crate::sources::location::{AddressProvider, LocationProvider};
use crate::tiles::source::TileSource;

/// The devices and renderer shared by both pipelines.
pub struct CaptureRig<C, L, A, S, T> {
    pub camera: C,
    pub location: L,
    pub address: A,
    pub compositor: FooterCompositor<S, T>,
}

impl<C, L, A, S, T> CaptureRig<C, L, A, S, T>
where
    L: LocationProvider,
    A: AddressProvider,
    S: TileSource,
    T: TextRenderer,
{
    pub fn new(camera: C, location: L, address: A, compositor: FooterCompositor<S, T>) -> Self {
        Self {
            camera,
            location,
            address,
            compositor,
        }
    }

    /// Draw `frame` at the top of `surface` and the footer band directly below it.
    ///
    /// Location and address are read fresh on every call.
    pub(crate) async fn stamp(
        &mut self,
        surface: &mut Raster,
        frame: &Raster,
        footer_height: u32,
        now: DateTime<Utc>,
        mode: ThumbnailMode<'_>,
    ) {
        surface.copy_from(frame, 0, 0);
        let fix = self.location.current_fix();
        let address = self.address.current_address();
        let inputs = FooterInputs {
            fix: fix.as_ref(),
            address: address.as_ref(),
            now,
        };
        let h = frame.height();
        self.compositor
            .render_footer(surface, h, h, footer_height, &inputs, mode)
            .await;
    }
}
