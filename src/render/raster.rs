use crate::foundation::core::Rgba8;
use crate::foundation::error::{GeoCamError, GeoCamResult};
use crate::foundation::math::{mul_div255_u16, over_premul, unpremul_rgba8};

/// Premultiplied RGBA8 pixel surface, row-major, no padding.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Raster {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
        }
    }

    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        let mut out = Self::new(width, height);
        out.fill(color);
        out
    }

    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> GeoCamResult<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(GeoCamError::validation(format!(
                "raster byte length {} does not match {width}x{height} rgba8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build from straight-alpha RGBA8 bytes (the layout cameras and decoders hand out).
    pub fn from_straight_rgba8(width: u32, height: u32, rgba: &[u8]) -> GeoCamResult<Self> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(GeoCamError::validation(format!(
                "rgba8 byte length {} does not match {width}x{height}",
                rgba.len()
            )));
        }
        let mut data = rgba.to_vec();
        for px in data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 255 {
                continue;
            }
            for c in px.iter_mut().take(3) {
                *c = mul_div255_u16(u16::from(*c), a) as u8;
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub(crate) fn from_pixmap(pixmap: &vello_cpu::Pixmap) -> Self {
        Self {
            width: u32::from(pixmap.width()),
            height: u32::from(pixmap.height()),
            data: pixmap.data_as_u8_slice().to_vec(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn fill(&mut self, color: Rgba8) {
        let px = color.premul();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Blend `color` over the clipped rectangle.
    pub fn fill_rect_over(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgba8) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) else {
            return;
        };
        let src = color.premul();
        for py in y0..y1 {
            for px in x0..x1 {
                let i = self.index(px, py);
                let d = [
                    self.data[i],
                    self.data[i + 1],
                    self.data[i + 2],
                    self.data[i + 3],
                ];
                self.data[i..i + 4].copy_from_slice(&over_premul(d, src));
            }
        }
    }

    /// Copy `src` with its top-left at (`dx`, `dy`), replacing covered pixels.
    pub fn copy_from(&mut self, src: &Raster, dx: i64, dy: i64) {
        let Some((x0, y0, x1, y1)) = self.clip(dx, dy, src.width, src.height) else {
            return;
        };
        let row_bytes = (x1 - x0) as usize * 4;
        for py in y0..y1 {
            let sy = (i64::from(py) - dy) as u32;
            let sx = (i64::from(x0) - dx) as u32;
            let si = src.index(sx, sy);
            let di = self.index(x0, py);
            self.data[di..di + row_bytes].copy_from_slice(&src.data[si..si + row_bytes]);
        }
    }

    /// Source-over composite of `src` with its top-left at (`dx`, `dy`).
    pub fn draw_over(&mut self, src: &Raster, dx: i64, dy: i64) {
        let Some((x0, y0, x1, y1)) = self.clip(dx, dy, src.width, src.height) else {
            return;
        };
        for py in y0..y1 {
            let sy = (i64::from(py) - dy) as u32;
            for px in x0..x1 {
                let sx = (i64::from(px) - dx) as u32;
                let si = src.index(sx, sy);
                let s = [
                    src.data[si],
                    src.data[si + 1],
                    src.data[si + 2],
                    src.data[si + 3],
                ];
                if s[3] == 0 {
                    continue;
                }
                let di = self.index(px, py);
                let d = [
                    self.data[di],
                    self.data[di + 1],
                    self.data[di + 2],
                    self.data[di + 3],
                ];
                self.data[di..di + 4].copy_from_slice(&over_premul(d, s));
            }
        }
    }

    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            out.extend_from_slice(&unpremul_rgba8([px[0], px[1], px[2], px[3]]));
        }
        out
    }

    /// Flatten over an opaque background into `dst` (opaque RGBA8, same length as the raster).
    pub fn flatten_into(&self, dst: &mut [u8], bg: Rgba8) -> GeoCamResult<()> {
        if dst.len() != self.data.len() {
            return Err(GeoCamError::validation(
                "flatten_into expects a buffer of width*height*4 bytes",
            ));
        }
        for (d, s) in dst.chunks_exact_mut(4).zip(self.data.chunks_exact(4)) {
            d.copy_from_slice(&flatten_px([s[0], s[1], s[2], s[3]], bg));
        }
        Ok(())
    }

    /// Opaque RGB8 bytes over `bg`, as needed by JPEG encoding.
    pub fn to_rgb8(&self, bg: Rgba8) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for s in self.data.chunks_exact(4) {
            out.extend_from_slice(&flatten_px([s[0], s[1], s[2], s[3]], bg)[..3]);
        }
        out
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn clip(&self, x: i64, y: i64, w: u32, h: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(w)).min(i64::from(self.width));
        let y1 = (y + i64::from(h)).min(i64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

fn flatten_px(s: [u8; 4], bg: Rgba8) -> [u8; 4] {
    let a = u16::from(s[3]);
    if a == 255 {
        return s;
    }
    let inv = 255u16 - a;
    let mix = |c: u8, b: u8| (u16::from(c) + mul_div255_u16(u16::from(b), inv)).min(255) as u8;
    [mix(s[0], bg.r), mix(s[1], bg.g), mix(s[2], bg.b), 255]
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
