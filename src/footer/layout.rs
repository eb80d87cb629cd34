/// Footer band height for a surface `width` pixels wide.
pub fn footer_height(width: u32) -> u32 {
    if width < 640 {
        100
    } else if width < 1024 {
        120
    } else {
        140
    }
}

/// Integer pixel box, relative to the footer band's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelBox {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

pub const TITLE_LINE_HEIGHT: f64 = 1.25;
pub const BODY_LINE_HEIGHT: f64 = 1.3;
pub const MIN_MAP_WIDTH: u32 = 16;

/// Footer geometry for one render. All positions are relative to the band.
#[derive(Clone, Debug, PartialEq)]
pub struct FooterLayout {
    pub width: u32,
    pub footer_height: u32,
    pub padding: u32,
    /// `None` when the thumbnail would be narrower than [`MIN_MAP_WIDTH`].
    pub map_box: Option<PixelBox>,
    pub text_x: f64,
    pub text_width: f64,
    pub title_size: f32,
    pub body_size: f32,
    pub watermark_size: f32,
    pub title_line_height: f64,
    pub body_line_height: f64,
    /// Top of the title line box.
    pub title_y: f64,
    /// Tops of the two address lines, the coordinate line and the date/time line.
    pub body_ys: [f64; 4],
}

impl FooterLayout {
    pub fn compute(surface_width: u32, surface_height: u32, footer_height: u32) -> Self {
        let w = f64::from(surface_width);
        let padding = (w * 0.015).round().clamp(8.0, 20.0) as u32;
        let inner_h = footer_height.saturating_sub(2 * padding);

        let cap = if surface_height > surface_width {
            0.40
        } else {
            0.30
        };
        let map_w = ((f64::from(inner_h) * 1.6).round() as u32).min((w * cap).floor() as u32);
        let fits = map_w >= MIN_MAP_WIDTH && inner_h > 0 && map_w + 2 * padding <= surface_width;
        let map_box = fits.then(|| PixelBox {
            x: surface_width - padding - map_w,
            y: padding,
            width: map_w,
            height: inner_h,
        });

        let text_x = f64::from(padding);
        let text_right = match map_box {
            Some(b) => f64::from(b.x.saturating_sub(padding)),
            None => f64::from(surface_width.saturating_sub(padding)),
        };
        let text_width = (text_right - text_x).max(0.0);

        let mut title = (w * 0.02).clamp(13.0, 28.0);
        let mut body = (w * 0.0125).clamp(10.0, 18.0);
        let mut watermark = (w * 0.008).clamp(8.0, 12.0);
        let inner = f64::from(inner_h);
        let block = title * TITLE_LINE_HEIGHT + 4.0 * body * BODY_LINE_HEIGHT;
        if block > inner && block > 0.0 {
            let s = inner / block;
            title *= s;
            body *= s;
            watermark *= s;
        }

        let title_lh = title * TITLE_LINE_HEIGHT;
        let body_lh = body * BODY_LINE_HEIGHT;
        let block = title_lh + 4.0 * body_lh;
        let title_y = f64::from(padding) + ((inner - block) / 2.0).max(0.0);
        let first_body = title_y + title_lh;
        let body_ys = std::array::from_fn(|i| first_body + i as f64 * body_lh);

        Self {
            width: surface_width,
            footer_height,
            padding,
            map_box,
            text_x,
            text_width,
            title_size: title as f32,
            body_size: body as f32,
            watermark_size: watermark as f32,
            title_line_height: title_lh,
            body_line_height: body_lh,
            title_y,
            body_ys,
        }
    }

    /// Bottom edge of the last text line.
    pub fn text_bottom(&self) -> f64 {
        self.body_ys[3] + self.body_line_height
    }
}

#[cfg(test)]
#[path = "../../tests/unit/footer/layout.rs"]
mod tests;
