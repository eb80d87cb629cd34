use super::*;

#[test]
fn from_straight_premultiplies_non_opaque_pixels() {
    let r = Raster::from_straight_rgba8(2, 1, &[255, 0, 0, 255, 200, 100, 50, 128]).unwrap();
    assert_eq!(r.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(
        r.pixel(1, 0),
        Some([
            ((200u16 * 128 + 127) / 255) as u8,
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            128
        ])
    );
}

#[test]
fn byte_length_mismatch_is_rejected() {
    assert!(Raster::from_premul(2, 2, vec![0; 15]).is_err());
    assert!(Raster::from_straight_rgba8(1, 1, &[0; 3]).is_err());
}

#[test]
fn copy_from_clips_negative_offsets() {
    let mut dst = Raster::new(4, 4);
    let src = Raster::filled(3, 3, Rgba8::rgb(9, 9, 9));
    dst.copy_from(&src, -2, -2);
    assert_eq!(dst.pixel(0, 0), Some([9, 9, 9, 255]));
    assert_eq!(dst.pixel(1, 0), Some([0, 0, 0, 0]));
    assert_eq!(dst.pixel(0, 1), Some([0, 0, 0, 0]));
}

#[test]
fn copy_from_fully_outside_is_noop() {
    let mut dst = Raster::new(4, 4);
    let src = Raster::filled(2, 2, Rgba8::rgb(1, 2, 3));
    dst.copy_from(&src, 10, 0);
    dst.copy_from(&src, 0, -2);
    assert!(dst.data().iter().all(|&b| b == 0));
}

#[test]
fn draw_over_skips_transparent_source_pixels() {
    let mut dst = Raster::filled(2, 1, Rgba8::rgb(0, 0, 255));
    let src = Raster::from_premul(2, 1, vec![255, 0, 0, 255, 0, 0, 0, 0]).unwrap();
    dst.draw_over(&src, 0, 0);
    assert_eq!(dst.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(dst.pixel(1, 0), Some([0, 0, 255, 255]));
}

#[test]
fn fill_rect_over_blends_only_inside_rect() {
    let mut r = Raster::filled(4, 2, Rgba8::rgb(255, 255, 255));
    r.fill_rect_over(1, 0, 2, 1, Rgba8::rgba(0, 0, 0, 217));
    assert_eq!(r.pixel(0, 0), Some([255, 255, 255, 255]));
    let darkened = r.pixel(1, 0).unwrap();
    assert!(darkened[0] < 50);
    assert_eq!(darkened[3], 255);
    assert_eq!(r.pixel(1, 1), Some([255, 255, 255, 255]));
}

#[test]
fn to_rgb8_flattens_transparency_over_background() {
    let r = Raster::new(1, 1);
    assert_eq!(r.to_rgb8(Rgba8::rgb(10, 20, 30)), vec![10, 20, 30]);
}

#[test]
fn to_rgb8_agrees_with_flatten_into() {
    let r = Raster::from_straight_rgba8(2, 1, &[200, 100, 50, 128, 1, 2, 3, 255]).unwrap();
    let bg = Rgba8::rgb(0, 40, 80);
    let mut rgba = vec![0u8; 8];
    r.flatten_into(&mut rgba, bg).unwrap();
    assert_eq!(r.to_rgb8(bg), [&rgba[0..3], &rgba[4..7]].concat());
    assert!(r.flatten_into(&mut [0u8; 4], bg).is_err());
}
