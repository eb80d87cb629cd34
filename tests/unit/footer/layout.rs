use super::*;

#[test]
fn footer_height_has_three_bands() {
    assert_eq!(footer_height(1), 100);
    assert_eq!(footer_height(639), 100);
    assert_eq!(footer_height(640), 120);
    assert_eq!(footer_height(1023), 120);
    assert_eq!(footer_height(1024), 140);
    assert_eq!(footer_height(7680), 140);
}

#[test]
fn footer_height_is_monotonic() {
    let mut prev = 0;
    for w in (0..4000).step_by(7) {
        let h = footer_height(w);
        assert!(h >= prev);
        assert!([100, 120, 140].contains(&h));
        prev = h;
    }
}

#[test]
fn landscape_1200_layout() {
    let l = FooterLayout::compute(1200, 800, 140);
    assert_eq!(l.padding, 18);
    let map = l.map_box.unwrap();
    assert_eq!(map.height, 104);
    assert_eq!(map.width, 166);
    assert_eq!(map.right(), 1200 - 18);
    assert_eq!(map.y, 18);
    // Title 24px + 4 body lines of 15px exceed 104px, so everything shrinks uniformly.
    assert!(l.title_size < 24.0);
    let ratio = f64::from(l.body_size) / f64::from(l.title_size);
    assert!((ratio - 15.0 / 24.0).abs() < 1e-4);
    assert!(l.text_bottom() <= f64::from(l.footer_height - l.padding) + 1e-6);
}

#[test]
fn portrait_surfaces_allow_a_wider_map_cap() {
    let landscape = FooterLayout::compute(400, 300, 100);
    let portrait = FooterLayout::compute(400, 700, 100);
    let lw = landscape.map_box.unwrap().width;
    let pw = portrait.map_box.unwrap().width;
    assert_eq!(lw, 120);
    assert_eq!(pw, 134);
}

#[test]
fn map_box_and_text_stay_inside_the_band() {
    for w in [16u32, 40, 120, 320, 639, 640, 800, 1024, 1920, 3840] {
        for h in [w / 2, w, w * 2] {
            let fh = footer_height(w);
            let l = FooterLayout::compute(w, h, fh);
            if let Some(b) = l.map_box {
                assert!(b.width >= MIN_MAP_WIDTH);
                assert!(b.right() <= w && b.bottom() <= fh);
                assert!(l.text_x + l.text_width <= f64::from(b.x));
            }
            assert!(l.text_bottom() <= f64::from(fh) + 1e-6);
            assert!(l.title_size > 0.0 && l.body_size > 0.0);
        }
    }
}

#[test]
fn tiny_surfaces_have_no_map_box() {
    let l = FooterLayout::compute(40, 30, 100);
    assert!(l.map_box.is_none());
    assert_eq!(l.text_width, f64::from(40 - 2 * l.padding));
}
