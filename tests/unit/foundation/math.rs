use super::*;

#[test]
fn fnv_matches_reference_values_and_splits_writes() {
    assert_eq!(Fnv1a64::new_default().finish(), 0xcbf2_9ce4_8422_2325);
    let mut a = Fnv1a64::new_default();
    a.write_u8(b'a');
    assert_eq!(a.finish(), 0xaf63_dc4c_8601_ec8c);

    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"geocam");
    let mut b = Fnv1a64::new_default();
    b.write_u8(b'g');
    b.write_bytes(b"eocam");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn over_opaque_src_replaces_dst() {
    assert_eq!(over_premul([1, 2, 3, 255], [200, 0, 0, 255]), [200, 0, 0, 255]);
}

#[test]
fn over_transparent_src_is_noop() {
    assert_eq!(over_premul([10, 20, 30, 40], [0, 0, 0, 0]), [10, 20, 30, 40]);
}

#[test]
fn half_black_over_white_is_mid_grey() {
    let src = premul_rgba8(0, 0, 0, 128);
    let out = over_premul([255, 255, 255, 255], src);
    assert_eq!(out[3], 255);
    assert_eq!(out[0], 127);
}

#[test]
fn unpremul_inverts_premul_for_opaque_and_clear() {
    assert_eq!(unpremul_rgba8(premul_rgba8(9, 8, 7, 255)), [9, 8, 7, 255]);
    assert_eq!(unpremul_rgba8([0, 0, 0, 0]), [0, 0, 0, 0]);
}
