use super::*;

fn run(dst: PremulRgba8, src: PremulRgba8, mode: BlendMode) -> PremulRgba8 {
    let mut d = dst.to_vec();
    blend_over_in_place(&mut d, &src, 1.0, mode).unwrap();
    [d[0], d[1], d[2], d[3]]
}

fn is_gray(px: PremulRgba8) -> bool {
    px[0].abs_diff(px[1]) <= 1 && px[1].abs_diff(px[2]) <= 1
}

#[test]
fn over_src_opaque_replaces_dst() {
    assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255], 1.0), [255, 0, 0, 255]);
}

#[test]
fn over_opacity_0_is_noop() {
    assert_eq!(over([1, 2, 3, 4], [200, 200, 200, 200], 0.0), [1, 2, 3, 4]);
}

#[test]
fn over_half_opacity_mixes() {
    let out = over([0, 0, 0, 255], [255, 255, 255, 255], 0.5);
    assert_eq!(out[3], 255);
    assert!((127..=129).contains(&out[0]));
}

#[test]
fn multiply_with_opaque_pixels() {
    assert_eq!(run([255, 0, 0, 255], [128, 128, 128, 255], BlendMode::Multiply), [128, 0, 0, 255]);
    assert_eq!(run([10, 20, 30, 255], [255, 255, 255, 255], BlendMode::Multiply), [10, 20, 30, 255]);
}

#[test]
fn screen_with_black_is_identity() {
    assert_eq!(run([10, 20, 30, 255], [0, 0, 0, 255], BlendMode::Screen), [10, 20, 30, 255]);
}

#[test]
fn difference_of_equal_colors_is_black() {
    assert_eq!(run([90, 40, 200, 255], [90, 40, 200, 255], BlendMode::Difference), [0, 0, 0, 255]);
}

#[test]
fn blend_over_transparent_dst_is_plain_source() {
    for mode in BlendMode::ALL {
        assert_eq!(run([0, 0, 0, 0], [100, 50, 25, 200], mode), [100, 50, 25, 200], "{mode:?}");
    }
}

#[test]
fn transparent_source_leaves_dst() {
    for mode in BlendMode::ALL {
        assert_eq!(run([10, 20, 30, 255], [0, 0, 0, 0], mode), [10, 20, 30, 255], "{mode:?}");
    }
}

#[test]
fn color_mode_with_gray_source_desaturates_to_dst_luminosity() {
    let out = run([255, 0, 0, 255], [128, 128, 128, 255], BlendMode::Color);
    assert!(is_gray(out));
    assert!((75..=78).contains(&out[0]));
}

#[test]
fn saturation_mode_with_gray_source_desaturates() {
    let out = run([0, 200, 50, 255], [60, 60, 60, 255], BlendMode::Saturation);
    assert!(is_gray(out));
}

#[test]
fn hue_mode_over_gray_stays_gray() {
    let out = run([100, 100, 100, 255], [255, 0, 0, 255], BlendMode::Hue);
    assert!(is_gray(out));
    assert!((99..=101).contains(&out[0]));
}

#[test]
fn luminosity_of_white_source_is_white() {
    assert_eq!(run([200, 10, 10, 255], [255, 255, 255, 255], BlendMode::Luminosity), [255, 255, 255, 255]);
}

#[test]
fn mismatched_buffers_are_rejected() {
    let mut d = vec![0u8; 8];
    assert!(blend_over_in_place(&mut d, &[0u8; 4], 1.0, BlendMode::Normal).is_err());
}
