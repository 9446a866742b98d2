use super::*;

#[test]
fn crc32_matches_known_vectors() {
    assert_eq!(Crc32::checksum(&[b"123456789"]), 0xCBF4_3926);
    // IEND chunk CRC as it appears in every PNG file.
    assert_eq!(Crc32::checksum(&[b"IEND"]), 0xAE42_6082);
}

#[test]
fn crc32_is_split_invariant() {
    let whole = Crc32::checksum(&[b"tEXtComment"]);
    let split = Crc32::checksum(&[b"tEXt", b"Comment"]);
    assert_eq!(whole, split);
}

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(0, 200), 0);
}

#[test]
fn premultiply_then_unpremultiply_keeps_opaque_and_clears_transparent() {
    let mut px = vec![200, 100, 50, 255, 10, 20, 30, 0];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[200, 100, 50, 255]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[200, 100, 50, 255]);
}

#[test]
fn unpremultiply_half_alpha() {
    let mut px = vec![64, 32, 0, 128];
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![128, 64, 0, 128]);
}
