use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn premultiply_then_unpremultiply_is_close() {
    let mut px = vec![200u8, 100, 50, 128, 255, 255, 255, 0, 10, 20, 30, 255];
    let original = px.clone();
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    assert_eq!(&px[8..12], &[10, 20, 30, 255]);

    unpremultiply_rgba8_in_place(&mut px);
    assert!(channel_distance(&px[0..4], &original[0..4]) <= 2);
}

#[test]
fn channel_distance_picks_max() {
    assert_eq!(channel_distance(&[0, 10, 20, 30], &[5, 10, 0, 30]), 20);
    assert_eq!(channel_distance(&[], &[]), 0);
}
