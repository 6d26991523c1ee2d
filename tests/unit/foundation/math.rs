use super::*;

#[test]
fn lerp_endpoints_are_exact() {
    for bg in [0u8, 17, 128, 255] {
        for fg in [0u8, 99, 200, 255] {
            assert_eq!(lerp_u8(bg, fg, 1.0), fg);
            assert_eq!(lerp_u8(bg, fg, 0.0), bg);
        }
    }
}

#[test]
fn lerp_midpoint_blends_proportionally() {
    assert_eq!(lerp_u8(0, 200, 0.5), 100);
    assert_eq!(lerp_u8(100, 200, 0.25), 125);
}

#[test]
fn unit_alpha_spans_zero_to_one() {
    assert_eq!(unit_alpha(0), 0.0);
    assert_eq!(unit_alpha(255), 1.0);
    assert!((unit_alpha(51) - 0.2).abs() < 1e-6);
}
