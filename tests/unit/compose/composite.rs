use super::*;

fn gradient_frame(width: u32, height: u32) -> FrameBuffer {
    let mut data = Vec::with_capacity(FrameBuffer::byte_len(width, height));
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x * 7 % 256) as u8, (y * 13 % 256) as u8, 42]);
        }
    }
    FrameBuffer::from_rgb8(width, height, data).unwrap()
}

#[test]
fn centered_offset_matches_hd_example() {
    assert_eq!(centered_offset(1920, 1080, 200, 100).unwrap(), (860, 490));
}

#[test]
fn centered_offset_floors_odd_margins() {
    assert_eq!(centered_offset(11, 6, 4, 3).unwrap(), (3, 1));
    assert_eq!(centered_offset(4, 4, 4, 4).unwrap(), (0, 0));
}

#[test]
fn oversized_foreground_is_geometry_error() {
    let err = centered_offset(1920, 1080, 2000, 2000).unwrap_err();
    assert!(matches!(err, MontageError::Geometry(_)));

    let bg = FrameBuffer::filled(8, 4, [0, 0, 0]);
    let fg = ImageAsset::solid(8, 5, [255, 255, 255], 1.0);
    let err = composite(&bg, &fg).unwrap_err();
    assert!(matches!(err, MontageError::Geometry(_)));
}

#[test]
fn full_alpha_copies_foreground_exactly() {
    let bg = gradient_frame(10, 8);
    let fg = ImageAsset::solid(4, 2, [9, 99, 199], 1.0);
    let out = composite(&bg, &fg).unwrap();
    let (x, y) = (3, 3);
    for j in 0..2 {
        for i in 0..4 {
            assert_eq!(out.pixel(x + i, y + j), [9, 99, 199]);
        }
    }
}

#[test]
fn zero_alpha_leaves_background_untouched() {
    let bg = gradient_frame(10, 8);
    let fg = ImageAsset::solid(6, 6, [255, 255, 255], 0.0);
    let out = composite(&bg, &fg).unwrap();
    assert_eq!(out, bg);
}

#[test]
fn partial_alpha_blends_linearly() {
    let bg = FrameBuffer::filled(4, 4, [0, 100, 200]);
    let fg = ImageAsset::solid(2, 2, [200, 200, 0], 0.25);
    let out = composite(&bg, &fg).unwrap();
    assert_eq!(out.pixel(1, 1), [50, 125, 150]);
    // Outside the footprint.
    assert_eq!(out.pixel(0, 0), [0, 100, 200]);
    assert_eq!(out.pixel(3, 3), [0, 100, 200]);
}

#[test]
fn per_pixel_alpha_is_respected() {
    let bg = FrameBuffer::filled(2, 1, [100, 100, 100]);
    let fg = ImageAsset::from_rgba8(2, 1, &[0, 0, 0, 255, 0, 0, 0, 0]).unwrap();
    let out = composite(&bg, &fg).unwrap();
    assert_eq!(out.pixel(0, 0), [0, 0, 0]);
    assert_eq!(out.pixel(1, 0), [100, 100, 100]);
}

#[test]
fn composite_does_not_touch_inputs() {
    let bg = gradient_frame(6, 6);
    let fg = ImageAsset::solid(2, 2, [1, 2, 3], 0.5);
    let fg_before = fg.clone();
    let bg_before = bg.clone();
    let _ = composite(&bg, &fg).unwrap();
    assert_eq!(fg, fg_before);
    assert_eq!(bg, bg_before);
}
