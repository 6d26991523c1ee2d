use super::*;

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
}

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn parse_ratio_accepts_rational_and_integer_forms() {
    assert_eq!(Fps::parse_ratio("30000/1001").unwrap(), Fps { num: 30000, den: 1001 });
    assert_eq!(Fps::parse_ratio("25").unwrap(), Fps { num: 25, den: 1 });
    assert!(Fps::parse_ratio("0/0").is_err());
    assert!(Fps::parse_ratio("30/1/2").is_err());
    assert!(Fps::parse_ratio("abc").is_err());
}

#[test]
fn frame_buffer_length_is_checked() {
    assert!(FrameBuffer::from_rgb8(2, 2, vec![0; 12]).is_ok());
    assert!(FrameBuffer::from_rgb8(2, 2, vec![0; 11]).is_err());
}

#[test]
fn filled_frame_reports_pixels() {
    let f = FrameBuffer::filled(3, 2, [1, 2, 3]);
    assert_eq!(f.data.len(), 18);
    assert_eq!(f.stride(), 9);
    assert_eq!(f.pixel(2, 1), [1, 2, 3]);
}
