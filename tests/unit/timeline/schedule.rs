use super::*;

#[test]
fn frame_count_follows_floor_law() {
    assert_eq!(frame_count(3.2, 30.0, 2.0).unwrap(), 156);
    assert_eq!(frame_count(0.0, 30.0, DEFAULT_PAD_SECONDS).unwrap(), 60);
    assert_eq!(frame_count(1.0, 24.0, 0.0).unwrap(), 24);
    assert_eq!(frame_count(1.01, 25.0, 0.0).unwrap(), 25);
}

#[test]
fn frame_count_handles_ntsc_rates() {
    // (1.5 + 2.0) * 29.97002997 = 104.895...
    assert_eq!(frame_count(1.5, 30000.0 / 1001.0, 2.0).unwrap(), 104);
}

#[test]
fn frame_count_rejects_invalid_arguments() {
    assert!(matches!(
        frame_count(-0.1, 30.0, 2.0),
        Err(MontageError::InvalidArgument(_))
    ));
    assert!(matches!(
        frame_count(1.0, 0.0, 2.0),
        Err(MontageError::InvalidArgument(_))
    ));
    assert!(matches!(
        frame_count(1.0, -30.0, 2.0),
        Err(MontageError::InvalidArgument(_))
    ));
    assert!(frame_count(f64::NAN, 30.0, 2.0).is_err());
    assert!(frame_count(1.0, 30.0, -1.0).is_err());
}

#[test]
fn total_audio_adds_one_pad_per_segment() {
    assert!((total_audio_secs(&[1.5, 2.5, 3.0], 2.0) - 13.0).abs() < 1e-12);
    assert_eq!(total_audio_secs(&[], 2.0), 0.0);
}
