use super::*;

fn clip(name: &str, value: f32, sample_frames: usize) -> AudioAsset {
    AudioAsset::new(
        name,
        sample_frames as f64 / 10.0,
        10,
        1,
        vec![value; sample_frames],
    )
    .unwrap()
}

#[test]
fn frame_to_sample_uses_rational_fps() {
    let fps = Fps::new(30000, 1001).unwrap();
    let samples = frame_to_sample(300, fps, 48_000);
    assert!(samples > 470_000 && samples < 490_000);
    assert_eq!(frame_to_sample(0, fps, 48_000), 0);
}

#[test]
fn concat_places_each_clip_at_its_segment_start_and_pads_with_silence() {
    // 10 fps, 10 Hz: one sample per frame.
    let fps = Fps::new(10, 1).unwrap();
    let a = clip("a", 0.5, 2);
    let b = clip("b", -0.25, 3);

    let (rate, channels, out) = concat_segment_audio(&[(4, &a), (5, &b)], fps).unwrap();
    assert_eq!((rate, channels), (10, 1));
    assert_eq!(out, vec![0.5, 0.5, 0.0, 0.0, -0.25, -0.25, -0.25, 0.0, 0.0]);
}

#[test]
fn concat_cuts_audio_at_a_truncated_segment_boundary() {
    let fps = Fps::new(10, 1).unwrap();
    let a = clip("a", 1.0, 6);
    let b = clip("b", 0.5, 1);

    let (_, _, out) = concat_segment_audio(&[(3, &a), (2, &b)], fps).unwrap();
    assert_eq!(out, vec![1.0, 1.0, 1.0, 0.5, 0.0]);
}

#[test]
fn concat_rejects_mismatched_formats_and_empty_input() {
    let fps = Fps::new(10, 1).unwrap();
    let mono = clip("mono", 0.0, 1);
    let stereo = AudioAsset::new("stereo", 0.1, 10, 2, vec![0.0; 2]).unwrap();
    assert!(concat_segment_audio(&[(1, &mono), (1, &stereo)], fps).is_err());
    assert!(concat_segment_audio(&[], fps).is_err());
}

#[test]
fn asset_validation_rejects_bad_shapes() {
    assert!(AudioAsset::new("x", -1.0, 48_000, 2, vec![]).is_err());
    assert!(AudioAsset::new("x", 1.0, 0, 2, vec![]).is_err());
    assert!(AudioAsset::new("x", 1.0, 48_000, 2, vec![0.0; 3]).is_err());
}

#[test]
fn silence_has_expected_length() {
    let s = AudioAsset::silence(0.5, 48_000, 2).unwrap();
    assert_eq!(s.sample_frames(), 24_000);
    assert!(s.interleaved_f32.iter().all(|v| *v == 0.0));
}

#[test]
fn write_f32le_file_round_trips_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mix.f32le");
    write_f32le_file(&[0.25, -0.5], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), -0.5);
}
