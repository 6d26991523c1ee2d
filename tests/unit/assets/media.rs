use super::*;

const BG_JSON: &str = r#"{
  "streams": [
    {"codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30/1",
     "avg_frame_rate": "30/1", "nb_frames": "900", "duration": "30.000000"},
    {"codec_type": "audio", "sample_rate": "44100", "channels": 2, "duration": "30.01"}
  ],
  "format": {"duration": "30.010000"}
}"#;

#[test]
fn parse_video_probe_reads_geometry_rate_and_frames() {
    let info = parse_probe_json(Path::new("bg.mp4"), BG_JSON.as_bytes()).unwrap();
    let MediaInfo::Video(v) = info else {
        panic!("expected video info");
    };
    assert_eq!((v.width, v.height), (1920, 1080));
    assert_eq!(v.fps, Fps { num: 30, den: 1 });
    assert_eq!(v.total_frames, 900);
    assert!((v.total_duration_secs() - 30.0).abs() < 1e-9);
}

#[test]
fn parse_video_probe_falls_back_to_duration_for_frame_count() {
    let json = r#"{
      "streams": [{"codec_type": "video", "width": 64, "height": 64, "r_frame_rate": "25/1"}],
      "format": {"duration": "2.5"}
    }"#;
    let MediaInfo::Video(v) = parse_probe_json(Path::new("bg.webm"), json.as_bytes()).unwrap()
    else {
        panic!("expected video info");
    };
    assert_eq!(v.total_frames, 62);
}

#[test]
fn parse_audio_probe_ignores_cover_art_stream() {
    let json = r#"{
      "streams": [
        {"codec_type": "audio", "sample_rate": "24000", "channels": 1, "duration": "3.2"},
        {"codec_type": "video", "width": 300, "height": 300, "r_frame_rate": "90000/1",
         "disposition": {"attached_pic": 1}}
      ],
      "format": {"duration": "3.25"}
    }"#;
    let MediaInfo::Audio(a) = parse_probe_json(Path::new("tts.mp3"), json.as_bytes()).unwrap()
    else {
        panic!("expected audio info");
    };
    assert!((a.duration_sec - 3.2).abs() < 1e-9);
    assert_eq!(a.sample_rate, 24_000);
    assert_eq!(a.channels, 1);
}

#[test]
fn parse_probe_without_streams_is_decode_error() {
    let err = parse_probe_json(Path::new("x"), br#"{"streams": []}"#).unwrap_err();
    assert!(matches!(err, MontageError::Decode(_)));
    let err = parse_probe_json(Path::new("x"), b"{").unwrap_err();
    assert!(matches!(err, MontageError::Decode(_)));
}

#[test]
fn f32le_samples_must_be_aligned() {
    let bytes: Vec<u8> = [0.5f32, -1.0].iter().flat_map(|v| v.to_le_bytes()).collect();
    assert_eq!(f32le_to_samples(&bytes).unwrap(), vec![0.5, -1.0]);
    assert!(f32le_to_samples(&bytes[..5]).is_err());
}

#[cfg(feature = "media-ffmpeg")]
#[test]
fn probe_missing_file_is_not_found() {
    let err = probe(Path::new("/no/such/background.mp4")).unwrap_err();
    assert!(matches!(err, MontageError::NotFound(_)));
}
