use super::*;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::new(30, 1).unwrap(),
        audio: None,
    }
}

#[test]
fn sink_rejects_odd_or_empty_dimensions_before_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(dir.path().join("o.mp4")));
    assert!(matches!(
        sink.begin(cfg(11, 10)),
        Err(MontageError::InvalidArgument(_))
    ));
    assert!(matches!(
        sink.begin(cfg(0, 10)),
        Err(MontageError::InvalidArgument(_))
    ));
}

#[test]
fn push_before_begin_is_encode_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
    let frame = FrameBuffer::filled(2, 2, [0, 0, 0]);
    assert!(matches!(
        sink.push_frame(FrameIndex(0), &frame),
        Err(MontageError::Encode(_))
    ));
}

#[test]
fn atomic_output_commit_moves_file_into_place() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nested").join("final.mkv");
    let out = AtomicOutput::new(&dest, true).unwrap();
    assert_eq!(out.path().extension().unwrap(), "mkv");
    assert_eq!(out.path().parent(), dest.parent());
    std::fs::write(out.path(), b"payload").unwrap();

    let committed = out.commit().unwrap();
    assert_eq!(committed, dest);
    assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
}

#[test]
fn atomic_output_dropped_without_commit_leaves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("final.mp4");
    let tmp_path = {
        let out = AtomicOutput::new(&dest, true).unwrap();
        std::fs::write(out.path(), b"partial").unwrap();
        out.path().to_path_buf()
    };
    assert!(!tmp_path.exists());
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn atomic_output_respects_no_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("final.mp4");
    std::fs::write(&dest, b"keep").unwrap();
    assert!(matches!(
        AtomicOutput::new(&dest, false),
        Err(MontageError::Encode(_))
    ));
    assert_eq!(std::fs::read(&dest).unwrap(), b"keep");
}

#[test]
fn extensionless_destinations_force_mp4() {
    assert_eq!(container_override(Path::new("out")), Some("mp4".to_string()));
    assert_eq!(container_override(Path::new("out.webm")), None);
    assert!(has_mov_extension(Path::new("a/b.MP4")));
    assert!(!has_mov_extension(Path::new("a/b.mkv")));
}

#[test]
fn write_silent_video_requires_frames() {
    let dir = tempfile::tempdir().unwrap();
    let err = write_silent_video(&[], Fps::new(30, 1).unwrap(), &dir.path().join("x.mp4"), true)
        .unwrap_err();
    assert!(matches!(err, MontageError::InvalidArgument(_)));
}

#[test]
fn output_dir_defaults_to_current_directory() {
    assert_eq!(output_dir(Path::new("out.mp4")), PathBuf::from("."));
    assert_eq!(output_dir(Path::new("a/b/out.mp4")), PathBuf::from("a/b"));
}
