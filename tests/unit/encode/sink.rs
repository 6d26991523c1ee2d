use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 4,
        height: 2,
        fps: Fps::new(25, 1).unwrap(),
        audio: None,
    }
}

#[test]
fn frame_len_is_packed_rgb() {
    assert_eq!(cfg().frame_len(), 4 * 2 * 3);
}

#[test]
fn keeps_frames_in_arrival_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &FrameBuffer::filled(4, 2, [1, 1, 1]))
        .unwrap();
    sink.push_frame(FrameIndex(3), &FrameBuffer::filled(4, 2, [2, 2, 2]))
        .unwrap();
    sink.end().unwrap();

    assert!(sink.is_ended());
    let frames = sink.into_frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].0, FrameIndex(3));
    assert_eq!(frames[1].1.pixel(0, 0), [2, 2, 2]);
}

#[test]
fn rejects_repeated_index_and_wrong_size() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(1), &FrameBuffer::filled(4, 2, [0, 0, 0]))
        .unwrap();
    assert!(matches!(
        sink.push_frame(FrameIndex(1), &FrameBuffer::filled(4, 2, [0, 0, 0])),
        Err(MontageError::Encode(_))
    ));
    assert!(matches!(
        sink.push_frame(FrameIndex(2), &FrameBuffer::filled(2, 2, [0, 0, 0])),
        Err(MontageError::InvalidArgument(_))
    ));
    assert_eq!(sink.frames().len(), 1);
}

#[test]
fn push_or_end_before_begin_fails() {
    let mut sink = InMemorySink::new();
    assert!(sink
        .push_frame(FrameIndex(0), &FrameBuffer::filled(4, 2, [0, 0, 0]))
        .is_err());
    assert!(sink.end().is_err());
    assert!(sink.config().is_none());
}

#[test]
fn begin_resets_previous_run() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &FrameBuffer::filled(4, 2, [0, 0, 0]))
        .unwrap();
    sink.end().unwrap();
    sink.begin(cfg()).unwrap();
    assert!(sink.frames().is_empty());
    assert!(!sink.is_ended());
}
