use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

fn numbered_frames(n: u8) -> Vec<FrameBuffer> {
    (0..n).map(|i| FrameBuffer::filled(2, 2, [i, 0, 0])).collect()
}

fn cursor_over(frames: Vec<FrameBuffer>, start_frame: u64) -> BackgroundCursor {
    BackgroundCursor::new(
        Box::new(VecFrameSource::new(frames)),
        2,
        2,
        Fps::new(30, 1).unwrap(),
        start_frame,
    )
}

#[test]
fn start_offset_lies_within_slack() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..1_000 {
        let s = choose_start_secs(60.0, 45.5, &mut rng);
        assert!((0.0..=14.5).contains(&s), "start {s} out of range");
    }
}

#[test]
fn start_offset_is_zero_when_background_is_short_or_exact() {
    let mut rng = StdRng::seed_from_u64(7);
    assert_eq!(choose_start_secs(10.0, 25.0, &mut rng), 0.0);
    assert_eq!(choose_start_secs(10.0, 10.0, &mut rng), 0.0);
}

#[test]
fn seeded_start_offset_is_reproducible() {
    let a = choose_start_secs(100.0, 10.0, &mut StdRng::seed_from_u64(42));
    let b = choose_start_secs(100.0, 10.0, &mut StdRng::seed_from_u64(42));
    assert_eq!(a, b);
}

#[test]
fn cursor_reads_sequentially_and_tracks_position() {
    let mut cursor = cursor_over(numbered_frames(3), 120);
    assert_eq!(cursor.position(), 120);
    assert_eq!(cursor.next_frame().unwrap().unwrap().pixel(0, 0), [0, 0, 0]);
    assert_eq!(cursor.next_frame().unwrap().unwrap().pixel(0, 0), [1, 0, 0]);
    assert_eq!(cursor.frames_read(), 2);
    assert_eq!(cursor.position(), 122);
    assert!(!cursor.is_exhausted());
}

#[test]
fn cursor_stays_exhausted_without_wraparound() {
    let mut cursor = cursor_over(numbered_frames(1), 0);
    assert!(cursor.next_frame().unwrap().is_some());
    assert!(cursor.next_frame().unwrap().is_none());
    assert!(cursor.is_exhausted());
    assert!(cursor.next_frame().unwrap().is_none());
    assert_eq!(cursor.frames_read(), 1);
}

#[test]
fn cursor_rejects_frames_of_the_wrong_size() {
    let mut cursor = cursor_over(vec![FrameBuffer::filled(4, 2, [0, 0, 0])], 0);
    assert!(matches!(
        cursor.next_frame(),
        Err(MontageError::Decode(_))
    ));
}

#[cfg(feature = "media-ffmpeg")]
#[test]
fn background_decode_passes_decoder_frames_through() {
    let args = RAWVIDEO_OUTPUT_ARGS;
    let mode = args.iter().position(|a| *a == "-fps_mode").unwrap();
    assert_eq!(args[mode + 1], "passthrough");
    assert_eq!(args.last(), Some(&"pipe:1"));
}
