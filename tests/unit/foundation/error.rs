use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MontageError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(
        MontageError::geometry("x")
            .to_string()
            .contains("geometry error:")
    );
    assert!(
        MontageError::encode("x")
            .to_string()
            .contains("encode error:")
    );
    assert!(
        MontageError::invalid_argument("x")
            .to_string()
            .contains("invalid argument:")
    );
    assert!(
        MontageError::not_found("bg.mp4")
            .to_string()
            .contains("not found: 'bg.mp4'")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MontageError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn pair_tag_is_applied_once_and_reports_index() {
    let err = MontageError::decode("bad png").for_pair(3).for_pair(7);
    assert_eq!(err.pair_index(), Some(3));
    assert!(err.to_string().starts_with("pair 3: decode error:"));
    assert!(!err.is_run_fatal());
}

#[test]
fn untagged_errors_are_run_fatal() {
    assert!(MontageError::encode("disk full").is_run_fatal());
    assert!(MontageError::not_found("bg.mp4").is_run_fatal());
    assert_eq!(MontageError::encode("x").pair_index(), None);
}
