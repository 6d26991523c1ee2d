use std::io::Cursor;

use super::*;

fn encode_png(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_keeps_straight_rgb_and_normalizes_alpha() {
    let buf = encode_png(2, 1, vec![100, 50, 200, 255, 10, 20, 30, 0]);

    let asset = decode_image(&buf).unwrap();
    assert_eq!(asset.width, 2);
    assert_eq!(asset.height, 1);
    assert_eq!(asset.rgb, vec![100, 50, 200, 10, 20, 30]);
    assert_eq!(asset.alpha, vec![1.0, 0.0]);
}

#[test]
fn decode_image_rejects_garbage() {
    let err = decode_image(b"not an image").unwrap_err();
    assert!(matches!(err, MontageError::Decode(_)));
}

#[test]
fn load_image_missing_file_is_not_found() {
    let err = load_image(Path::new("/definitely/not/here.png")).unwrap_err();
    assert!(matches!(err, MontageError::NotFound(_)));
}

#[test]
fn load_image_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.png");
    std::fs::write(&path, encode_png(1, 1, vec![1, 2, 3, 128])).unwrap();

    let asset = load_image(&path).unwrap();
    assert_eq!(asset.rgb, vec![1, 2, 3]);
    assert!((asset.alpha[0] - 128.0 / 255.0).abs() < 1e-6);
}

#[test]
fn from_rgba8_checks_length() {
    assert!(ImageAsset::from_rgba8(2, 2, &[0; 15]).is_err());
}

#[test]
fn image_dimensions_reads_the_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.png");
    std::fs::write(&path, encode_png(3, 2, vec![0; 3 * 2 * 4])).unwrap();
    assert_eq!(image_dimensions(&path).unwrap(), (3, 2));

    let junk = dir.path().join("junk.png");
    std::fs::write(&junk, b"not an image").unwrap();
    assert!(matches!(image_dimensions(&junk), Err(MontageError::Decode(_))));
    assert!(matches!(
        image_dimensions(&dir.path().join("gone.png")),
        Err(MontageError::NotFound(_))
    ));
}
