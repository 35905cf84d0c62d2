use parafx::io::{SaveFormat, load_buffer, save_buffer};
use parafx::{EditSession, EngineConfig, PixelBuffer, Transform};

fn card() -> PixelBuffer {
    PixelBuffer::from_fn(7, 5, |x, y| [(x * 30) as u8, (y * 50) as u8, 99, 255]).unwrap()
}

#[test]
fn png_round_trip_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.png");
    let src = card();
    save_buffer(&src, &path).unwrap();
    assert_eq!(load_buffer(&path).unwrap(), src);
}

#[test]
fn jpeg_keeps_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.jpg");
    save_buffer(&card(), &path).unwrap();
    let back = load_buffer(&path).unwrap();
    assert_eq!(back.dimensions(), (7, 5));
    assert_eq!(back.pixel(3, 3)[3], 255);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_buffer(&dir.path().join("nope.png")).is_err());
}

#[test]
fn format_from_extension() {
    use std::path::Path;
    assert_eq!(SaveFormat::from_path(Path::new("a.JPEG")).unwrap(), SaveFormat::Jpeg);
    assert_eq!(SaveFormat::from_path(Path::new("a.bmp")).unwrap(), SaveFormat::Bmp);
    assert_eq!(SaveFormat::from_path(Path::new("a")).unwrap(), SaveFormat::Png);
}

#[test]
fn unknown_extension_is_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.tif");
    let err = save_buffer(&card(), &path).unwrap_err();
    assert!(matches!(err, parafx::EngineError::UnsupportedFormat(ext) if ext == "tif"));
    assert!(!path.exists());
}

#[test]
fn edit_and_save_session_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("neg.png");

    let mut session = EditSession::new();
    session.load(card());
    session
        .apply_transform(Transform::Negate, &EngineConfig::default())
        .unwrap();
    save_buffer(session.active().unwrap(), &path).unwrap();

    let back = load_buffer(&path).unwrap();
    assert_eq!(back.pixel(1, 1), [225, 205, 156, 255]);
}
