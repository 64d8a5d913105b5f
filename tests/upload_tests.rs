use bytes::Bytes;
use md5::{Digest, Md5};
use streamsite::images::store::{ImageDir, ImageStoreError};
use streamsite::images::{process_upload, UploadSubmission, UploadedPart};

const MAX_SIZE: u64 = 10_485_760;

fn test_dir() -> (tempfile::TempDir, ImageDir) {
    let dir = tempfile::tempdir().unwrap();
    let images = ImageDir::new(dir.path()).unwrap();
    (dir, images)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn submission(parts: Vec<UploadedPart>) -> UploadSubmission {
    UploadSubmission {
        files: parts,
        tag: "emote".to_string(),
    }
}

fn png_part(data: Vec<u8>) -> UploadedPart {
    UploadedPart {
        filename: Some("original.png".to_string()),
        content_type: Some("image/png".to_string()),
        data: Bytes::from(data),
    }
}

// ============================================================================
// Validation failures
// ============================================================================

#[tokio::test]
async fn test_upload_rejects_empty_submission() {
    let (_dir, images) = test_dir();
    let err = process_upload(&images, submission(vec![]), MAX_SIZE)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No file sent.");
}

#[tokio::test]
async fn test_upload_rejects_multiple_files() {
    let (_dir, images) = test_dir();
    let parts = vec![png_part(png_bytes(2, 2)), png_part(png_bytes(2, 2))];
    let err = process_upload(&images, submission(parts), MAX_SIZE)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid parameters.");
}

#[tokio::test]
async fn test_upload_rejects_oversized_file() {
    let (_dir, images) = test_dir();
    let part = UploadedPart {
        filename: Some("big.png".to_string()),
        content_type: Some("image/png".to_string()),
        data: Bytes::from(vec![0u8; 11_000_000]),
    };
    let err = process_upload(&images, submission(vec![part]), MAX_SIZE)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Exceeded file size limit.");
}

#[tokio::test]
async fn test_upload_rejects_disallowed_mime_type() {
    let (_dir, images) = test_dir();
    let part = UploadedPart {
        filename: Some("doc.pdf".to_string()),
        content_type: Some("application/pdf".to_string()),
        data: Bytes::from(png_bytes(2, 2)),
    };
    let err = process_upload(&images, submission(vec![part]), MAX_SIZE)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid file format.");
}

#[tokio::test]
async fn test_upload_rejects_webp_by_declared_type() {
    let (_dir, images) = test_dir();
    let part = UploadedPart {
        filename: Some("anim.webp".to_string()),
        content_type: Some("image/webp".to_string()),
        data: Bytes::from(png_bytes(2, 2)),
    };
    let err = process_upload(&images, submission(vec![part]), MAX_SIZE)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid file format.");
}

#[tokio::test]
async fn test_upload_rejects_undecodable_image() {
    let (_dir, images) = test_dir();
    let part = UploadedPart {
        filename: Some("fake.png".to_string()),
        content_type: Some("image/png".to_string()),
        data: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x02, 0x03]),
    };
    let err = process_upload(&images, submission(vec![part]), MAX_SIZE)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to extract dimensions.");
}

// ============================================================================
// Successful uploads
// ============================================================================

#[tokio::test]
async fn test_upload_stores_file_and_builds_record() {
    let (_dir, images) = test_dir();
    let data = png_bytes(4, 3);
    let expected_hash = format!("{:x}", Md5::digest(&data));
    let expected_size = data.len() as u64;

    let record = process_upload(&images, submission(vec![png_part(data)]), MAX_SIZE)
        .await
        .unwrap();

    assert_eq!(record.label, "original.png");
    assert!(record.name.ends_with(".png"));
    assert_eq!(record.name, format!("{}.png", record.id));
    assert_eq!(record.hash, expected_hash);
    assert_eq!(record.byte_size, expected_size);
    assert_eq!(record.mime_type, "image/png");
    assert_eq!(record.width, 4);
    assert_eq!(record.height, 3);
    assert_eq!(record.tag, "emote");

    let stored = images.read(&record.name).await.unwrap();
    assert_eq!(stored.len() as u64, expected_size);
}

#[tokio::test]
async fn test_upload_guesses_type_from_filename() {
    let (_dir, images) = test_dir();
    let part = UploadedPart {
        filename: Some("noheader.png".to_string()),
        content_type: None,
        data: Bytes::from(png_bytes(2, 2)),
    };

    let record = process_upload(&images, submission(vec![part]), MAX_SIZE)
        .await
        .unwrap();
    assert_eq!(record.mime_type, "image/png");
}

#[tokio::test]
async fn test_upload_accepts_file_at_exact_limit() {
    let (_dir, images) = test_dir();
    let data = png_bytes(2, 2);
    let limit = data.len() as u64;

    let record = process_upload(&images, submission(vec![png_part(data)]), limit)
        .await
        .unwrap();
    assert_eq!(record.byte_size, limit);
}

// ============================================================================
// Image directory
// ============================================================================

#[tokio::test]
async fn test_image_dir_save_read_remove() {
    let (_dir, images) = test_dir();

    images.save("a.png", b"first").await.unwrap();
    assert!(images.exists("a.png").await.unwrap());
    assert_eq!(images.read("a.png").await.unwrap(), Bytes::from("first"));

    // Overwrite replaces the previous file
    images.save("a.png", b"second").await.unwrap();
    assert_eq!(images.read("a.png").await.unwrap(), Bytes::from("second"));

    images.remove("a.png").await.unwrap();
    assert!(!images.exists("a.png").await.unwrap());

    // Removing a missing file is not an error
    images.remove("a.png").await.unwrap();
}

#[tokio::test]
async fn test_image_dir_read_missing() {
    let (_dir, images) = test_dir();
    let err = images.read("nope.png").await.unwrap_err();
    assert!(matches!(err, ImageStoreError::NotFound(_)));
}

#[tokio::test]
async fn test_image_dir_leaves_no_temp_file() {
    let (dir, images) = test_dir();
    images.save("b.gif", b"gif bytes").await.unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["b.gif"]);
}
