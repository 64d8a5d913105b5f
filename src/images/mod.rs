pub mod store;

use std::io::Cursor;

use bytes::Bytes;
use chrono::Utc;
use md5::{Digest, Md5};
use thiserror::Error;

use crate::storage::models::ImageRecord;
use store::{ImageDir, ImageStoreError};

/// Accepted upload formats: extension by declared MIME type
pub const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
];

/// Upload failures. The messages are the payload the endpoint returns;
/// none of these escape the pipeline as transport errors.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid parameters.")]
    InvalidParameters,
    #[error("No file sent.")]
    NoFile,
    #[error("Exceeded file size limit.")]
    TooLarge,
    #[error("Invalid file format.")]
    BadFormat,
    #[error("Failed to extract dimensions.")]
    Dimensions,
    #[error("Failed to move uploaded file.")]
    Move(#[source] ImageStoreError),
}

/// One file part from the multipart form
#[derive(Debug)]
pub struct UploadedPart {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// An upload submission as received by the route: every `file` part that
/// arrived, plus the optional grouping tag.
#[derive(Debug, Default)]
pub struct UploadSubmission {
    pub files: Vec<UploadedPart>,
    pub tag: String,
}

/// Validate a submission and persist the file, returning the record ready
/// for insertion. Exactly one file part is accepted; the declared MIME
/// type must be on the whitelist (guessed from the filename when the part
/// carries none); the stored name is `<uuid>.<ext>` so names cannot
/// collide or be guessed from upload time.
pub async fn process_upload(
    dir: &ImageDir,
    submission: UploadSubmission,
    max_size: u64,
) -> Result<ImageRecord, UploadError> {
    let mut files = submission.files;
    let part = match files.len() {
        0 => return Err(UploadError::NoFile),
        1 => files.remove(0),
        _ => return Err(UploadError::InvalidParameters),
    };

    if part.data.len() as u64 > max_size {
        return Err(UploadError::TooLarge);
    }

    let declared = part
        .content_type
        .clone()
        .or_else(|| {
            part.filename
                .as_deref()
                .and_then(|n| mime_guess::from_path(n).first())
                .map(|m| m.to_string())
        })
        .ok_or(UploadError::BadFormat)?;

    let ext = ALLOWED_TYPES
        .iter()
        .find(|(_, mime)| *mime == declared)
        .map(|(ext, _)| *ext)
        .ok_or(UploadError::BadFormat)?;

    let hash = format!("{:x}", Md5::digest(&part.data));

    // The decoder is the authority on dimensions and the real format; a
    // file that merely claims to be an image fails here.
    let reader = image::ImageReader::new(Cursor::new(&part.data))
        .with_guessed_format()
        .map_err(|_| UploadError::Dimensions)?;
    let mime_type = reader
        .format()
        .map(|f| f.to_mime_type().to_string())
        .ok_or(UploadError::Dimensions)?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|_| UploadError::Dimensions)?;

    let id = uuid::Uuid::new_v4().to_string();
    let name = format!("{id}.{ext}");

    dir.save(&name, &part.data).await.map_err(UploadError::Move)?;

    let now = Utc::now();
    Ok(ImageRecord {
        id,
        label: part.filename.unwrap_or_else(|| name.clone()),
        name,
        hash,
        byte_size: part.data.len() as u64,
        mime_type,
        width,
        height,
        tag: submission.tag,
        created_at: now,
        updated_at: now,
    })
}
