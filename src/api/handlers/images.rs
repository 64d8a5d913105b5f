use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppQuery, JSend, JSendPaginated, Pagination};
use crate::api::session::{Session, UserRole};
use crate::images::store::ImageStoreError;
use crate::images::{self, UploadError, UploadSubmission, UploadedPart};
use crate::storage::models::ImageRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: String,
    pub label: String,
    pub name: String,
    pub url: String,
    pub hash: String,
    pub byte_size: u64,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub tag: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Upload outcome: the stored record, or the pipeline's `{"error": ...}`
/// payload. Validation failures are part of the response contract here,
/// not transport errors.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Image(ImageResponse),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
pub struct ListImagesParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub tag: Option<String>,
}

fn default_limit() -> u32 {
    20
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    session.require_any_role(&[UserRole::Admin, UserRole::Emotes, UserRole::Features])?;

    let submission = match read_submission(&mut multipart).await {
        Ok(submission) => submission,
        Err(e) => {
            return Ok(Json(UploadResponse::Error {
                error: e.to_string(),
            }))
        }
    };

    let record = match images::process_upload(
        &state.images,
        submission,
        state.config.images.max_upload_size,
    )
    .await
    {
        Ok(record) => record,
        Err(e) => {
            return Ok(Json(UploadResponse::Error {
                error: e.to_string(),
            }))
        }
    };

    state
        .db
        .add_image(&record)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(image_id = %record.id, name = %record.name, "stored image");
    Ok(Json(UploadResponse::Image(image_to_response(&record))))
}

/// Collect the `file` parts and the tag from the form. A submission the
/// multipart parser cannot read is treated the same as one with bogus
/// fields.
async fn read_submission(multipart: &mut Multipart) -> Result<UploadSubmission, UploadError> {
    let mut submission = UploadSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| UploadError::InvalidParameters)?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| UploadError::InvalidParameters)?;
                submission.files.push(UploadedPart {
                    filename,
                    content_type,
                    data,
                });
            }
            "tag" => {
                submission.tag = field
                    .text()
                    .await
                    .map_err(|_| UploadError::InvalidParameters)?;
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    Ok(submission)
}

pub async fn get_image(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<JSend<ImageResponse>>, ApiError> {
    session.require_any_role(&[UserRole::Admin, UserRole::Emotes, UserRole::Features])?;

    let image = state
        .db
        .find_image_by_id(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    Ok(JSend::success(image_to_response(&image)))
}

pub async fn list_images(
    State(state): State<Arc<AppState>>,
    session: Session,
    AppQuery(params): AppQuery<ListImagesParams>,
) -> Result<Json<JSendPaginated<ImageResponse>>, ApiError> {
    session.require_any_role(&[UserRole::Admin, UserRole::Emotes, UserRole::Features])?;

    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let images = state
        .db
        .list_images(params.tag.as_deref())
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let total = images.len() as u64;
    let items: Vec<ImageResponse> = images
        .iter()
        .skip(params.offset as usize)
        .take(params.limit as usize)
        .map(image_to_response)
        .collect();

    Ok(JSendPaginated::success(
        items,
        Pagination {
            limit: params.limit,
            offset: params.offset,
            total,
        },
    ))
}

pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    session.require_any_role(&[UserRole::Admin, UserRole::Emotes, UserRole::Features])?;

    let image = state
        .db
        .find_image_by_id(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    state
        .db
        .remove_image_by_id(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    // The row is gone; a leftover file gets caught by the purge sweep.
    if let Err(e) = state.images.remove(&image.name).await {
        tracing::warn!(image_id = %id, error = %e, "failed to remove image file");
    }

    tracing::debug!(image_id = %id, "deleted image");
    Ok(JSend::success(()))
}

/// Serve stored image bytes by name.
/// Route: GET /images/:name
pub async fn serve_image(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let image = state
        .db
        .find_image_by_name(&name)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    let data = state.images.read(&image.name).await.map_err(|e| match e {
        ImageStoreError::NotFound(_) => ApiError::not_found("Image file not found"),
        _ => ApiError::internal(format!("Failed to read image: {e}")),
    })?;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        image
            .mime_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        header::HeaderValue::from(image.byte_size),
    );
    // Stored files never change under a name; only rows do.
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("public, max-age=3600"),
    );

    Ok(response)
}

// ============================================================================
// Helpers
// ============================================================================

pub(super) fn image_to_response(image: &ImageRecord) -> ImageResponse {
    ImageResponse {
        id: image.id.clone(),
        label: image.label.clone(),
        name: image.name.clone(),
        url: format!("/images/{}", image.name),
        hash: image.hash.clone(),
        byte_size: image.byte_size,
        mime_type: image.mime_type.clone(),
        width: image.width,
        height: image.height,
        tag: image.tag.clone(),
        created_at: image.created_at.to_rfc3339(),
        updated_at: image.updated_at.to_rfc3339(),
    }
}
