use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, JSend};
use crate::api::session::{Session, UserRole};
use crate::storage::models::EmoteRecord;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct EmoteResponse {
    pub id: String,
    pub prefix: String,
    pub image_id: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEmoteRequest {
    pub prefix: String,
    pub image_id: String,
}

pub async fn create_emote(
    State(state): State<Arc<AppState>>,
    session: Session,
    AppJson(req): AppJson<CreateEmoteRequest>,
) -> Result<Json<JSend<EmoteResponse>>, ApiError> {
    session.require_any_role(&[UserRole::Admin, UserRole::Emotes])?;

    if req.prefix.trim().is_empty() {
        return Err(ApiError::bad_request("prefix must not be empty"));
    }

    let image = state
        .db
        .find_image_by_id(&req.image_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::bad_request("image_id does not reference an uploaded image"))?;

    let existing = state
        .db
        .get_all_emotes()
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if existing.iter().any(|e| e.prefix == req.prefix) {
        return Err(ApiError::conflict(format!(
            "emote '{}' already exists",
            req.prefix
        )));
    }

    let emote = EmoteRecord {
        id: uuid::Uuid::new_v4().to_string(),
        prefix: req.prefix,
        image_id: image.id.clone(),
        created_at: Utc::now(),
    };
    state
        .db
        .put_emote(&emote)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(emote_id = %emote.id, prefix = %emote.prefix, "created emote");
    Ok(JSend::success(emote_response(&emote, Some(&image.name))))
}

pub async fn list_emotes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<EmoteResponse>>>, ApiError> {
    let emotes = state
        .db
        .get_all_emotes()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let mut out = Vec::with_capacity(emotes.len());
    for emote in &emotes {
        let image = state
            .db
            .find_image_by_id(&emote.image_id)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        out.push(emote_response(emote, image.as_ref().map(|i| i.name.as_str())));
    }

    Ok(JSend::success(out))
}

pub async fn delete_emote(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    session.require_any_role(&[UserRole::Admin, UserRole::Emotes])?;

    let deleted = state
        .db
        .delete_emote(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !deleted {
        return Err(ApiError::not_found("Emote not found"));
    }

    tracing::debug!(emote_id = %id, "deleted emote");
    Ok(JSend::success(()))
}

fn emote_response(emote: &EmoteRecord, image_name: Option<&str>) -> EmoteResponse {
    EmoteResponse {
        id: emote.id.clone(),
        prefix: emote.prefix.clone(),
        image_id: emote.image_id.clone(),
        image_url: image_name.map(|n| format!("/images/{n}")),
        created_at: emote.created_at.to_rfc3339(),
    }
}
