use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, JSend};
use crate::api::session::{Session, UserRole};
use crate::storage::models::FeatureRecord;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FeatureResponse {
    pub id: String,
    pub label: String,
    pub image_id: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFeatureRequest {
    pub label: String,
    pub image_id: String,
}

pub async fn create_feature(
    State(state): State<Arc<AppState>>,
    session: Session,
    AppJson(req): AppJson<CreateFeatureRequest>,
) -> Result<Json<JSend<FeatureResponse>>, ApiError> {
    session.require_any_role(&[UserRole::Admin, UserRole::Features])?;

    if req.label.trim().is_empty() {
        return Err(ApiError::bad_request("label must not be empty"));
    }

    let image = state
        .db
        .find_image_by_id(&req.image_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::bad_request("image_id does not reference an uploaded image"))?;

    let feature = FeatureRecord {
        id: uuid::Uuid::new_v4().to_string(),
        label: req.label,
        image_id: image.id.clone(),
        created_at: Utc::now(),
    };
    state
        .db
        .put_feature(&feature)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(feature_id = %feature.id, label = %feature.label, "created feature");
    Ok(JSend::success(feature_response(&feature, Some(&image.name))))
}

pub async fn list_features(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<FeatureResponse>>>, ApiError> {
    let features = state
        .db
        .get_all_features()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let mut out = Vec::with_capacity(features.len());
    for feature in &features {
        let image = state
            .db
            .find_image_by_id(&feature.image_id)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        out.push(feature_response(
            feature,
            image.as_ref().map(|i| i.name.as_str()),
        ));
    }

    Ok(JSend::success(out))
}

pub async fn delete_feature(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    session.require_any_role(&[UserRole::Admin, UserRole::Features])?;

    let deleted = state
        .db
        .delete_feature(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !deleted {
        return Err(ApiError::not_found("Feature not found"));
    }

    tracing::debug!(feature_id = %id, "deleted feature");
    Ok(JSend::success(()))
}

fn feature_response(feature: &FeatureRecord, image_name: Option<&str>) -> FeatureResponse {
    FeatureResponse {
        id: feature.id.clone(),
        label: feature.label.clone(),
        image_id: feature.image_id.clone(),
        image_url: image_name.map(|n| format!("/images/{n}")),
        created_at: feature.created_at.to_rfc3339(),
    }
}
