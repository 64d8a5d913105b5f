use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, JSend};
use crate::api::session::{Session, UserRole};
use crate::storage::models::UserRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub images_deleted: u64,
    pub emotes_deleted: u64,
    pub features_deleted: u64,
    pub users_deleted: u64,
    pub subscriptions_deleted: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub country: String,
    pub name_changed_count: u32,
    pub created_at: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Provision an account row for an identity the auth subsystem created.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    AppJson(req): AppJson<CreateUserRequest>,
) -> Result<Json<JSend<UserResponse>>, ApiError> {
    session.require_role(UserRole::Admin)?;

    if req.username.trim().is_empty() {
        return Err(ApiError::bad_request("username must not be empty"));
    }

    let taken = state
        .db
        .username_exists(&req.username)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if taken {
        return Err(ApiError::conflict(format!(
            "username '{}' is already in use",
            req.username
        )));
    }

    let now = Utc::now();
    let user = UserRecord {
        id: uuid::Uuid::new_v4().to_string(),
        username: req.username,
        email: req.email,
        country: req.country,
        name_changed_count: 0,
        created_at: now,
        updated_at: now,
    };
    state
        .db
        .put_user(&user)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(user_id = %user.id, username = %user.username, "created user");
    Ok(JSend::success(UserResponse {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        country: user.country.clone(),
        name_changed_count: user.name_changed_count,
        created_at: user.created_at.to_rfc3339(),
    }))
}

pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let stats = state
        .db
        .purge_all()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::warn!(
        images = stats.images,
        users = stats.users,
        subscriptions = stats.subscriptions,
        "Purged all data"
    );

    Ok(JSend::success(PurgeResponse {
        images_deleted: stats.images,
        emotes_deleted: stats.emotes,
        features_deleted: stats.features,
        users_deleted: stats.users,
        subscriptions_deleted: stats.subscriptions,
    }))
}

/// Inject the stream info blob the poller would normally publish.
pub async fn put_streaminfo(
    State(state): State<Arc<AppState>>,
    AppJson(info): AppJson<serde_json::Value>,
) -> Result<Json<JSend<()>>, ApiError> {
    state
        .cache
        .set_stream_info(&info)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(JSend::success(()))
}
