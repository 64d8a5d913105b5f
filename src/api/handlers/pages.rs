use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;

use crate::api::response::ApiError;
use crate::api::session::{Session, UserRole};
use crate::views;
use crate::AppState;

/// The bigscreen: a single read-through of the stream info blob the
/// poller keeps warm.
pub async fn bigscreen(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let stream_info = state
        .cache
        .stream_info()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Html(views::bigscreen_page(stream_info.as_ref())))
}

pub async fn admin_index(session: Session) -> Result<Html<String>, ApiError> {
    session.require_user()?;
    if !session.has_any_role() {
        return Err(ApiError::forbidden("Insufficient privileges"));
    }

    Ok(Html(views::admin_index_page(&session)))
}

pub async fn admin_users(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, ApiError> {
    session.require_role(UserRole::Moderator)?;

    let users = state
        .db
        .get_all_users()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Html(views::admin_users_page(&session, &users)))
}

pub async fn admin_subscriptions(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, ApiError> {
    session.require_role(UserRole::Finance)?;

    let subs = state
        .db
        .get_all_subscriptions()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Html(views::admin_subscriptions_page(&session, &subs)))
}

pub async fn admin_emotes(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, ApiError> {
    session.require_role(UserRole::Emotes)?;

    let emotes = state
        .db
        .get_all_emotes()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Html(views::admin_emotes_page(&session, &emotes)))
}

pub async fn admin_features(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, ApiError> {
    session.require_role(UserRole::Features)?;

    let features = state
        .db
        .get_all_features()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Html(views::admin_features_page(&session, &features)))
}
