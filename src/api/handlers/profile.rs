use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::Form;
use chrono::Utc;
use serde::Deserialize;

use crate::api::response::ApiError;
use crate::api::session::Session;
use crate::storage::models::UserRecord;
use crate::views::{self, ProfileFlash};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
}

pub async fn show_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, ApiError> {
    let user_id = session.require_user()?;
    let (user, has_active) = load_profile(&state, user_id)?;

    Ok(Html(views::profile_page(
        &user,
        has_active,
        state.config.profile.name_change_limit,
        &ProfileFlash::None,
    )))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Result<Html<String>, ApiError> {
    let user_id = session.require_user()?;
    let (user, has_active) = load_profile(&state, user_id)?;
    let limit = state.config.profile.name_change_limit;

    let render = |user: &UserRecord, flash: &ProfileFlash| {
        Html(views::profile_page(user, has_active, limit, flash))
    };

    // A disabled username input is not submitted, so an empty field means
    // "leave it alone".
    let username_changed = !form.username.is_empty() && form.username != user.username;

    if username_changed {
        if user.name_changed_count >= limit {
            return Ok(render(
                &user,
                &ProfileFlash::Error("You have no more name changes available".to_string()),
            ));
        }
        if !valid_username(&form.username) {
            return Ok(render(
                &user,
                &ProfileFlash::Error(
                    "Username must be 4-20 characters of A-z, 0-9 and underscores".to_string(),
                ),
            ));
        }
        let taken = state
            .db
            .username_exists(&form.username)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        if taken {
            return Ok(render(
                &user,
                &ProfileFlash::Error("Username is already taken".to_string()),
            ));
        }
    }

    state
        .db
        .update_user_profile(
            &user.id,
            username_changed.then_some(form.username.as_str()),
            Some(form.email.as_str()),
            Some(form.country.as_str()),
        )
        .map_err(|e| ApiError::internal(e.to_string()))?;

    if username_changed {
        // Chat and the auth layer render the cached name until told otherwise.
        if let Err(e) = state.cache.flag_user_for_update(&user.id).await {
            tracing::warn!(user_id = %user.id, error = %e, "failed to flag user for update");
        }
    }

    let (user, _) = load_profile(&state, user_id)?;
    Ok(render(&user, &ProfileFlash::Updated))
}

fn load_profile(state: &AppState, user_id: &str) -> Result<(UserRecord, bool), ApiError> {
    let user = state
        .db
        .get_user(user_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let has_active = state
        .db
        .find_active_subscription(user_id, Utc::now())
        .map_err(|e| ApiError::internal(e.to_string()))?
        .is_some();

    Ok((user, has_active))
}

fn valid_username(name: &str) -> bool {
    (4..=20).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
