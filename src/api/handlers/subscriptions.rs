use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{Months, Utc};
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, JSend};
use crate::api::session::Session;
use crate::storage::models::{SubscriptionRecord, SubscriptionStatus, SubscriptionType};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub user_id: String,
    pub subscription_type: String,
    pub status: String,
    pub recurring: bool,
    pub end_date: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct StartSubscriptionRequest {
    pub subscription_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmSubscriptionRequest {
    #[serde(default)]
    pub recurring: bool,
}

/// Start a checkout: a NEW row the biller redirect refers back to.
/// Abandoned rows are purged by the expiry sweep after an hour.
pub async fn start_subscription(
    State(state): State<Arc<AppState>>,
    session: Session,
    AppJson(req): AppJson<StartSubscriptionRequest>,
) -> Result<Json<JSend<SubscriptionResponse>>, ApiError> {
    let user_id = session.require_user()?;

    let sub_type = SubscriptionType::find(&req.subscription_type)
        .ok_or_else(|| ApiError::bad_request("Unknown subscription type"))?;

    let now = Utc::now();
    let sub = SubscriptionRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        subscription_type: sub_type.id.to_string(),
        status: SubscriptionStatus::New,
        recurring: false,
        // Placeholder until the biller confirms payment
        end_date: now,
        created_at: now,
        updated_at: now,
    };
    state
        .db
        .put_subscription(&sub)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(subscription_id = %sub.id, user_id = %sub.user_id, "started checkout");
    Ok(JSend::success(subscription_response(&sub)))
}

/// Complete a checkout after the biller confirms payment: the NEW row goes
/// ACTIVE with a full billing period on the clock.
pub async fn confirm_subscription(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
    AppJson(req): AppJson<ConfirmSubscriptionRequest>,
) -> Result<Json<JSend<SubscriptionResponse>>, ApiError> {
    let user_id = session.require_user()?;

    let mut sub = state
        .db
        .find_subscription_by_id(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Subscription not found"))?;

    if sub.user_id != user_id {
        return Err(ApiError::forbidden("Not your subscription"));
    }
    if sub.status != SubscriptionStatus::New {
        return Err(ApiError::conflict("Subscription already processed"));
    }

    let sub_type = SubscriptionType::find(&sub.subscription_type)
        .ok_or_else(|| ApiError::internal("Subscription references an unknown type"))?;

    let now = Utc::now();
    let end_date = now
        .checked_add_months(Months::new(sub_type.billing_months()))
        .ok_or_else(|| ApiError::internal("End date out of range"))?;

    sub.status = SubscriptionStatus::Active;
    sub.recurring = req.recurring;
    sub.end_date = end_date;
    sub.updated_at = now;
    state
        .db
        .put_subscription(&sub)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    // The auth layer caches role/subscription state; tell it to reload.
    if let Err(e) = state.cache.flag_user_for_update(user_id).await {
        tracing::warn!(user_id, error = %e, "failed to flag user for update");
    }

    tracing::debug!(subscription_id = %sub.id, user_id = %sub.user_id, "confirmed subscription");
    Ok(JSend::success(subscription_response(&sub)))
}

fn subscription_response(sub: &SubscriptionRecord) -> SubscriptionResponse {
    SubscriptionResponse {
        id: sub.id.clone(),
        user_id: sub.user_id.clone(),
        subscription_type: sub.subscription_type.clone(),
        status: sub.status.to_string(),
        recurring: sub.recurring,
        end_date: sub.end_date.to_rfc3339(),
        created_at: sub.created_at.to_rfc3339(),
    }
}
