use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Slack over the file ceiling so the pipeline's own size check fires
    // before the transport limit does.
    let upload_limit = state.config.images.max_upload_size as usize + 1024 * 1024;

    let mut router = Router::new()
        // Pages
        .route("/bigscreen", get(handlers::bigscreen))
        .route("/profile", get(handlers::show_profile))
        .route("/profile", post(handlers::update_profile))
        .route("/admin", get(handlers::admin_index))
        .route("/admin/users", get(handlers::admin_users))
        .route("/admin/subscriptions", get(handlers::admin_subscriptions))
        .route("/admin/emotes", get(handlers::admin_emotes))
        .route("/admin/features", get(handlers::admin_features))
        // Images
        .route("/images/:name", get(handlers::serve_image))
        .route(
            "/admin/images",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/admin/images", get(handlers::list_images))
        .route("/admin/images/:id", get(handlers::get_image))
        .route("/admin/images/:id", delete(handlers::delete_image))
        // Emotes and flair features
        .route("/emotes", get(handlers::list_emotes))
        .route("/admin/emotes", post(handlers::create_emote))
        .route("/admin/emotes/:id", delete(handlers::delete_emote))
        .route("/features", get(handlers::list_features))
        .route("/admin/features", post(handlers::create_feature))
        .route("/admin/features/:id", delete(handlers::delete_feature))
        // Subscriptions
        .route("/subscriptions", post(handlers::start_subscription))
        .route(
            "/subscriptions/:id/confirm",
            post(handlers::confirm_subscription),
        )
        // Users
        .route("/admin/users", post(handlers::create_user))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled — purge and cache injection routes are available.");
        router = router
            .route("/admin/purge", delete(handlers::admin_purge))
            .route("/admin/streaminfo", put(handlers::put_streaminfo));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
