use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    let mut router = Router::new()
        // Uploads
        .route("/uploads", get(handlers::list_uploads))
        .route(
            "/uploads",
            post(handlers::create_uploads).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/uploads/stats", get(handlers::view_stats))
        .route("/uploads/bulk-delete", post(handlers::bulk_delete_uploads))
        .route(
            "/uploads/bulk-archive",
            post(handlers::bulk_archive_uploads),
        )
        .route("/uploads/:id", get(handlers::get_upload))
        .route("/uploads/:id", delete(handlers::delete_upload))
        .route("/uploads/:id/download", get(handlers::download_upload))
        .route("/uploads/:id/archive", post(handlers::archive_upload))
        .route("/uploads/:id/unarchive", post(handlers::unarchive_upload))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled. Purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
