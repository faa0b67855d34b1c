//! Router configuration for the picture API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    asset_thumbnail, create_asset_thumbnail, create_person_thumbnail,
    create_preview_file_picture, create_project_thumbnail, create_shot_thumbnail,
    create_working_file_thumbnail, person_thumbnail, preview_file_original,
    preview_file_preview, preview_file_thumbnail, preview_file_thumbnail_square,
    project_thumbnail, shot_thumbnail, working_file_thumbnail, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};

/// Slack added on top of the configured upload limit to cover multipart
/// framing overhead.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let body_limit = app_state.max_upload_size as usize + BODY_LIMIT_SLACK;

    // Entity thumbnails: one upload + one retrieval route per kind
    let thumbnail_routes = Router::new()
        .route(
            "/persons/:id/thumbnail",
            post(create_person_thumbnail).get(person_thumbnail),
        )
        .route(
            "/projects/:id/thumbnail",
            post(create_project_thumbnail).get(project_thumbnail),
        )
        .route(
            "/shots/:id/thumbnail",
            post(create_shot_thumbnail).get(shot_thumbnail),
        )
        .route(
            "/assets/:id/thumbnail",
            post(create_asset_thumbnail).get(asset_thumbnail),
        )
        .route(
            "/working-files/:id/thumbnail",
            post(create_working_file_thumbnail).get(working_file_thumbnail),
        );

    // Preview files: original upload plus the four variant retrievals
    let preview_routes = Router::new()
        .route("/preview-files/:id/picture", post(create_preview_file_picture))
        .route("/preview-files/:id/thumbnail", get(preview_file_thumbnail))
        .route(
            "/preview-files/:id/thumbnail-square",
            get(preview_file_thumbnail_square),
        )
        .route("/preview-files/:id/preview", get(preview_file_preview))
        .route("/preview-files/:id/original", get(preview_file_original));

    // Clone jwt_state for the middleware closure
    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .merge(thumbnail_routes)
        .merge(preview_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
