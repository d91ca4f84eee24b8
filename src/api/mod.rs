// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::middleware::enforce,
    media::ReconciliationReport,
    models::Post,
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod posts;
pub mod uploads;
pub mod users;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users/me", get(users::me))
        .route("/api/users/{id}", delete(users::delete_user))
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/api/posts/{id}",
            get(posts::get_post).delete(posts::delete_post),
        )
        .route("/api/posts/user/{username}", get(posts::posts_by_user))
        .route("/api/uploads/presign", post(uploads::presign_upload))
        .route("/api/uploads/download-url", get(uploads::download_url))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{id}", delete(admin::delete_user))
        .route("/api/admin/users/{id}/promote", post(admin::promote_user))
        .route("/api/admin/posts", get(admin::list_posts))
        .route("/api/admin/posts/{id}", delete(admin::delete_post))
        .route(
            "/api/admin/media/files",
            get(admin::list_media_files).delete(admin::delete_media_file),
        )
        .route("/api/admin/media/sync", post(admin::media_sync))
        .route("/api/admin/media/cleanup", post(admin::media_cleanup))
        .route("/api/admin/audit/events", get(admin::audit_events))
        .route("/api/admin/stats", get(admin::stats))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Gate + policy run before every handler, unmatched paths included;
        // the rule table itself marks /docs and /health public.
        .layer(middleware::from_fn_with_state(state.clone(), enforce))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::register,
        users::login,
        users::me,
        users::delete_user,
        posts::create_post,
        posts::list_posts,
        posts::get_post,
        posts::posts_by_user,
        posts::delete_post,
        uploads::presign_upload,
        uploads::download_url,
        admin::list_users,
        admin::delete_user,
        admin::promote_user,
        admin::list_posts,
        admin::delete_post,
        admin::list_media_files,
        admin::delete_media_file,
        admin::media_sync,
        admin::media_cleanup,
        admin::audit_events,
        admin::stats
    ),
    components(
        schemas(
            health::HealthResponse,
            health::HealthChecks,
            users::RegisterRequest,
            users::LoginRequest,
            users::AuthResponse,
            users::UserResponse,
            posts::CreatePostRequest,
            Post,
            uploads::PresignUploadRequest,
            uploads::PresignUploadResponse,
            uploads::DownloadUrlResponse,
            uploads::MediaKind,
            admin::DeleteOutcome,
            admin::MediaFileItem,
            admin::CleanupRequest,
            admin::CleanupResponse,
            admin::AuditLogResponse,
            admin::SystemStatsResponse,
            ReconciliationReport
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Users", description = "Registration, login and accounts"),
        (name = "Posts", description = "Forum posts"),
        (name = "Uploads", description = "Presigned media uploads"),
        (name = "Admin", description = "Administration and reconciliation")
    )
)]
struct ApiDoc;
