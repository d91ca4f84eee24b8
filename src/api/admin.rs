// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Admin-only API endpoints for system management.
//!
//! These endpoints require the Admin role and provide:
//! - User and post management (listing, promotion, deletion)
//! - Object-storage control (file listing, orphan scan, approved cleanup)
//! - Audit log queries
//! - System statistics

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit::{AuditEvent, AuditEventType},
    auth::AdminOnly,
    error::ApiError,
    media::{ConsistentDeleter, OrphanReconciler, ReconciliationReport},
    models::Post,
    objects::DOWNLOAD_URL_TTL,
    state::AppState,
};

use super::users::UserResponse;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Outcome of an admin deletion across both stores.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteOutcome {
    pub message: String,
    /// Id of the deleted entity.
    pub id: u64,
    /// Media objects removed alongside the row.
    pub media_removed: usize,
    /// Media keys whose removal failed; the reconciler collects them later.
    pub media_failed: Vec<String>,
}

/// One object-store file with a temporary view URL.
#[derive(Debug, Serialize, ToSchema)]
pub struct MediaFileItem {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Signed download URL (1 hour).
    pub url: String,
}

/// Query for deleting a single object-store file.
#[derive(Debug, Deserialize, IntoParams)]
pub struct MediaFileQuery {
    pub key: String,
}

/// Approved orphan keys to remove.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CleanupRequest {
    pub keys: Vec<String>,
}

/// Result of an approved cleanup run.
#[derive(Debug, Serialize, ToSchema)]
pub struct CleanupResponse {
    /// Objects actually removed; keys already gone or failing count as 0.
    pub deleted: usize,
}

/// Query parameters for audit log reads.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditQueryParams {
    /// Maximum number of events (default 100, max 1000).
    pub limit: Option<usize>,
}

/// Response for audit log queries.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogResponse {
    pub events: Vec<crate::audit::AuditEvent>,
    /// Total recorded events (before limit).
    pub total: usize,
}

/// System statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatsResponse {
    pub total_users: usize,
    pub total_posts: usize,
    pub total_comments: usize,
    /// Objects currently in the media store, if it could be listed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_media_objects: Option<usize>,
    pub audit_events: usize,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

// ============================================================================
// Server start time (for uptime calculation)
// ============================================================================

lazy_static::lazy_static! {
    static ref SERVER_START: std::time::Instant = std::time::Instant::now();
}

// ============================================================================
// User management
// ============================================================================

/// List all users.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_users(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Json<Vec<UserResponse>> {
    let store = state.store.read().await;
    Json(store.list_users().iter().map(UserResponse::from).collect())
}

/// Delete a user and everything they own, across both stores.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    params(("id" = u64, Path, description = "User to delete")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User deleted", body = DeleteOutcome),
        (status = 404, description = "User not found"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn delete_user(
    AdminOnly(admin): AdminOnly,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let cleanup = ConsistentDeleter::from_state(&state).delete_user(id).await?;

    state.audit.record(
        AuditEvent::new(AuditEventType::UserDeleted)
            .by(&admin.subject)
            .on("user", id.to_string())
            .with_details(serde_json::json!({
                "media_removed": cleanup.removed,
                "media_failed": cleanup.failed,
            })),
    );

    Ok(Json(DeleteOutcome {
        message: "User and all associated data deleted".to_string(),
        id,
        media_removed: cleanup.removed,
        media_failed: cleanup.failed,
    }))
}

/// Promote a user to admin.
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/promote",
    tag = "Admin",
    params(("id" = u64, Path, description = "User to promote")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User promoted", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn promote_user(
    AdminOnly(admin): AdminOnly,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = {
        let mut store = state.store.write().await;
        store.set_role(id, crate::auth::Role::Admin)?;
        store
            .user_by_id(id)
            .map(UserResponse::from)
            .ok_or_else(|| ApiError::not_found(format!("User {id} not found")))?
    };

    state.audit.record(
        AuditEvent::new(AuditEventType::UserPromoted)
            .by(&admin.subject)
            .on("user", id.to_string()),
    );

    Ok(Json(user))
}

// ============================================================================
// Post management
// ============================================================================

/// List all posts.
#[utoipa::path(
    get,
    path = "/api/admin/posts",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All posts", body = [Post]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_posts(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Json<Vec<Post>> {
    let store = state.store.read().await;
    Json(store.list_posts())
}

/// Delete any post across both stores.
#[utoipa::path(
    delete,
    path = "/api/admin/posts/{id}",
    tag = "Admin",
    params(("id" = u64, Path, description = "Post to delete")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Post deleted", body = DeleteOutcome),
        (status = 404, description = "Post not found"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn delete_post(
    AdminOnly(admin): AdminOnly,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let cleanup = ConsistentDeleter::from_state(&state).delete_post(id).await?;

    state.audit.record(
        AuditEvent::new(AuditEventType::PostDeleted)
            .by(&admin.subject)
            .on("post", id.to_string())
            .with_details(serde_json::json!({
                "media_removed": cleanup.removed,
                "media_failed": cleanup.failed,
            })),
    );

    Ok(Json(DeleteOutcome {
        message: "Post and associated media deleted".to_string(),
        id,
        media_removed: cleanup.removed,
        media_failed: cleanup.failed,
    }))
}

// ============================================================================
// Object-storage control
// ============================================================================

/// List object-store files with signed view URLs.
#[utoipa::path(
    get,
    path = "/api/admin/media/files",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Object-store listing", body = [MediaFileItem]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 503, description = "Object store unavailable")
    )
)]
pub async fn list_media_files(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<Vec<MediaFileItem>>, ApiError> {
    let entries = state
        .objects
        .list_entries()
        .map_err(|e| ApiError::new(axum::http::StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let url = state
            .objects
            .signed_download_url(&entry.key, DOWNLOAD_URL_TTL)
            .map_err(|e| ApiError::internal(format!("Failed to sign URL: {e}")))?;
        items.push(MediaFileItem {
            key: entry.key,
            size_bytes: entry.size_bytes,
            url,
        });
    }

    Ok(Json(items))
}

/// Delete one object-store file by key.
#[utoipa::path(
    delete,
    path = "/api/admin/media/files",
    tag = "Admin",
    params(MediaFileQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deletion attempted", body = CleanupResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 503, description = "Object store unavailable")
    )
)]
pub async fn delete_media_file(
    AdminOnly(admin): AdminOnly,
    Query(query): Query<MediaFileQuery>,
    State(state): State<AppState>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let existed = state
        .objects
        .delete_object(&query.key)
        .map_err(|e| ApiError::new(axum::http::StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    state.audit.record(
        AuditEvent::new(AuditEventType::OrphanCleanup)
            .by(&admin.subject)
            .on("media", &query.key),
    );

    Ok(Json(CleanupResponse {
        deleted: usize::from(existed),
    }))
}

/// Scan for orphaned media objects.
///
/// Read-only: reports the orphan set without deleting anything. Operators
/// review the report and submit the approved subset to the cleanup
/// endpoint; re-scanning right before cleanup narrows the race with
/// concurrent post creation.
#[utoipa::path(
    post,
    path = "/api/admin/media/sync",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reconciliation report", body = ReconciliationReport),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 503, description = "Scan aborted; a store could not be read")
    )
)]
pub async fn media_sync(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<ReconciliationReport>, ApiError> {
    let report = OrphanReconciler::from_state(&state).scan().await?;

    state.audit.record(
        AuditEvent::new(AuditEventType::OrphanScan)
            .by(&admin.subject)
            .with_details(serde_json::json!({
                "total_object_keys": report.total_object_keys,
                "total_referenced_keys": report.total_referenced_keys,
                "orphans": report.orphan_keys.len(),
            })),
    );

    Ok(Json(report))
}

/// Delete an approved set of orphan keys.
#[utoipa::path(
    post,
    path = "/api/admin/media/cleanup",
    tag = "Admin",
    request_body = CleanupRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cleanup result", body = CleanupResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn media_cleanup(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<CleanupRequest>,
) -> Json<CleanupResponse> {
    let keys: BTreeSet<String> = request.keys.into_iter().collect();
    let deleted = OrphanReconciler::from_state(&state).cleanup(&keys).await;

    state.audit.record(
        AuditEvent::new(AuditEventType::OrphanCleanup)
            .by(&admin.subject)
            .with_details(serde_json::json!({
                "approved": keys.len(),
                "deleted": deleted,
            })),
    );

    Json(CleanupResponse { deleted })
}

// ============================================================================
// Audit log & statistics
// ============================================================================

/// Read recent audit events, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/audit/events",
    tag = "Admin",
    params(AuditQueryParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Audit events", body = AuditLogResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn audit_events(
    AdminOnly(_admin): AdminOnly,
    Query(params): Query<AuditQueryParams>,
    State(state): State<AppState>,
) -> Json<AuditLogResponse> {
    let limit = params.limit.unwrap_or(100).min(1000);
    Json(AuditLogResponse {
        events: state.audit.recent(limit),
        total: state.audit.len(),
    })
}

/// Get system statistics.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "System statistics", body = SystemStatsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn stats(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
) -> Json<SystemStatsResponse> {
    let (total_users, total_posts, total_comments) = {
        let store = state.store.read().await;
        (store.user_count(), store.post_count(), store.comment_count())
    };

    // A store outage leaves the object count empty rather than failing the
    // whole stats call.
    let total_media_objects = state.objects.list_all_keys().ok().map(|keys| keys.len());

    state
        .audit
        .record(AuditEvent::new(AuditEventType::AdminAccess).by(&admin.subject));

    Json(SystemStatsResponse {
        total_users,
        total_posts,
        total_comments,
        total_media_objects,
        audit_events: state.audit.len(),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

// ============================================================================
// Tests
// ============================================================================
