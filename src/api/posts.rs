// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Post endpoints.
//!
//! Reading is public; creating requires authentication; deleting requires
//! the owner or an admin and runs through the consistent deleter so media
//! objects follow the row.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    audit::{AuditEvent, AuditEventType},
    auth::Auth,
    error::ApiError,
    media::ConsistentDeleter,
    models::Post,
    state::AppState,
};

/// Request body for creating a post.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub content: String,
    /// Media reference returned by the upload flow, if an image is attached.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Media reference returned by the upload flow, if a video is attached.
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Create a post authored by the current principal.
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "Posts",
    request_body = CreatePostRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Empty content"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_post(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    if request.content.trim().is_empty() {
        return Err(ApiError::bad_request("Post content must not be empty"));
    }

    let mut store = state.store.write().await;
    let post = store.create_post(
        &principal.subject,
        request.content.trim(),
        request.image_url.filter(|s| !s.is_empty()),
        request.video_url.filter(|s| !s.is_empty()),
    );

    Ok((StatusCode::CREATED, Json(post)))
}

/// List all posts, newest first.
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Posts",
    responses((status = 200, description = "All posts", body = [Post]))
)]
pub async fn list_posts(State(state): State<AppState>) -> Json<Vec<Post>> {
    let store = state.store.read().await;
    Json(store.list_posts())
}

/// Get one post by id.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "Posts",
    params(("id" = u64, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = Post),
        (status = 404, description = "Post not found")
    )
)]
pub async fn get_post(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<Post>, ApiError> {
    let store = state.store.read().await;
    store
        .post_by_id(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Post {id} not found")))
}

/// List a user's posts, newest first.
#[utoipa::path(
    get,
    path = "/api/posts/user/{username}",
    tag = "Posts",
    params(("username" = String, Path, description = "Author username")),
    responses((status = 200, description = "The user's posts", body = [Post]))
)]
pub async fn posts_by_user(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Json<Vec<Post>> {
    let store = state.store.read().await;
    Json(store.posts_by_author(&username))
}

/// Delete a post (owner or admin).
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "Posts",
    params(("id" = u64, Path, description = "Post to delete")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Post and media deleted"),
        (status = 403, description = "Not the post owner"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn delete_post(
    Auth(principal): Auth,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    {
        let store = state.store.read().await;
        let post = store
            .post_by_id(id)
            .ok_or_else(|| ApiError::not_found(format!("Post {id} not found")))?;
        if !principal.may_modify(post) {
            return Err(ApiError::forbidden(
                "Only the post owner or an admin may delete this post",
            ));
        }
    }

    let cleanup = ConsistentDeleter::from_state(&state).delete_post(id).await?;

    state.audit.record(
        AuditEvent::new(AuditEventType::PostDeleted)
            .by(&principal.subject)
            .on("post", id.to_string())
            .with_details(serde_json::json!({
                "media_removed": cleanup.removed,
                "media_failed": cleanup.failed,
            })),
    );

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Principal, Role};

    async fn state_with_users() -> AppState {
        let state = AppState::default();
        {
            let mut store = state.store.write().await;
            store
                .create_user("alice", "alice@example.com", "digest", Role::User)
                .unwrap();
            store
                .create_user("bob", "bob@example.com", "digest", Role::User)
                .unwrap();
            store
                .create_user("root", "root@example.com", "digest", Role::Admin)
                .unwrap();
        }
        state
    }

    fn principal(subject: &str, role: Role) -> Principal {
        Principal {
            subject: subject.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn create_and_fetch_post() {
        let state = state_with_users().await;

        let (status, Json(post)) = create_post(
            Auth(principal("alice", Role::User)),
            State(state.clone()),
            Json(CreatePostRequest {
                content: "  hello world  ".to_string(),
                image_url: None,
                video_url: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(post.author, "alice");
        assert_eq!(post.content, "hello world");

        let Json(fetched) = get_post(Path(post.id), State(state)).await.unwrap();
        assert_eq!(fetched.id, post.id);
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let state = state_with_users().await;
        let err = create_post(
            Auth(principal("alice", Role::User)),
            State(state),
            Json(CreatePostRequest {
                content: "   ".to_string(),
                image_url: None,
                video_url: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_owner_cannot_delete_but_admin_can() {
        let state = state_with_users().await;
        let post_id = {
            let mut store = state.store.write().await;
            store.create_post("alice", "mine", None, None).id
        };

        let err = delete_post(
            Auth(principal("bob", Role::User)),
            Path(post_id),
            State(state.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let status = delete_post(
            Auth(principal("root", Role::Admin)),
            Path(post_id),
            State(state.clone()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.store.read().await.post_by_id(post_id).is_none());
    }

    #[tokio::test]
    async fn deleting_missing_post_is_404() {
        let state = state_with_users().await;
        let err = delete_post(
            Auth(principal("alice", Role::User)),
            Path(999),
            State(state),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletion_records_an_audit_event() {
        let state = state_with_users().await;
        let post_id = {
            let mut store = state.store.write().await;
            store.create_post("alice", "mine", None, None).id
        };

        delete_post(
            Auth(principal("alice", Role::User)),
            Path(post_id),
            State(state.clone()),
        )
        .await
        .unwrap();

        let recent = state.audit.recent(1);
        assert_eq!(recent[0].event_type, AuditEventType::PostDeleted);
        assert_eq!(recent[0].resource_id.as_deref(), Some(&*post_id.to_string()));
    }
}
