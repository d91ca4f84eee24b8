// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Presigned-URL upload flow.
//!
//! Clients never stream media through this service. They request a signed
//! upload URL for a generated key, PUT the bytes straight to the object
//! store, then attach the key (or a signed view URL derived from it) to a
//! post. Upload URLs live 15 minutes, download URLs 1 hour.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    auth::Auth,
    error::ApiError,
    objects::{DOWNLOAD_URL_TTL, UPLOAD_URL_TTL},
    state::AppState,
};

/// Kind of media being uploaded; decides the destination folder.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Reel,
}

impl MediaKind {
    fn folder(self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
            MediaKind::Reel => "reels",
        }
    }
}

/// Request for a signed upload URL.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PresignUploadRequest {
    pub kind: MediaKind,
    /// File extension including or excluding the leading dot.
    pub extension: String,
    pub content_type: String,
}

/// Signed upload URL and the key it was minted for.
#[derive(Debug, Serialize, ToSchema)]
pub struct PresignUploadResponse {
    /// Object key to store as the post's media reference.
    pub key: String,
    /// PUT target, valid for `expires_in_secs`.
    pub upload_url: String,
    pub expires_in_secs: u64,
}

/// Query for a signed download URL.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DownloadUrlQuery {
    /// Object key to read.
    pub key: String,
}

/// Signed download URL.
#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadUrlResponse {
    pub url: String,
    pub expires_in_secs: u64,
}

/// Mint a signed upload URL for a fresh object key.
#[utoipa::path(
    post,
    path = "/api/uploads/presign",
    tag = "Uploads",
    request_body = PresignUploadRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Signed upload URL", body = PresignUploadResponse),
        (status = 400, description = "Invalid extension or content type"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn presign_upload(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Json(request): Json<PresignUploadRequest>,
) -> Result<Json<PresignUploadResponse>, ApiError> {
    let extension = request.extension.trim().trim_start_matches('.');
    if extension.is_empty() || extension.contains('/') {
        return Err(ApiError::bad_request("Invalid file extension"));
    }
    if request.content_type.trim().is_empty() {
        return Err(ApiError::bad_request("content_type is required"));
    }

    let key = format!("{}/{}.{}", request.kind.folder(), Uuid::new_v4(), extension);
    let upload_url = state
        .objects
        .signed_upload_url(&key, &request.content_type, UPLOAD_URL_TTL)
        .map_err(|e| ApiError::internal(format!("Failed to sign upload URL: {e}")))?;

    tracing::info!(subject = %principal.subject, %key, "issued signed upload URL");

    Ok(Json(PresignUploadResponse {
        key,
        upload_url,
        expires_in_secs: UPLOAD_URL_TTL.as_secs(),
    }))
}

/// Mint a signed download URL for an existing key.
#[utoipa::path(
    get,
    path = "/api/uploads/download-url",
    tag = "Uploads",
    params(DownloadUrlQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Signed download URL", body = DownloadUrlResponse),
        (status = 400, description = "Missing key"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn download_url(
    Auth(_principal): Auth,
    Query(query): Query<DownloadUrlQuery>,
    State(state): State<AppState>,
) -> Result<Json<DownloadUrlResponse>, ApiError> {
    let key = query.key.trim();
    if key.is_empty() {
        return Err(ApiError::bad_request("key is required"));
    }

    let url = state
        .objects
        .signed_download_url(key, DOWNLOAD_URL_TTL)
        .map_err(|e| ApiError::internal(format!("Failed to sign download URL: {e}")))?;

    Ok(Json(DownloadUrlResponse {
        url,
        expires_in_secs: DOWNLOAD_URL_TTL.as_secs(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Principal, Role};
    use crate::media::resolve_media_key;

    fn alice() -> Principal {
        Principal {
            subject: "alice".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn presigned_key_lands_in_the_kind_folder() {
        let state = AppState::default();

        let Json(response) = presign_upload(
            Auth(alice()),
            State(state),
            Json(PresignUploadRequest {
                kind: MediaKind::Image,
                extension: ".jpg".to_string(),
                content_type: "image/jpeg".to_string(),
            }),
        )
        .await
        .unwrap();

        assert!(response.key.starts_with("images/"));
        assert!(response.key.ends_with(".jpg"));
        assert_eq!(response.expires_in_secs, 15 * 60);
        assert!(response.upload_url.contains(&response.key));
    }

    #[tokio::test]
    async fn signed_upload_url_resolves_back_to_its_key() {
        let state = AppState::default();

        let Json(response) = presign_upload(
            Auth(alice()),
            State(state),
            Json(PresignUploadRequest {
                kind: MediaKind::Video,
                extension: "mp4".to_string(),
                content_type: "video/mp4".to_string(),
            }),
        )
        .await
        .unwrap();

        // The signed URL stored as a media reference must resolve to the
        // same key the upload was minted for.
        assert_eq!(
            resolve_media_key(&response.upload_url).as_deref(),
            Some(response.key.as_str())
        );
    }

    #[tokio::test]
    async fn bad_extension_is_rejected() {
        let state = AppState::default();
        let err = presign_upload(
            Auth(alice()),
            State(state),
            Json(PresignUploadRequest {
                kind: MediaKind::Image,
                extension: "".to_string(),
                content_type: "image/jpeg".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn download_url_carries_expiry() {
        let state = AppState::default();
        let Json(response) = download_url(
            Auth(alice()),
            Query(DownloadUrlQuery {
                key: "images/a.jpg".to_string(),
            }),
            State(state),
        )
        .await
        .unwrap();

        assert_eq!(response.expires_in_secs, 60 * 60);
        assert!(response.url.contains("images/a.jpg"));
    }
}
