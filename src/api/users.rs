// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! User endpoints: registration, login, current user, account deletion.
//!
//! Registration and login are the token-issuing flows; everything else on
//! this surface consumes tokens. Account deletion goes through the
//! consistent deleter so owned posts and their media are cleaned up with
//! the account.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    audit::{AuditEvent, AuditEventType},
    auth::{Auth, Role},
    error::ApiError,
    media::ConsistentDeleter,
    models::User,
    state::AppState,
};

/// Registration request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful authentication response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    pub username: String,
    pub role: Role,
}

/// Public view of a user row.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            bio: user.bio.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Register a new account and issue its first token.
#[utoipa::path(
    post,
    path = "/api/users/register",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let username = request.username.trim();
    let email = request.email.trim();

    if username.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request(
            "username, email and password are required",
        ));
    }

    let digest = state.passwords.digest(&request.password);
    let user = {
        let mut store = state.store.write().await;
        store.create_user(username, email, digest, Role::User)?
    };

    let token = state
        .tokens
        .issue(&user.username, user.role)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {e}")))?;

    state.audit.record(
        AuditEvent::new(AuditEventType::UserRegistered)
            .by(&user.username)
            .on("user", user.id.to_string()),
    );

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            username: user.username,
            role: user.role,
        }),
    ))
}

/// Log in with username/password and receive a fresh token.
#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    // One error for both unknown user and wrong password; the response
    // must not reveal which half failed.
    let invalid = || ApiError::new(StatusCode::UNAUTHORIZED, "Invalid username or password");

    let (username, role) = {
        let store = state.store.read().await;
        let user = store.user_by_username(request.username.trim()).ok_or_else(invalid)?;
        if !state.passwords.matches(&request.password, &user.password_digest) {
            return Err(invalid());
        }
        (user.username.clone(), user.role)
    };

    let token = state
        .tokens
        .issue(&username, role)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {e}")))?;

    Ok(Json(AuthResponse {
        token,
        username,
        role,
    }))
}

/// Get the current authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    Auth(principal): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let store = state.store.read().await;
    let user = store
        .user_by_username(&principal.subject)
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(UserResponse::from(user)))
}

/// Delete an account (self or admin).
///
/// Sweeps media for every post the account owns, then lets the relational
/// cascade remove the rows.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = u64, Path, description = "User to delete")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Not the account owner"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    Auth(principal): Auth,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    {
        let store = state.store.read().await;
        let user = store
            .user_by_id(id)
            .ok_or_else(|| ApiError::not_found(format!("User {id} not found")))?;
        if !principal.may_modify(user) {
            return Err(ApiError::forbidden(
                "Only the account owner or an admin may delete this account",
            ));
        }
    }

    let cleanup = ConsistentDeleter::from_state(&state).delete_user(id).await?;

    state.audit.record(
        AuditEvent::new(AuditEventType::UserDeleted)
            .by(&principal.subject)
            .on("user", id.to_string())
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

    fn register_request(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn register_issues_a_verifiable_token() {
        let state = AppState::default();

        let (status, Json(response)) =
            register(State(state.clone()), Json(register_request("alice")))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.username, "alice");
        assert_eq!(response.role, Role::User);

        let claims = state.tokens.verify(&response.token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::User);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let state = AppState::default();
        register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap();

        let err = register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_round_trips_registration() {
        let state = AppState::default();
        register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap();

        let Json(response) = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "alice".to_string(),
                password: "hunter2".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(state.tokens.verify(&response.token).unwrap().sub, "alice");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_user_alike() {
        let state = AppState::default();
        register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap();

        let wrong_password = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "alice".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await
        .unwrap_err();
        let unknown_user = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "nobody".to_string(),
                password: "hunter2".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.message, unknown_user.message);
    }

    #[tokio::test]
    async fn users_may_delete_only_themselves() {
        let state = AppState::default();
        register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap();
        register(State(state.clone()), Json(register_request("bob")))
            .await
            .unwrap();

        let (alice_id, bob_id) = {
            let store = state.store.read().await;
            (
                store.user_by_username("alice").unwrap().id,
                store.user_by_username("bob").unwrap().id,
            )
        };

        let alice = crate::auth::Principal {
            subject: "alice".to_string(),
            role: Role::User,
        };

        let err = delete_user(Auth(alice.clone()), Path(bob_id), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let status = delete_user(Auth(alice), Path(alice_id), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!state.store.read().await.username_exists("alice"));
    }
}
