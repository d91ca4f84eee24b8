// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::gate::AnonymousReason;
use super::token::TokenError;

/// Authorization failure surfaced to the client.
///
/// Everything except [`AuthError::InsufficientPermissions`] is a 401: the
/// request never established a valid principal. The 403 variant means a
/// principal was present but lacked the required role. Ownership denials
/// are raised by handlers (which hold the loaded entity), not here.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present where one is required
    MissingAuthHeader,
    /// Authorization header present but not `Bearer <token>`
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token verified but its subject no longer exists
    UnknownSubject,
    /// Principal present but the route requires a higher role
    InsufficientPermissions,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::InsufficientPermissions => "insufficient_permissions",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::UnknownSubject => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authentication required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::UnknownSubject => write!(f, "Token subject is no longer a registered user"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl From<&AnonymousReason> for AuthError {
    fn from(reason: &AnonymousReason) -> Self {
        match reason {
            AnonymousReason::NoToken => AuthError::MissingAuthHeader,
            AnonymousReason::MalformedHeader => AuthError::InvalidAuthHeader,
            AnonymousReason::Token(TokenError::BadSignature) => AuthError::InvalidSignature,
            AnonymousReason::Token(TokenError::Expired) => AuthError::TokenExpired,
            AnonymousReason::Token(_) => AuthError::MalformedToken,
            AnonymousReason::UnknownSubject => AuthError::UnknownSubject,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_auth_header");
    }

    #[tokio::test]
    async fn insufficient_permissions_returns_403() {
        let response = AuthError::InsufficientPermissions.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn anonymous_reasons_map_to_specific_errors() {
        let err = AuthError::from(&AnonymousReason::Token(TokenError::Expired));
        assert_eq!(err.error_code(), "token_expired");

        let err = AuthError::from(&AnonymousReason::UnknownSubject);
        assert_eq!(err.error_code(), "unknown_subject");
    }
}
