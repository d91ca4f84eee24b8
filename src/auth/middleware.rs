// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Authentication middleware and handler extractors.
//!
//! The [`enforce`] middleware runs the gate and the policy for every
//! request before any handler executes. Requests that pass have their
//! [`Principal`] (if any) inserted into request extensions; denials are
//! answered with the structured JSON error body and never reach
//! application logic.
//!
//! Handlers receive identity through extractors rather than ambient state:
//! [`Auth`] requires a principal, [`AdminOnly`] additionally requires the
//! admin role, [`OptionalAuth`] never rejects.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::state::AppState;

use super::gate::{AnonymousReason, Authentication};
use super::policy::Decision;
use super::{AuthError, Principal};

/// Gate + policy enforcement, applied to the whole router.
///
/// Every outcome is logged with the request path; the raw token value is
/// never logged.
pub async fn enforce(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let authentication = {
        let store = state.store.read().await;
        state.gate.authenticate(request.headers(), &store)
    };
    let (principal, reason) = authentication.into_parts();

    match &reason {
        // A request without any token is ordinary traffic.
        Some(AnonymousReason::NoToken) | None => {}
        Some(other) => warn!(%path, reason = %other, "request token rejected"),
    }

    match state.policy.check(&method, &path, principal.as_ref()) {
        Decision::Allow | Decision::RequiresOwnerCheck => {
            if let Some(principal) = principal {
                debug!(%path, subject = %principal.subject, "request authenticated");
                request.extensions_mut().insert(principal);
            }
            next.run(request).await
        }
        Decision::Unauthorized => {
            let error = reason
                .as_ref()
                .map(AuthError::from)
                .unwrap_or(AuthError::MissingAuthHeader);
            warn!(%path, error_code = error.error_code(), "rejecting unauthenticated request");
            error.into_response()
        }
        Decision::Forbidden => {
            warn!(%path, "rejecting request lacking required role");
            AuthError::InsufficientPermissions.into_response()
        }
    }
}

/// Extractor for authenticated principals.
///
/// Prefers the principal placed in extensions by [`enforce`]; falls back to
/// running the gate directly so handlers can also be exercised without the
/// middleware (as in tests).
pub struct Auth(pub Principal);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>().cloned() {
            return Ok(Auth(principal));
        }

        let store = state.store.read().await;
        match state.gate.authenticate(&parts.headers, &store) {
            Authentication::Authenticated(principal) => Ok(Auth(principal)),
            Authentication::Anonymous(reason) => Err(AuthError::from(&reason)),
        }
    }
}

/// Extractor that requires the admin role.
pub struct AdminOnly(pub Principal);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(principal) = Auth::from_request_parts(parts, state).await?;

        if !principal.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(principal))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` instead of rejecting when no valid principal is present.
pub struct OptionalAuth(pub Option<Principal>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(principal)) => Ok(OptionalAuth(Some(principal))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}
