// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Per-request authentication gate.
//!
//! The gate turns an incoming request's headers into either a
//! [`Principal`] or an explicit reason for anonymity. It has two states per
//! request and the transition is one-way: a request starts unauthenticated
//! and becomes `Authenticated(Principal)` at most once.
//!
//! A missing or non-`Bearer` authorization header is not an error: the
//! request simply stays anonymous and the route policy decides whether that
//! is acceptable. A verified token whose subject no longer exists in the
//! user store also stays anonymous - identity is only as fresh as the user
//! row behind it.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::store::InMemoryStore;

use super::claims::Principal;
use super::token::{TokenCodec, TokenError};

/// Why a request stayed anonymous. Used for logging (with the raw token
/// never included) and for mapping policy denials to error codes.
#[derive(Debug)]
pub enum AnonymousReason {
    /// No authorization header on the request.
    NoToken,
    /// Header present but not of the form `Bearer <token>`.
    MalformedHeader,
    /// Token present but failed verification.
    Token(TokenError),
    /// Token verified but the subject has no live user row.
    UnknownSubject,
}

impl std::fmt::Display for AnonymousReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnonymousReason::NoToken => write!(f, "no bearer token"),
            AnonymousReason::MalformedHeader => write!(f, "malformed authorization header"),
            AnonymousReason::Token(e) => write!(f, "{e}"),
            AnonymousReason::UnknownSubject => write!(f, "subject no longer exists"),
        }
    }
}

/// Outcome of running the gate for one request.
#[derive(Debug)]
pub enum Authentication {
    Authenticated(Principal),
    Anonymous(AnonymousReason),
}

impl Authentication {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Authentication::Authenticated(p) => Some(p),
            Authentication::Anonymous(_) => None,
        }
    }

    pub fn into_parts(self) -> (Option<Principal>, Option<AnonymousReason>) {
        match self {
            Authentication::Authenticated(p) => (Some(p), None),
            Authentication::Anonymous(r) => (None, Some(r)),
        }
    }
}

/// Reconstructs request identity from the `Authorization` header.
pub struct AuthenticationGate {
    codec: Arc<TokenCodec>,
}

impl AuthenticationGate {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Authenticate one request from its headers.
    ///
    /// The caller supplies the user store (under its own read lock) so the
    /// verified subject can be checked against live rows.
    pub fn authenticate(&self, headers: &HeaderMap, store: &InMemoryStore) -> Authentication {
        let token = match bearer_token(headers) {
            Ok(Some(token)) => token,
            Ok(None) => return Authentication::Anonymous(AnonymousReason::NoToken),
            Err(()) => return Authentication::Anonymous(AnonymousReason::MalformedHeader),
        };

        let claims = match self.codec.verify(token) {
            Ok(claims) => claims,
            Err(e) => return Authentication::Anonymous(AnonymousReason::Token(e)),
        };

        // Do not trust a valid-but-stale token for a deleted user.
        if !store.username_exists(&claims.sub) {
            return Authentication::Anonymous(AnonymousReason::UnknownSubject);
        }

        Authentication::Authenticated(Principal::from_claims(&claims))
    }
}

/// Extract the bearer token from the `Authorization` header.
///
/// `Ok(None)` when the header is absent; `Err(())` when it is present but
/// not a well-formed `Bearer <token>` value.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ()> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| ())?;
    let token = value.strip_prefix("Bearer ").ok_or(())?.trim();
    if token.is_empty() {
        return Err(());
    }
    Ok(Some(token))
}
