// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Token claims and the per-request principal.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Owned;

use super::roles::Role;

/// Claim set carried inside a bearer token.
///
/// This is the wire shape: `sub` is the username, `role` the stored role
/// string, `iat`/`exp` are seconds since the Unix epoch. Unknown role
/// strings fail deserialization, which the codec surfaces as a malformed
/// token rather than a principal with a made-up role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the username the token was issued to.
    pub sub: String,
    /// Role at issuance time.
    pub role: Role,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

/// The authenticated identity attached to one request.
///
/// Derived fresh per request from a verified token; never persisted and
/// never shared across requests. This value is passed to handlers
/// explicitly instead of living in ambient request-global state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// Username of the authenticated user.
    pub subject: String,
    /// Role from the verified token.
    pub role: Role,
}

impl Principal {
    /// Build a principal from a verified claim set.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            role: claims.role,
        }
    }

    /// Check if this principal is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Ownership check: admins may modify anything, everyone else only
    /// resources they own.
    pub fn may_modify(&self, resource: &impl Owned) -> bool {
        self.is_admin() || resource.owner_username() == self.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Res(&'static str);

    impl Owned for Res {
        fn owner_username(&self) -> &str {
            self.0
        }
    }

    fn claims(sub: &str, role: Role) -> Claims {
        Claims {
            sub: sub.to_string(),
            role,
            iat: 1_700_000_000,
            exp: 1_700_086_400,
        }
    }

    #[test]
    fn principal_copies_subject_and_role() {
        let principal = Principal::from_claims(&claims("alice", Role::Admin));
        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.role, Role::Admin);
        assert!(principal.is_admin());
    }

    #[test]
    fn owner_may_modify_own_resource() {
        let principal = Principal::from_claims(&claims("alice", Role::User));
        assert!(principal.may_modify(&Res("alice")));
        assert!(!principal.may_modify(&Res("bob")));
    }

    #[test]
    fn admin_may_modify_anything() {
        let principal = Principal::from_claims(&claims("root", Role::Admin));
        assert!(principal.may_modify(&Res("bob")));
    }

    #[test]
    fn unknown_role_string_fails_deserialization() {
        let result = serde_json::from_str::<Claims>(
            r#"{"sub":"alice","role":"SUPERUSER","iat":1,"exp":2}"#,
        );
        assert!(result.is_err());
    }
}
