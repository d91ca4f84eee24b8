// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Route-based access policy.
//!
//! A static rule table maps (method, path pattern) to an access
//! requirement. The table is built once at process start and read
//! concurrently without synchronization.
//!
//! Evaluation precedence is fixed, independent of declaration order:
//! admin-only rules, then owner-or-admin rules, then authenticated rules,
//! then public rules, then the default (authenticated). Within one tier the
//! first declared match wins.
//!
//! `OwnerOrAdmin` is only half-decidable here: the policy can demand *some*
//! authenticated principal, but ownership needs the target entity, which
//! the consuming handler loads. Such routes therefore resolve to
//! [`Decision::RequiresOwnerCheck`].

use axum::http::Method;

use super::claims::Principal;

/// Access requirement attached to a route pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Anyone, authenticated or not.
    Public,
    /// Any authenticated principal.
    Authenticated,
    /// Admin principals only.
    RoleAdmin,
    /// Authenticated here; ownership checked by the handler.
    OwnerOrAdmin,
}

/// One row of the rule table.
#[derive(Debug, Clone)]
pub struct AccessRule {
    /// Method the rule applies to; `None` matches every method.
    method: Option<Method>,
    /// Path pattern: `*` matches one segment, a trailing `**` matches any
    /// remainder (including none).
    pattern: &'static str,
    requirement: Requirement,
}

impl AccessRule {
    const fn new(method: Option<Method>, pattern: &'static str, requirement: Requirement) -> Self {
        Self {
            method,
            pattern,
            requirement,
        }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        if let Some(ref m) = self.method {
            if m != method {
                return false;
            }
        }
        path_matches(self.pattern, path)
    }
}

/// Outcome of evaluating the policy for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed to the handler.
    Allow,
    /// Proceed, but the handler must verify ownership (or admin role)
    /// against the loaded entity.
    RequiresOwnerCheck,
    /// 401: no valid principal and the route requires one.
    Unauthorized,
    /// 403: principal present but lacks the required role.
    Forbidden,
}

/// Static route policy evaluated after the authentication gate.
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    /// The forum's rule table.
    pub fn standard() -> Self {
        use Requirement::*;

        Self::with_rules(vec![
            // Admin surface
            AccessRule::new(None, "/api/admin/**", RoleAdmin),
            // Deletion is owner-or-admin; ownership resolved by the handler
            AccessRule::new(Some(Method::DELETE), "/api/posts/*", OwnerOrAdmin),
            AccessRule::new(Some(Method::DELETE), "/api/users/*", OwnerOrAdmin),
            // Authenticated surface
            AccessRule::new(Some(Method::POST), "/api/posts", Authenticated),
            AccessRule::new(None, "/api/uploads/**", Authenticated),
            AccessRule::new(Some(Method::GET), "/api/users/me", Authenticated),
            AccessRule::new(None, "/api/comments/**", Authenticated),
            AccessRule::new(None, "/api/likes/**", Authenticated),
            // Public surface
            AccessRule::new(Some(Method::GET), "/health", Public),
            AccessRule::new(Some(Method::POST), "/api/users/register", Public),
            AccessRule::new(Some(Method::POST), "/api/users/login", Public),
            AccessRule::new(Some(Method::GET), "/api/posts", Public),
            AccessRule::new(Some(Method::GET), "/api/posts/*", Public),
            AccessRule::new(Some(Method::GET), "/api/posts/user/**", Public),
            AccessRule::new(None, "/docs/**", Public),
            AccessRule::new(None, "/api-doc/**", Public),
        ])
    }

    /// Build a policy from an explicit rule list.
    pub fn with_rules(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// Evaluate the first matching rule under the fixed tier precedence.
    pub fn check(&self, method: &Method, path: &str, principal: Option<&Principal>) -> Decision {
        const TIERS: [Requirement; 4] = [
            Requirement::RoleAdmin,
            Requirement::OwnerOrAdmin,
            Requirement::Authenticated,
            Requirement::Public,
        ];

        for tier in TIERS {
            let matched = self
                .rules
                .iter()
                .any(|r| r.requirement == tier && r.matches(method, path));
            if matched {
                return Self::decide(tier, principal);
            }
        }

        // No rule matched: default to requiring authentication.
        Self::decide(Requirement::Authenticated, principal)
    }

    fn decide(requirement: Requirement, principal: Option<&Principal>) -> Decision {
        match (requirement, principal) {
            (Requirement::Public, _) => Decision::Allow,
            (_, None) => Decision::Unauthorized,
            (Requirement::Authenticated, Some(_)) => Decision::Allow,
            (Requirement::OwnerOrAdmin, Some(_)) => Decision::RequiresOwnerCheck,
            (Requirement::RoleAdmin, Some(p)) if p.is_admin() => Decision::Allow,
            (Requirement::RoleAdmin, Some(_)) => Decision::Forbidden,
        }
    }
}

/// Segment-wise pattern match. `*` consumes exactly one segment; a trailing
/// `**` consumes any remainder, including an empty one.
fn path_matches(pattern: &str, path: &str) -> bool {
    fn split(s: &str) -> impl Iterator<Item = &str> {
        s.split('/').filter(|seg| !seg.is_empty())
    }

    let pattern: Vec<&str> = split(pattern).collect();
    let path: Vec<&str> = split(path).collect();

    let mut i = 0;
    for (p, seg) in pattern.iter().zip(path.iter()) {
        if *p == "**" {
            return true;
        }
        if *p != "*" && p != seg {
            return false;
        }
        i += 1;
    }

    // Pattern exhausted its zip: either both ran out together, or the
    // remaining pattern is exactly a trailing `**`.
    match pattern.get(i) {
        Some(&"**") => true,
        Some(_) => false,
        None => path.len() == i,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn principal(role: Role) -> Principal {
        Principal {
            subject: "alice".to_string(),
            role,
        }
    }

    #[test]
    fn pattern_matching_semantics() {
        assert!(path_matches("/api/posts", "/api/posts"));
        assert!(!path_matches("/api/posts", "/api/posts/5"));
        assert!(path_matches("/api/posts/*", "/api/posts/5"));
        assert!(!path_matches("/api/posts/*", "/api/posts/5/share"));
        assert!(path_matches("/api/admin/**", "/api/admin"));
        assert!(path_matches("/api/admin/**", "/api/admin/users/5"));
        assert!(!path_matches("/api/admin/**", "/api/posts"));
        assert!(path_matches("/api/posts/user/**", "/api/posts/user/alice"));
    }

    #[test]
    fn admin_route_requires_admin_role() {
        let policy = AccessPolicy::standard();
        let path = "/api/admin/users/5";

        // No token: 401.
        assert_eq!(
            policy.check(&Method::DELETE, path, None),
            Decision::Unauthorized
        );
        // USER token: 403.
        assert_eq!(
            policy.check(&Method::DELETE, path, Some(&principal(Role::User))),
            Decision::Forbidden
        );
        // ADMIN token: allowed.
        assert_eq!(
            policy.check(&Method::DELETE, path, Some(&principal(Role::Admin))),
            Decision::Allow
        );
    }

    #[test]
    fn post_deletion_defers_to_owner_check() {
        let policy = AccessPolicy::standard();
        assert_eq!(
            policy.check(&Method::DELETE, "/api/posts/5", None),
            Decision::Unauthorized
        );
        assert_eq!(
            policy.check(&Method::DELETE, "/api/posts/5", Some(&principal(Role::User))),
            Decision::RequiresOwnerCheck
        );
    }

    #[test]
    fn public_routes_allow_anonymous() {
        let policy = AccessPolicy::standard();
        assert_eq!(
            policy.check(&Method::POST, "/api/users/login", None),
            Decision::Allow
        );
        assert_eq!(
            policy.check(&Method::GET, "/api/posts/17", None),
            Decision::Allow
        );
        assert_eq!(policy.check(&Method::GET, "/health", None), Decision::Allow);
    }

    #[test]
    fn unmatched_paths_default_to_authenticated() {
        let policy = AccessPolicy::standard();
        assert_eq!(
            policy.check(&Method::GET, "/api/unknown", None),
            Decision::Unauthorized
        );
        assert_eq!(
            policy.check(&Method::GET, "/api/unknown", Some(&principal(Role::User))),
            Decision::Allow
        );
    }

    #[test]
    fn method_restricted_rules_do_not_leak_across_methods() {
        let policy = AccessPolicy::standard();
        // GET /api/posts is public, but POST is authenticated-only.
        assert_eq!(policy.check(&Method::GET, "/api/posts", None), Decision::Allow);
        assert_eq!(
            policy.check(&Method::POST, "/api/posts", None),
            Decision::Unauthorized
        );
    }

    #[test]
    fn admin_tier_wins_over_overlapping_public_rule() {
        // Precedence is by tier, not declaration order: a public rule
        // declared first does not shadow an admin rule on the same path.
        let policy = AccessPolicy::with_rules(vec![
            AccessRule::new(None, "/api/things/**", Requirement::Public),
            AccessRule::new(None, "/api/things/**", Requirement::RoleAdmin),
        ]);

        assert_eq!(
            policy.check(&Method::GET, "/api/things/1", None),
            Decision::Unauthorized
        );
        assert_eq!(
            policy.check(&Method::GET, "/api/things/1", Some(&principal(Role::Admin))),
            Decision::Allow
        );
    }
}
