// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Domain rows held by the relational store.
//!
//! `Post.image_url` / `Post.video_url` are *media references*: either a bare
//! object-storage key (`images/<uuid>.jpg`) or a previously-resolved access
//! URL carrying query parameters. They are canonicalized through
//! [`crate::media::resolve_media_key`] before any object-store operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

/// A resource with a single owning user, identified by username.
///
/// Ownership is the second authorization stage: the route policy only
/// guarantees an authenticated principal; handlers load the entity and check
/// the owner against the principal (admins pass unconditionally).
pub trait Owned {
    /// Username of the owning user.
    fn owner_username(&self) -> &str;
}

/// A registered forum user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique user identifier.
    pub id: u64,
    /// Unique username; also the token subject.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Peppered HMAC-SHA256 digest of the password. Never serialized.
    #[serde(skip)]
    pub password_digest: String,
    /// Authorization role.
    pub role: Role,
    /// Optional profile bio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Owned for User {
    fn owner_username(&self) -> &str {
        &self.username
    }
}

/// A forum post, possibly carrying media references.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Post {
    /// Unique post identifier.
    pub id: u64,
    /// Username of the author.
    pub author: String,
    /// Post body.
    pub content: String,
    /// Media reference for an attached image, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Media reference for an attached video, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Number of times the post has been shared.
    pub share_count: u64,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
}

impl Owned for Post {
    fn owner_username(&self) -> &str {
        &self.author
    }
}

/// A comment on a post. Removed by cascade when the post or author goes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A like on a post. Removed by cascade when the post or user goes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Like {
    pub id: u64,
    pub post_id: u64,
    pub username: String,
}
