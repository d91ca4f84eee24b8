// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! In-memory relational store.
//!
//! This is the relational collaborator consumed by the rest of the service:
//! find/save/delete by key, uniqueness checks on username/email, and
//! cascading deletion of child rows (posts, comments, likes). Deletion of a
//! row is the linearization point for concurrent deletes of the same entity:
//! the second caller observes the missing row and gets [`StoreError::NotFound`].

use std::collections::HashMap;

use chrono::Utc;

use crate::auth::Role;
use crate::models::{Comment, Like, Post, User};

/// Relational store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row with the given key.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    /// A uniqueness constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Default)]
pub struct InMemoryStore {
    users: HashMap<u64, User>,
    posts: HashMap<u64, Post>,
    comments: HashMap<u64, Comment>,
    likes: HashMap<u64, Like>,
    next_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Create a user, enforcing username/email uniqueness.
    pub fn create_user(
        &mut self,
        username: impl Into<String>,
        email: impl Into<String>,
        password_digest: impl Into<String>,
        role: Role,
    ) -> StoreResult<User> {
        let username = username.into();
        let email = email.into();

        if self.user_by_username(&username).is_some() {
            return Err(StoreError::Conflict(format!(
                "username '{username}' is already taken"
            )));
        }
        if self.users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!(
                "email '{email}' is already registered"
            )));
        }

        let user = User {
            id: self.next_id(),
            username,
            email,
            password_digest: password_digest.into(),
            role,
            bio: None,
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn user_by_id(&self, id: u64) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    /// Whether a username maps to a live user row.
    ///
    /// Used by the authentication gate: a verified token whose subject no
    /// longer exists must not produce a principal.
    pub fn username_exists(&self, username: &str) -> bool {
        self.user_by_username(username).is_some()
    }

    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        users
    }

    pub fn set_role(&mut self, id: u64, role: Role) -> StoreResult<()> {
        let user = self
            .users
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "user", id })?;
        user.role = role;
        Ok(())
    }

    /// Delete a user row, cascading to their posts, comments, and likes.
    ///
    /// Returns the removed row so callers can report what was deleted.
    pub fn delete_user(&mut self, id: u64) -> StoreResult<User> {
        let user = self
            .users
            .remove(&id)
            .ok_or(StoreError::NotFound { entity: "user", id })?;

        let owned_posts: Vec<u64> = self
            .posts
            .values()
            .filter(|p| p.author == user.username)
            .map(|p| p.id)
            .collect();
        for post_id in owned_posts {
            self.posts.remove(&post_id);
            self.comments.retain(|_, c| c.post_id != post_id);
            self.likes.retain(|_, l| l.post_id != post_id);
        }

        self.comments.retain(|_, c| c.author != user.username);
        self.likes.retain(|_, l| l.username != user.username);

        Ok(user)
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub fn create_post(
        &mut self,
        author: impl Into<String>,
        content: impl Into<String>,
        image_url: Option<String>,
        video_url: Option<String>,
    ) -> Post {
        let post = Post {
            id: self.next_id(),
            author: author.into(),
            content: content.into(),
            image_url,
            video_url,
            share_count: 0,
            created_at: Utc::now(),
        };
        self.posts.insert(post.id, post.clone());
        post
    }

    pub fn post_by_id(&self, id: u64) -> Option<&Post> {
        self.posts.get(&id)
    }

    /// All live posts, newest first.
    pub fn list_posts(&self) -> Vec<Post> {
        let mut posts: Vec<Post> = self.posts.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }

    pub fn posts_by_author(&self, username: &str) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .values()
            .filter(|p| p.author == username)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }

    /// Delete a post row, cascading to its comments and likes.
    pub fn delete_post(&mut self, id: u64) -> StoreResult<Post> {
        let post = self
            .posts
            .remove(&id)
            .ok_or(StoreError::NotFound { entity: "post", id })?;
        self.comments.retain(|_, c| c.post_id != id);
        self.likes.retain(|_, l| l.post_id != id);
        Ok(post)
    }

    // ------------------------------------------------------------------
    // Comments & likes (child rows; business rules live elsewhere)
    // ------------------------------------------------------------------

    pub fn create_comment(
        &mut self,
        post_id: u64,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<Comment> {
        if !self.posts.contains_key(&post_id) {
            return Err(StoreError::NotFound {
                entity: "post",
                id: post_id,
            });
        }
        let comment = Comment {
            id: self.next_id(),
            post_id,
            author: author.into(),
            content: content.into(),
            created_at: Utc::now(),
        };
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    pub fn create_like(&mut self, post_id: u64, username: impl Into<String>) -> StoreResult<Like> {
        if !self.posts.contains_key(&post_id) {
            return Err(StoreError::NotFound {
                entity: "post",
                id: post_id,
            });
        }
        let like = Like {
            id: self.next_id(),
            post_id,
            username: username.into(),
        };
        self.likes.insert(like.id, like.clone());
        Ok(like)
    }

    // ------------------------------------------------------------------
    // Counters (admin stats)
    // ------------------------------------------------------------------

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}
