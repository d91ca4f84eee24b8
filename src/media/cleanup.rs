// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Cross-store entity deletion.
//!
//! Deleting a post (or a user and, transitively, their posts) touches two
//! stores that cannot be updated atomically together. The contract:
//!
//! - media cleanup runs first, while the relational row still holds the
//!   references; each object deletion is independent and best-effort
//! - the relational deletion is authoritative; object-store failures are
//!   logged warnings, never a reason to abort or roll back
//! - stray objects left behind by failed cleanup are collected later by
//!   the reconciler
//!
//! The relational delete is also the linearization point for concurrent
//! deletions of the same entity: the second caller finds the row gone and
//! gets [`DeleteError::NotFound`]. Once started, a deletion runs its steps
//! to completion rather than leaving media removed but the row intact.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::models::Post;
use crate::objects::ObjectStore;
use crate::state::AppState;
use crate::store::{InMemoryStore, StoreError};

use super::key::resolve_media_key;

/// Deletion failures surfaced to the caller.
///
/// Media-cleanup problems are deliberately absent: they degrade to logged
/// warnings inside [`MediaCleanup`] and do not change the overall result.
#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    /// The target entity does not exist; nothing was touched.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    /// The relational deletion itself failed. Fatal to the operation.
    #[error("relational deletion failed: {0}")]
    Relational(StoreError),
}

impl From<StoreError> for DeleteError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => DeleteError::NotFound { entity, id },
            other => DeleteError::Relational(other),
        }
    }
}

/// Summary of the media side of one deletion.
#[derive(Debug, Default)]
pub struct MediaCleanup {
    /// Keys a deletion was attempted for.
    pub attempted: usize,
    /// Keys actually removed from the object store.
    pub removed: usize,
    /// Keys whose deletion failed; left for reconciliation.
    pub failed: Vec<String>,
}

/// Deletes users and posts across the relational and object stores.
pub struct ConsistentDeleter {
    store: Arc<RwLock<InMemoryStore>>,
    objects: Arc<dyn ObjectStore>,
}

impl ConsistentDeleter {
    pub fn new(store: Arc<RwLock<InMemoryStore>>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.objects.clone())
    }

    /// Delete a post and its media.
    ///
    /// A missing post reports `NotFound` with zero object-store calls.
    /// Partial or total media-cleanup failure still deletes the row and
    /// still returns `Ok`.
    pub async fn delete_post(&self, post_id: u64) -> Result<MediaCleanup, DeleteError> {
        let keys = {
            let store = self.store.read().await;
            let post = store.post_by_id(post_id).ok_or(DeleteError::NotFound {
                entity: "post",
                id: post_id,
            })?;
            media_keys_of(post)
        };

        let mut cleanup = MediaCleanup::default();
        self.delete_media(&keys, &mut cleanup);

        {
            let mut store = self.store.write().await;
            store.delete_post(post_id)?;
        }

        info!(
            post_id,
            media_attempted = cleanup.attempted,
            media_removed = cleanup.removed,
            "post deleted"
        );
        Ok(cleanup)
    }

    /// Delete a user, their posts, and all associated media.
    ///
    /// Media cleanup for every owned post runs before the relational
    /// cascade fires - once the rows are gone the references are no longer
    /// retrievable.
    pub async fn delete_user(&self, user_id: u64) -> Result<MediaCleanup, DeleteError> {
        let keys: Vec<String> = {
            let store = self.store.read().await;
            let user = store.user_by_id(user_id).ok_or(DeleteError::NotFound {
                entity: "user",
                id: user_id,
            })?;
            store
                .posts_by_author(&user.username)
                .iter()
                .flat_map(media_keys_of)
                .collect()
        };

        let mut cleanup = MediaCleanup::default();
        self.delete_media(&keys, &mut cleanup);

        {
            let mut store = self.store.write().await;
            store.delete_user(user_id)?;
        }

        info!(
            user_id,
            media_attempted = cleanup.attempted,
            media_removed = cleanup.removed,
            "user deleted with cascade"
        );
        Ok(cleanup)
    }

    /// Best-effort object deletion. Each key is independent: one failure
    /// neither blocks the other keys nor the relational deletion.
    fn delete_media(&self, keys: &[String], cleanup: &mut MediaCleanup) {
        for key in keys {
            cleanup.attempted += 1;
            match self.objects.delete_object(key) {
                Ok(true) => cleanup.removed += 1,
                Ok(false) => debug!(%key, "media object already absent"),
                Err(e) => {
                    warn!(%key, error = %e, "media cleanup failed; orphan left for reconciliation");
                    cleanup.failed.push(key.clone());
                }
            }
        }
    }
}

/// Resolved media keys referenced by a post.
fn media_keys_of(post: &Post) -> Vec<String> {
    [&post.image_url, &post.video_url]
        .into_iter()
        .flatten()
        .filter_map(|reference| resolve_media_key(reference))
        .collect()
}
