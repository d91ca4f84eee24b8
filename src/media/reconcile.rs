// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Orphan detection and reconciliation.
//!
//! The batch counterpart to best-effort deletion: compare the object
//! store's full key listing against the media keys referenced by live
//! posts and report the difference. Scanning never deletes anything;
//! deletion happens only for an operator-approved key set in a second
//! phase. The split bounds the scan's TOCTOU window - a key uploaded for a
//! post that commits between listing and row load would otherwise be
//! deleted out from under it.
//!
//! A scan aborts without partial results when either side cannot be read.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::objects::{is_media_key, ObjectStore, ObjectStoreError};
use crate::state::AppState;
use crate::store::{InMemoryStore, StoreError};

use super::key::resolve_media_key;

/// Result of one reconciliation scan. Ephemeral; never persisted.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReconciliationReport {
    /// Keys present in the object store.
    pub total_object_keys: usize,
    /// Distinct media keys referenced by live posts.
    pub total_referenced_keys: usize,
    /// Media-folder keys with no referencing row.
    pub orphan_keys: BTreeSet<String>,
}

/// Scan failures. Either side failing aborts the scan with no partial
/// report.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("object listing failed: {0}")]
    Listing(#[source] ObjectStoreError),
    #[error("loading post rows failed: {0}")]
    RowLoad(#[source] StoreError),
}

/// Detects and removes object-store orphans.
pub struct OrphanReconciler {
    store: Arc<RwLock<InMemoryStore>>,
    objects: Arc<dyn ObjectStore>,
}

impl OrphanReconciler {
    pub fn new(store: Arc<RwLock<InMemoryStore>>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.objects.clone())
    }

    /// Compare the object listing against referenced keys.
    ///
    /// Read-only; safe to run concurrently with ordinary traffic. The
    /// snapshot is not transactionally consistent with the object store,
    /// which is why this reports instead of deleting.
    pub async fn scan(&self) -> Result<ReconciliationReport, ReconcileError> {
        let object_keys = self
            .objects
            .list_all_keys()
            .map_err(ReconcileError::Listing)?;

        let referenced: BTreeSet<String> = {
            let store = self.store.read().await;
            store
                .list_posts()
                .iter()
                .flat_map(|post| [&post.image_url, &post.video_url])
                .flatten()
                .filter_map(|reference| resolve_media_key(reference))
                .collect()
        };

        // Keys outside the media folders are not ours to classify.
        let orphan_keys: BTreeSet<String> = object_keys
            .iter()
            .filter(|key| is_media_key(key) && !referenced.contains(*key))
            .cloned()
            .collect();

        info!(
            total_object_keys = object_keys.len(),
            total_referenced_keys = referenced.len(),
            orphans = orphan_keys.len(),
            "reconciliation scan complete"
        );

        Ok(ReconciliationReport {
            total_object_keys: object_keys.len(),
            total_referenced_keys: referenced.len(),
            orphan_keys,
        })
    }

    /// Best-effort deletion of a caller-approved key set.
    ///
    /// Each attempt is independent; failures are logged and not retried.
    /// Returns the number of objects actually removed, so a repeat call
    /// over the same keys returns 0.
    pub async fn cleanup(&self, keys: &BTreeSet<String>) -> usize {
        let mut deleted = 0;
        for key in keys {
            match self.objects.delete_object(key) {
                Ok(true) => deleted += 1,
                Ok(false) => debug!(%key, "orphan already gone"),
                Err(e) => warn!(%key, error = %e, "orphan deletion failed"),
            }
        }
        info!(approved = keys.len(), deleted, "orphan cleanup complete");
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::objects::InMemoryObjectStore;

    async fn fixture() -> (OrphanReconciler, Arc<RwLock<InMemoryStore>>, Arc<InMemoryObjectStore>) {
        let store = Arc::new(RwLock::new(InMemoryStore::new()));
        let objects = Arc::new(InMemoryObjectStore::new());
        {
            let mut s = store.write().await;
            s.create_user("alice", "alice@example.com", "digest", Role::User)
                .unwrap();
        }
        (
            OrphanReconciler::new(store.clone(), objects.clone()),
            store,
            objects,
        )
    }

    #[tokio::test]
    async fn scan_reports_unreferenced_media_keys() {
        let (reconciler, store, objects) = fixture().await;
        objects.put_object("images/a.jpg", b"x", "image/jpeg").unwrap();
        objects.put_object("images/b.jpg", b"x", "image/jpeg").unwrap();
        {
            let mut s = store.write().await;
            s.create_post("alice", "content", Some("images/a.jpg".to_string()), None);
        }

        let report = reconciler.scan().await.unwrap();

        assert_eq!(report.total_object_keys, 2);
        assert_eq!(report.total_referenced_keys, 1);
        assert_eq!(
            report.orphan_keys,
            BTreeSet::from(["images/b.jpg".to_string()])
        );
    }

    #[tokio::test]
    async fn keys_outside_media_folders_are_not_classified() {
        let (reconciler, _store, objects) = fixture().await;
        objects.put_object("images/a.jpg", b"x", "image/jpeg").unwrap();
        objects.put_object("backups/dump.sql", b"x", "text/plain").unwrap();

        let report = reconciler.scan().await.unwrap();

        assert_eq!(report.total_object_keys, 2);
        assert_eq!(
            report.orphan_keys,
            BTreeSet::from(["images/a.jpg".to_string()])
        );
    }

    #[tokio::test]
    async fn references_via_signed_urls_count_as_referenced() {
        let (reconciler, store, objects) = fixture().await;
        objects.put_object("images/a.jpg", b"x", "image/jpeg").unwrap();
        {
            let mut s = store.write().await;
            s.create_post(
                "alice",
                "content",
                Some(
                    "https://media-bucket.s3.ap-southeast-2.amazonaws.com/images/a.jpg?X-Sig=1"
                        .to_string(),
                ),
                None,
            );
        }

        let report = reconciler.scan().await.unwrap();
        assert!(report.orphan_keys.is_empty());
    }

    #[tokio::test]
    async fn listing_failure_aborts_the_scan() {
        let (reconciler, _store, objects) = fixture().await;
        objects.fail_listing(true);

        let err = reconciler.scan().await.unwrap_err();
        assert!(matches!(err, ReconcileError::Listing(_)));
    }

    #[tokio::test]
    async fn cleanup_counts_only_actual_removals() {
        let (reconciler, _store, objects) = fixture().await;
        objects.put_object("images/b.jpg", b"x", "image/jpeg").unwrap();

        let keys = BTreeSet::from(["images/b.jpg".to_string()]);
        assert_eq!(reconciler.cleanup(&keys).await, 1);
        // Already gone: not an error, just zero.
        assert_eq!(reconciler.cleanup(&keys).await, 0);
    }

    #[tokio::test]
    async fn cleanup_swallows_store_failures() {
        let (reconciler, _store, objects) = fixture().await;
        objects.put_object("images/b.jpg", b"x", "image/jpeg").unwrap();
        objects.fail_deletes(true);

        let keys = BTreeSet::from(["images/b.jpg".to_string()]);
        assert_eq!(reconciler.cleanup(&keys).await, 0);

        objects.fail_deletes(false);
        assert_eq!(reconciler.cleanup(&keys).await, 1);
    }
}
