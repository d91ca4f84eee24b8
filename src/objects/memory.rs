// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! In-memory object store.
//!
//! Backs local development and tests. Signed URLs are shaped like the real
//! backend's (host + key + expiry/signature query parameters) so media
//! references stored from them exercise the same resolution paths.
//!
//! Failure injection flips per-operation switches; the next matching call
//! reports [`ObjectStoreError::Unavailable`] as a remote outage would.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use uuid::Uuid;

use super::{ObjectStore, ObjectStoreEntry, ObjectStoreError};

struct StoredObject {
    size: u64,
    #[allow(dead_code)]
    content_type: String,
}

pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    base_url: String,
    fail_deletes: AtomicBool,
    fail_listing: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            base_url: "https://media-bucket.s3.ap-southeast-2.amazonaws.com".to_string(),
            fail_deletes: AtomicBool::new(false),
            fail_listing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `delete_object` fail, as a store outage would.
    pub fn fail_deletes(&self, enabled: bool) {
        self.fail_deletes.store(enabled, Ordering::SeqCst);
    }

    /// Make every subsequent listing fail.
    pub fn fail_listing(&self, enabled: bool) {
        self.fail_listing.store(enabled, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredObject>> {
        // A poisoned lock means a panic mid-insert; the map itself is
        // always in a consistent state, so keep serving.
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put_object(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        self.lock().insert(
            key.to_string(),
            StoredObject {
                size: bytes.len() as u64,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn delete_object(&self, key: &str) -> Result<bool, ObjectStoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Unavailable(
                "injected delete failure".to_string(),
            ));
        }
        Ok(self.lock().remove(key).is_some())
    }

    fn list_all_keys(&self) -> Result<BTreeSet<String>, ObjectStoreError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Unavailable(
                "injected listing failure".to_string(),
            ));
        }
        Ok(self.lock().keys().cloned().collect())
    }

    fn list_entries(&self) -> Result<Vec<ObjectStoreEntry>, ObjectStoreError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Unavailable(
                "injected listing failure".to_string(),
            ));
        }
        Ok(self
            .lock()
            .iter()
            .map(|(key, object)| ObjectStoreEntry {
                key: key.clone(),
                size_bytes: Some(object.size),
            })
            .collect())
    }

    fn signed_upload_url(
        &self,
        key: &str,
        _content_type: &str,
        ttl: Duration,
    ) -> Result<String, ObjectStoreError> {
        Ok(format!(
            "{}/{}?X-Expires={}&X-Signature={}",
            self.base_url,
            key,
            ttl.as_secs(),
            Uuid::new_v4().simple()
        ))
    }

    fn signed_download_url(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
        Ok(format!(
            "{}/{}?X-Expires={}&X-Signature={}",
            self.base_url,
            key,
            ttl.as_secs(),
            Uuid::new_v4().simple()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_list_delete_round_trip() {
        let store = InMemoryObjectStore::new();
        store.put_object("images/a.jpg", b"abc", "image/jpeg").unwrap();
        store.put_object("videos/b.mp4", b"defg", "video/mp4").unwrap();

        let keys = store.list_all_keys().unwrap();
        assert!(keys.contains("images/a.jpg"));
        assert!(keys.contains("videos/b.mp4"));

        assert!(store.delete_object("images/a.jpg").unwrap());
        // Second delete of the same key: gone already, not an error.
        assert!(!store.delete_object("images/a.jpg").unwrap());
    }

    #[test]
    fn entries_carry_sizes() {
        let store = InMemoryObjectStore::new();
        store.put_object("images/a.jpg", b"abcd", "image/jpeg").unwrap();

        let entries = store.list_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "images/a.jpg");
        assert_eq!(entries[0].size_bytes, Some(4));
    }

    #[test]
    fn injected_failures_surface_as_unavailable() {
        let store = InMemoryObjectStore::new();
        store.put_object("images/a.jpg", b"abc", "image/jpeg").unwrap();

        store.fail_deletes(true);
        assert!(store.delete_object("images/a.jpg").is_err());
        store.fail_deletes(false);
        assert!(store.delete_object("images/a.jpg").unwrap());

        store.fail_listing(true);
        assert!(store.list_all_keys().is_err());
    }

    #[test]
    fn signed_urls_embed_key_and_expiry_params() {
        let store = InMemoryObjectStore::new();
        let url = store
            .signed_download_url("images/a.jpg", Duration::from_secs(3600))
            .unwrap();
        assert!(url.contains("images/a.jpg?"));
        assert!(url.contains("X-Expires=3600"));
        assert!(url.contains(".amazonaws.com/"));
    }
}
