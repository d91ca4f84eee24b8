// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! # Object Store Module
//!
//! The object-store collaborator holding media binaries, behind the
//! [`ObjectStore`] trait: put/delete/list by key plus signed-URL
//! generation. The store fails independently of the relational store and
//! shares no transaction boundary with it; callers are expected to treat
//! its errors as degradable (see `media::cleanup`).
//!
//! Implementations carry their own timeouts; a timed-out call surfaces as
//! [`ObjectStoreError::Unavailable`].

pub mod memory;

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

pub use memory::InMemoryObjectStore;

/// TTL for signed upload URLs.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// TTL for signed download URLs.
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(60 * 60);

/// Folders media uploads land in. Only keys under these folders are
/// subject to orphan classification; anything else in the bucket is left
/// alone by reconciliation.
pub const MEDIA_FOLDERS: [&str; 3] = ["images/", "videos/", "reels/"];

/// Whether a key lives under one of the media folders.
pub fn is_media_key(key: &str) -> bool {
    MEDIA_FOLDERS.iter().any(|folder| key.starts_with(folder))
}

/// Object-store failures. Timeouts and transport errors all degrade to
/// `Unavailable`; callers decide whether that is fatal.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object store unavailable: {0}")]
    Unavailable(String),
}

/// One row of the store's key listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ObjectStoreEntry {
    /// Full object key, e.g. `images/9f2c….jpg`.
    pub key: String,
    /// Object size, when the backend reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Media object storage: put/get-by-URL/delete/list plus URL signing.
pub trait ObjectStore: Send + Sync {
    /// Store an object under `key`.
    fn put_object(&self, key: &str, bytes: &[u8], content_type: &str)
        -> Result<(), ObjectStoreError>;

    /// Delete an object. Returns whether the key existed; deleting an
    /// absent key is not an error.
    fn delete_object(&self, key: &str) -> Result<bool, ObjectStoreError>;

    /// Complete listing of every key in the store.
    fn list_all_keys(&self) -> Result<BTreeSet<String>, ObjectStoreError>;

    /// Complete listing with per-object metadata.
    fn list_entries(&self) -> Result<Vec<ObjectStoreEntry>, ObjectStoreError>;

    /// Signed URL granting a time-limited upload for `key`.
    fn signed_upload_url(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, ObjectStoreError>;

    /// Signed URL granting time-limited read access to `key`.
    fn signed_download_url(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError>;
}
