// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Peppered credential digests.
//!
//! Passwords are stored as base64 HMAC-SHA256 digests keyed with the
//! server secret. Verification recomputes the MAC and compares in constant
//! time; the plaintext never touches the store.

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes and verifies password digests.
pub struct PasswordHasher {
    pepper: Vec<u8>,
}

impl PasswordHasher {
    pub fn new(pepper: &[u8]) -> Self {
        Self {
            pepper: pepper.to_vec(),
        }
    }

    /// Digest a plaintext password for storage.
    pub fn digest(&self, password: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.pepper)
            .expect("HMAC accepts keys of any length");
        mac.update(password.as_bytes());
        Base64::encode_string(&mac.finalize().into_bytes())
    }

    /// Constant-time comparison of a plaintext against a stored digest.
    pub fn matches(&self, password: &str, stored_digest: &str) -> bool {
        let Ok(expected) = Base64::decode_vec(stored_digest) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(&self.pepper)
            .expect("HMAC accepts keys of any length");
        mac.update(password.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}
