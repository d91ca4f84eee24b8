// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::audit::AuditLog;
use crate::auth::{AccessPolicy, AuthenticationGate, TokenCodec};
use crate::credentials::PasswordHasher;
use crate::objects::ObjectStore;
use crate::store::InMemoryStore;

#[derive(Clone)]
pub struct AppState {
    /// Relational collaborator.
    pub store: Arc<RwLock<InMemoryStore>>,
    /// Object-store collaborator for media binaries.
    pub objects: Arc<dyn ObjectStore>,
    /// Token issuance/verification.
    pub tokens: Arc<TokenCodec>,
    /// Per-request identity reconstruction.
    pub gate: Arc<AuthenticationGate>,
    /// Static route policy.
    pub policy: Arc<AccessPolicy>,
    /// Credential digests for login/registration.
    pub passwords: Arc<PasswordHasher>,
    /// Audit trail for deletions and admin actions.
    pub audit: Arc<AuditLog>,
}

impl AppState {
    /// Assemble application state. The codec and hasher are constructed by
    /// the caller so that secret validation failures stay a startup concern.
    pub fn new(
        store: InMemoryStore,
        objects: Arc<dyn ObjectStore>,
        tokens: TokenCodec,
        passwords: PasswordHasher,
    ) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            store: Arc::new(RwLock::new(store)),
            objects,
            gate: Arc::new(AuthenticationGate::new(tokens.clone())),
            policy: Arc::new(AccessPolicy::standard()),
            passwords: Arc::new(passwords),
            audit: Arc::new(AuditLog::new()),
            tokens,
        }
    }
}

impl Default for AppState {
    /// Development/test state: empty store, in-memory object store, fixed
    /// local-only secret.
    fn default() -> Self {
        const DEV_SECRET: &[u8] = b"local-development-secret-0123456";
        Self::new(
            InMemoryStore::new(),
            Arc::new(crate::objects::InMemoryObjectStore::new()),
            TokenCodec::new(DEV_SECRET).expect("development secret meets the length floor"),
            PasswordHasher::new(DEV_SECRET),
        )
    }
}
