// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! Audit logging for destructive and administrative operations.
//!
//! Cross-store deletions must stay explainable after the fact: which
//! principal deleted what, and whether media cleanup kept up. Events are
//! appended to an in-process log and queryable through the admin API;
//! media-cleanup failures are additionally visible in the server log via
//! `tracing`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use utoipa::ToSchema;

/// Types of auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Account events
    UserRegistered,
    UserPromoted,
    UserDeleted,

    // Post events
    PostDeleted,

    // Reconciliation events
    OrphanScan,
    OrphanCleanup,

    // Admin events
    AdminAccess,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// Principal that triggered the event (if known).
    pub subject: Option<String>,
    /// Resource affected (post id, user id, object key).
    pub resource_id: Option<String>,
    /// Resource type (post, user, media).
    pub resource_type: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            subject: None,
            resource_id: None,
            resource_type: None,
            details: None,
        }
    }

    /// Set the acting principal's subject.
    pub fn by(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the resource.
    pub fn on(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Append-only in-process audit log.
pub struct AuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Append one event.
    pub fn record(&self, event: AuditEvent) {
        self.lock().push(event);
    }

    /// The most recent `limit` events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.lock();
        events.iter().rev().take(limit).cloned().collect()
    }

    /// Total number of recorded events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
