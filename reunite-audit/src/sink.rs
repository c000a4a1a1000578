//! Audit sink abstraction
//!
//! This module provides the append-only destination for audit entries,
//! with an in-memory implementation for embedded use and tests.
//! Persistent backends (database, object storage) live in surrounding
//! services and implement the same trait.

use crate::entry::AuditEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Audit sink error types.
#[derive(Debug, Error)]
pub enum AuditSinkError {
    /// Failed to record an entry
    #[error("Failed to record audit entry: {0}")]
    RecordError(String),

    /// Failed to query entries
    #[error("Failed to query audit entries: {0}")]
    QueryError(String),

    /// Sink is closed
    #[error("Audit sink closed")]
    Closed,
}

/// Result type for audit sink operations.
pub type AuditSinkResult<T> = Result<T, AuditSinkError>;

/// Append-only destination for audit entries.
///
/// Implementations must treat entries as immutable: no update or
/// delete surface exists beyond retention purges, and purges must skip
/// entries with `preserved_for_legal` set.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one entry.
    async fn record(&self, entry: AuditEntry) -> AuditSinkResult<()>;
}

/// In-memory audit sink.
///
/// Backed by a `tokio::sync::RwLock<Vec<_>>`; suitable for tests and
/// single-process embedding. Entries are held in insertion order.
///
/// # Examples
///
/// ```rust,no_run
/// use reunite_audit::{AuditEntry, AuditEventType, AuditSink, MemoryAuditSink};
///
/// # async fn demo() {
/// let sink = MemoryAuditSink::new();
/// sink.record(AuditEntry::new(AuditEventType::CaseCreated, "case created"))
///     .await
///     .unwrap();
/// assert_eq!(sink.len().await, 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    /// Create a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the sink is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// All entries, in insertion order.
    pub async fn all(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Entries referring to a specific case.
    pub async fn for_case(&self, case_id: Uuid) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.case_id == Some(case_id))
            .cloned()
            .collect()
    }

    /// Entries referring to a specific user.
    pub async fn for_user(&self, user_id: Uuid) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.user_id == Some(user_id))
            .cloned()
            .collect()
    }

    /// Remove entries older than `cutoff`.
    ///
    /// Entries with `preserved_for_legal` are always retained, whatever
    /// their age.
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    pub async fn purge_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.preserved_for_legal || e.timestamp >= cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::info!(removed, "purged audit entries past retention");
        }
        removed
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: AuditEntry) -> AuditSinkResult<()> {
        tracing::debug!(
            event_type = entry.event_type.as_str(),
            entry_id = %entry.id,
            "recording audit entry"
        );
        self.entries.write().await.push(entry);
        Ok(())
    }
}
