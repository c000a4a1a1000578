//! Role-assignment manager
//!
//! Thin audited layer over the pure assignment transforms: each
//! operation applies the transform under compare-and-swap version
//! discipline and records one audit entry. Persistence of the
//! returned snapshot is the caller's responsibility.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use reunite_audit::{
    ensure_version, AuditEntry, AuditEventType, AuditSink, AuditSinkError, ConflictError,
};

use crate::assignment::{ApproverPair, AssignmentError, AssignmentStatus, UserRoleAssignment};
use crate::catalog::{CatalogError, RoleCatalog, RoleId};

/// Failures of audited assignment operations.
#[derive(Debug, Error)]
pub enum RoleLifecycleError {
    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Audit(#[from] AuditSinkError),
}

/// Drives the assignment lifecycle and records every state change.
pub struct RoleAssignmentManager {
    catalog: RoleCatalog,
    sink: Arc<dyn AuditSink>,
}

impl RoleAssignmentManager {
    /// Create a manager over a validated catalog and audit sink.
    pub fn new(catalog: RoleCatalog, sink: Arc<dyn AuditSink>) -> Self {
        Self { catalog, sink }
    }

    /// The catalog this manager consults.
    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    /// Grant a role, recording a `role.assigned` entry.
    ///
    /// # Errors
    ///
    /// [`RoleLifecycleError::Catalog`] for an unknown role id.
    pub async fn assign(
        &self,
        user_id: Uuid,
        role_id: RoleId,
        granted_by: Uuid,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<UserRoleAssignment, RoleLifecycleError> {
        let role = self.catalog.get(role_id)?;
        let reason = reason.into();
        let assignment = UserRoleAssignment::new(user_id, role, granted_by, reason.clone(), now);

        debug!(user_id = %user_id, role = %role_id, "role assigned");
        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::RoleAssigned,
                    format!("assigned role {role_id}"),
                )
                .with_user(user_id)
                .with_reason(reason)
                .with_metadata("assignment_id", serde_json::json!(assignment.id))
                .with_metadata("role", serde_json::json!(role_id))
                .with_metadata("granted_by", serde_json::json!(granted_by)),
            )
            .await?;
        Ok(assignment)
    }

    /// Suspend an active assignment under a distinct approver pair.
    pub async fn suspend(
        &self,
        assignment: &UserRoleAssignment,
        expected_version: u64,
        approvers: ApproverPair,
        reason: impl Into<String>,
        ends_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<UserRoleAssignment, RoleLifecycleError> {
        ensure_version(assignment, expected_version)?;
        let reason = reason.into();
        let next = assignment.suspend(approvers, reason.clone(), ends_at, now)?;

        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::RoleSuspended,
                    format!("suspended role {}", assignment.role_id),
                )
                .with_user(assignment.user_id)
                .with_reason(reason)
                .with_metadata("assignment_id", serde_json::json!(assignment.id))
                .with_metadata("approvers", serde_json::json!(approvers.both())),
            )
            .await?;
        Ok(next)
    }

    /// Revoke an assignment under a distinct approver pair.
    ///
    /// A permanent ban is recorded under the `user.banned` event type,
    /// which is preserved for legal and never purged.
    pub async fn revoke(
        &self,
        assignment: &UserRoleAssignment,
        expected_version: u64,
        approvers: ApproverPair,
        reason: impl Into<String>,
        permanent_ban: bool,
        now: DateTime<Utc>,
    ) -> Result<UserRoleAssignment, RoleLifecycleError> {
        ensure_version(assignment, expected_version)?;
        let reason = reason.into();
        let next = assignment.revoke(approvers, reason.clone(), permanent_ban, now)?;

        let event_type = if permanent_ban {
            AuditEventType::UserBanned
        } else {
            AuditEventType::RoleRevoked
        };
        self.sink
            .record(
                AuditEntry::new(event_type, format!("revoked role {}", assignment.role_id))
                    .with_user(assignment.user_id)
                    .with_reason(reason)
                    .with_metadata("assignment_id", serde_json::json!(assignment.id))
                    .with_metadata("approvers", serde_json::json!(approvers.both()))
                    .with_metadata("permanent_ban", serde_json::json!(permanent_ban)),
            )
            .await?;
        Ok(next)
    }

    /// Reinstate a suspended assignment.
    pub async fn reinstate(
        &self,
        assignment: &UserRoleAssignment,
        expected_version: u64,
        reinstated_by: Uuid,
    ) -> Result<UserRoleAssignment, RoleLifecycleError> {
        ensure_version(assignment, expected_version)?;
        let next = assignment.reinstate()?;

        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::RoleReinstated,
                    format!("reinstated role {}", assignment.role_id),
                )
                .with_user(assignment.user_id)
                .with_metadata("assignment_id", serde_json::json!(assignment.id))
                .with_metadata("reinstated_by", serde_json::json!(reinstated_by)),
            )
            .await?;
        Ok(next)
    }

    /// Renew a still-active assignment, advancing its expiry per the
    /// role's lifecycle policy.
    pub async fn renew(
        &self,
        assignment: &UserRoleAssignment,
        expected_version: u64,
        renewed_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<UserRoleAssignment, RoleLifecycleError> {
        ensure_version(assignment, expected_version)?;
        let role = self.catalog.get(assignment.role_id)?;
        let next = assignment.renew(role, now)?;

        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::RoleRenewed,
                    format!("renewed role {}", assignment.role_id),
                )
                .with_user(assignment.user_id)
                .with_metadata("assignment_id", serde_json::json!(assignment.id))
                .with_metadata("renewed_by", serde_json::json!(renewed_by))
                .with_metadata("expires_at", serde_json::json!(next.expires_at)),
            )
            .await?;
        Ok(next)
    }

    /// Settle expiry against the wall clock.
    ///
    /// Idempotent: an entry is recorded only when this call actually
    /// moves the assignment to `Expired`.
    pub async fn check_expiration(
        &self,
        assignment: &UserRoleAssignment,
        now: DateTime<Utc>,
    ) -> Result<UserRoleAssignment, RoleLifecycleError> {
        let next = assignment.check_expiration(now);
        if next.status == AssignmentStatus::Expired
            && assignment.status != AssignmentStatus::Expired
        {
            self.sink
                .record(
                    AuditEntry::new(
                        AuditEventType::RoleExpired,
                        format!("role {} expired", assignment.role_id),
                    )
                    .with_user(assignment.user_id)
                    .with_metadata("assignment_id", serde_json::json!(assignment.id)),
                )
                .await?;
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reunite_audit::MemoryAuditSink;

    fn manager() -> (RoleAssignmentManager, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        (
            RoleAssignmentManager::new(RoleCatalog::builtin().unwrap(), sink.clone()),
            sink,
        )
    }

    fn pair() -> ApproverPair {
        ApproverPair::new(Uuid::now_v7(), Uuid::now_v7()).unwrap()
    }

    #[tokio::test]
    async fn test_assign_records_entry() {
        let (manager, sink) = manager();
        let user = Uuid::now_v7();

        let assignment = manager
            .assign(user, RoleId::FieldVolunteer, Uuid::now_v7(), "onboarded", Utc::now())
            .await
            .unwrap();
        assert_eq!(assignment.status, AssignmentStatus::Active);

        let entries = sink.for_user(user).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, AuditEventType::RoleAssigned);
    }

    #[tokio::test]
    async fn test_suspend_and_reinstate_audit_trail() {
        let (manager, sink) = manager();
        let now = Utc::now();
        let assignment = manager
            .assign(Uuid::now_v7(), RoleId::Moderator, Uuid::now_v7(), "promoted", now)
            .await
            .unwrap();

        let suspended = manager
            .suspend(&assignment, 1, pair(), "policy violation", None, now)
            .await
            .unwrap();
        assert_eq!(suspended.status, AssignmentStatus::Suspended);

        let reinstated = manager
            .reinstate(&suspended, 2, Uuid::now_v7())
            .await
            .unwrap();
        assert_eq!(reinstated.status, AssignmentStatus::Active);

        let types: Vec<_> = sink.all().await.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                AuditEventType::RoleAssigned,
                AuditEventType::RoleSuspended,
                AuditEventType::RoleReinstated,
            ]
        );
    }

    #[tokio::test]
    async fn test_permanent_ban_is_legally_preserved() {
        let (manager, sink) = manager();
        let now = Utc::now();
        let assignment = manager
            .assign(Uuid::now_v7(), RoleId::FosterVolunteer, Uuid::now_v7(), "onboarded", now)
            .await
            .unwrap();

        manager
            .revoke(&assignment, 1, pair(), "animal neglect", true, now)
            .await
            .unwrap();

        let entries = sink.all().await;
        let ban = entries.last().unwrap();
        assert_eq!(ban.event_type, AuditEventType::UserBanned);
        assert!(ban.preserved_for_legal);
    }

    #[tokio::test]
    async fn test_stale_version_is_a_conflict() {
        let (manager, _sink) = manager();
        let now = Utc::now();
        let assignment = manager
            .assign(Uuid::now_v7(), RoleId::Dispatcher, Uuid::now_v7(), "rotation", now)
            .await
            .unwrap();

        let result = manager.suspend(&assignment, 7, pair(), "stale", None, now).await;
        assert!(matches!(result, Err(RoleLifecycleError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_renew_advances_expiry_and_records() {
        let (manager, sink) = manager();
        let now = Utc::now();
        let assignment = manager
            .assign(Uuid::now_v7(), RoleId::FieldVolunteer, Uuid::now_v7(), "onboarded", now)
            .await
            .unwrap();
        let original_expiry = assignment.expires_at.unwrap();

        let later = now + chrono::Duration::days(30);
        let renewed = manager.renew(&assignment, 1, Uuid::now_v7(), later).await.unwrap();
        assert!(renewed.expires_at.unwrap() > original_expiry);
        assert!(sink
            .all()
            .await
            .iter()
            .any(|e| e.event_type == AuditEventType::RoleRenewed));
    }

    #[tokio::test]
    async fn test_expiration_audited_once() {
        let (manager, sink) = manager();
        let now = Utc::now();
        let assignment = manager
            .assign(Uuid::now_v7(), RoleId::FieldVolunteer, Uuid::now_v7(), "onboarded", now)
            .await
            .unwrap();
        let past_expiry = assignment.expires_at.unwrap() + chrono::Duration::days(1);

        let expired = manager.check_expiration(&assignment, past_expiry).await.unwrap();
        assert_eq!(expired.status, AssignmentStatus::Expired);

        // Re-checking an already-expired record records nothing more.
        let again = manager.check_expiration(&expired, past_expiry).await.unwrap();
        assert_eq!(again.audit_version, expired.audit_version);
        let expiry_entries = sink
            .all()
            .await
            .iter()
            .filter(|e| e.event_type == AuditEventType::RoleExpired)
            .count();
        assert_eq!(expiry_entries, 1);
    }
}
