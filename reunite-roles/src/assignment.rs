//! Role assignments
//!
//! This module binds a user to a role and manages the assignment
//! lifecycle. Every lifecycle operation is a pure transformation: it
//! takes a snapshot, returns a new snapshot with the audit version
//! incremented, and never mutates in place.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{RoleDefinition, RoleId};
use reunite_audit::Versioned;

/// Assignment lifecycle states.
///
/// Only `Active` assignments contribute to effective permissions.
/// Transitions are one-directional except `Suspended -> Active`
/// (reinstate).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Contributing to effective permissions
    Active,
    /// Temporarily withdrawn; can be reinstated
    Suspended,
    /// Permanently withdrawn by approvers
    Revoked,
    /// Lapsed past its expiry
    Expired,
}

/// Two distinct approver identities.
///
/// Suspension and revocation require two people; this type makes it
/// structurally impossible to pass the same identity twice.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use reunite_roles::ApproverPair;
///
/// let a = Uuid::now_v7();
/// let b = Uuid::now_v7();
/// assert!(ApproverPair::new(a, b).is_ok());
/// assert!(ApproverPair::new(a, a).is_err());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApproverPair {
    first: Uuid,
    second: Uuid,
}

impl ApproverPair {
    /// Create a pair of distinct approvers.
    ///
    /// # Errors
    ///
    /// [`AssignmentError::DuplicateApprovers`] when both ids are the
    /// same identity.
    pub fn new(first: Uuid, second: Uuid) -> Result<Self, AssignmentError> {
        if first == second {
            return Err(AssignmentError::DuplicateApprovers(first));
        }
        Ok(Self { first, second })
    }

    /// The first approver.
    pub fn first(&self) -> Uuid {
        self.first
    }

    /// The second approver.
    pub fn second(&self) -> Uuid {
        self.second
    }

    /// Both approvers.
    pub fn both(&self) -> [Uuid; 2] {
        [self.first, self.second]
    }
}

/// Assignment lifecycle errors.
#[derive(Debug, Error)]
pub enum AssignmentError {
    /// The same identity was supplied for both approvers
    #[error("Approvers must be two distinct identities (got {0} twice)")]
    DuplicateApprovers(Uuid),

    /// The operation is not valid from the assignment's current status
    #[error("Cannot {operation} an assignment in status {status:?}")]
    InvalidStatus {
        /// Current status
        status: AssignmentStatus,
        /// Operation attempted
        operation: &'static str,
    },
}

/// Suspension metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspensionRecord {
    /// Why the assignment was suspended
    pub reason: String,
    /// The two approvers who signed off
    pub approvers: ApproverPair,
    /// When the suspension lapses, if time-boxed
    pub ends_at: Option<DateTime<Utc>>,
    /// When the suspension was recorded
    pub suspended_at: DateTime<Utc>,
}

/// Revocation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationRecord {
    /// Why the assignment was revoked
    pub reason: String,
    /// The two approvers who signed off
    pub approvers: ApproverPair,
    /// Whether the user is permanently banned from this role
    pub permanent_ban: bool,
    /// When the revocation was recorded
    pub revoked_at: DateTime<Utc>,
}

/// A user's binding to one role.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use uuid::Uuid;
/// use reunite_roles::{RoleCatalog, RoleId, UserRoleAssignment};
///
/// let catalog = RoleCatalog::builtin().unwrap();
/// let role = catalog.get(RoleId::FieldVolunteer).unwrap();
/// let assignment =
///     UserRoleAssignment::new(Uuid::now_v7(), role, Uuid::now_v7(), "onboarded", Utc::now());
/// // Field volunteer roles auto-expire per catalog policy.
/// assert!(assignment.expires_at.is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    /// Unique assignment ID
    pub id: Uuid,

    /// User this assignment belongs to
    pub user_id: Uuid,

    /// Role assigned
    pub role_id: RoleId,

    /// Lifecycle status
    pub status: AssignmentStatus,

    /// Whether this is the user's primary role
    pub is_primary: bool,

    /// When the role was granted
    pub granted_at: DateTime<Utc>,

    /// Who granted the role
    pub granted_by: Uuid,

    /// Why the role was granted
    pub grant_reason: String,

    /// Regions this assignment is limited to (empty = unrestricted)
    #[serde(default)]
    pub region_ids: Vec<String>,

    /// Partner organizations this assignment is limited to
    #[serde(default)]
    pub partner_org_ids: Vec<Uuid>,

    /// Suspension metadata, present while/after suspended
    pub suspension: Option<SuspensionRecord>,

    /// Revocation metadata, present once revoked
    pub revocation: Option<RevocationRecord>,

    /// When the assignment expires, if ever
    pub expires_at: Option<DateTime<Utc>>,

    /// Monotonically incrementing audit version
    pub audit_version: u64,
}

impl UserRoleAssignment {
    /// Create a new active assignment.
    ///
    /// Auto-expiry is computed from the role's lifecycle policy when
    /// the caller does not set one explicitly via
    /// [`UserRoleAssignment::with_expires_at`].
    pub fn new(
        user_id: Uuid,
        role: &RoleDefinition,
        granted_by: Uuid,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let expires_at = role
            .lifecycle
            .auto_expire_days
            .map(|days| now + Duration::days(days));
        Self {
            id: Uuid::now_v7(),
            user_id,
            role_id: role.id,
            status: AssignmentStatus::Active,
            is_primary: false,
            granted_at: now,
            granted_by,
            grant_reason: reason.into(),
            region_ids: Vec::new(),
            partner_org_ids: Vec::new(),
            suspension: None,
            revocation: None,
            expires_at,
            audit_version: 1,
        }
    }

    /// Set an explicit expiry, overriding the role policy default.
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Mark this assignment as the user's primary role.
    pub fn with_primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Limit this assignment to specific regions.
    pub fn with_regions(mut self, region_ids: Vec<String>) -> Self {
        self.region_ids = region_ids;
        self
    }

    /// Limit this assignment to specific partner organizations.
    pub fn with_partner_orgs(mut self, partner_org_ids: Vec<Uuid>) -> Self {
        self.partner_org_ids = partner_org_ids;
        self
    }

    /// Whether this assignment contributes to effective permissions at
    /// `now`.
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.status == AssignmentStatus::Active
            && self.expires_at.map_or(true, |exp| now < exp)
    }

    /// Suspend the assignment.
    ///
    /// Requires two distinct approvers. Valid only from `Active`.
    ///
    /// # Errors
    ///
    /// [`AssignmentError::InvalidStatus`] from any other status.
    pub fn suspend(
        &self,
        approvers: ApproverPair,
        reason: impl Into<String>,
        ends_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, AssignmentError> {
        if self.status != AssignmentStatus::Active {
            return Err(AssignmentError::InvalidStatus {
                status: self.status,
                operation: "suspend",
            });
        }
        let mut next = self.clone();
        next.status = AssignmentStatus::Suspended;
        next.suspension = Some(SuspensionRecord {
            reason: reason.into(),
            approvers,
            ends_at,
            suspended_at: now,
        });
        next.audit_version += 1;
        Ok(next)
    }

    /// Revoke the assignment.
    ///
    /// Requires two distinct approvers. Valid from `Active` or
    /// `Suspended`; revocation is permanent.
    pub fn revoke(
        &self,
        approvers: ApproverPair,
        reason: impl Into<String>,
        permanent_ban: bool,
        now: DateTime<Utc>,
    ) -> Result<Self, AssignmentError> {
        match self.status {
            AssignmentStatus::Active | AssignmentStatus::Suspended => {}
            status => {
                return Err(AssignmentError::InvalidStatus {
                    status,
                    operation: "revoke",
                })
            }
        }
        let mut next = self.clone();
        next.status = AssignmentStatus::Revoked;
        next.revocation = Some(RevocationRecord {
            reason: reason.into(),
            approvers,
            permanent_ban,
            revoked_at: now,
        });
        next.audit_version += 1;
        Ok(next)
    }

    /// Reinstate a suspended assignment.
    ///
    /// Valid only from `Suspended`; the suspension record stays in the
    /// snapshot for history.
    pub fn reinstate(&self) -> Result<Self, AssignmentError> {
        if self.status != AssignmentStatus::Suspended {
            return Err(AssignmentError::InvalidStatus {
                status: self.status,
                operation: "reinstate",
            });
        }
        let mut next = self.clone();
        next.status = AssignmentStatus::Active;
        next.audit_version += 1;
        Ok(next)
    }

    /// Renew a still-active assignment, advancing its expiry by the
    /// role's auto-expire policy (or leaving it open-ended when the
    /// role has none).
    pub fn renew(
        &self,
        role: &RoleDefinition,
        now: DateTime<Utc>,
    ) -> Result<Self, AssignmentError> {
        if self.status != AssignmentStatus::Active {
            return Err(AssignmentError::InvalidStatus {
                status: self.status,
                operation: "renew",
            });
        }
        let mut next = self.clone();
        next.expires_at = role
            .lifecycle
            .auto_expire_days
            .map(|days| now + Duration::days(days));
        next.audit_version += 1;
        Ok(next)
    }

    /// Transition an active assignment past its expiry to `Expired`.
    ///
    /// Pure function of `now` vs `expires_at`. Idempotent: calling it
    /// on an already-expired (or non-expiring) record returns the
    /// snapshot unchanged.
    pub fn check_expiration(&self, now: DateTime<Utc>) -> Self {
        if self.status == AssignmentStatus::Active {
            if let Some(expires_at) = self.expires_at {
                if now >= expires_at {
                    let mut next = self.clone();
                    next.status = AssignmentStatus::Expired;
                    next.audit_version += 1;
                    return next;
                }
            }
        }
        self.clone()
    }
}

impl Versioned for UserRoleAssignment {
    fn audit_version(&self) -> u64 {
        self.audit_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RoleCatalog;

    fn assignment(role_id: RoleId) -> UserRoleAssignment {
        let catalog = RoleCatalog::builtin().unwrap();
        let role = catalog.get(role_id).unwrap();
        UserRoleAssignment::new(Uuid::now_v7(), role, Uuid::now_v7(), "test grant", Utc::now())
    }

    fn pair() -> ApproverPair {
        ApproverPair::new(Uuid::now_v7(), Uuid::now_v7()).unwrap()
    }

    #[test]
    fn test_create_computes_auto_expiry() {
        let a = assignment(RoleId::FieldVolunteer);
        assert_eq!(a.status, AssignmentStatus::Active);
        assert!(a.expires_at.is_some());
        assert_eq!(a.audit_version, 1);

        // Admin role has no auto-expiry policy.
        let b = assignment(RoleId::Admin);
        assert!(b.expires_at.is_none());
    }

    #[test]
    fn test_approver_pair_rejects_duplicates() {
        let id = Uuid::now_v7();
        assert!(matches!(
            ApproverPair::new(id, id),
            Err(AssignmentError::DuplicateApprovers(_))
        ));
    }

    #[test]
    fn test_suspend_and_reinstate() {
        let a = assignment(RoleId::FieldVolunteer);
        let suspended = a.suspend(pair(), "policy violation", None, Utc::now()).unwrap();
        assert_eq!(suspended.status, AssignmentStatus::Suspended);
        assert_eq!(suspended.audit_version, 2);
        assert!(suspended.suspension.is_some());

        let reinstated = suspended.reinstate().unwrap();
        assert_eq!(reinstated.status, AssignmentStatus::Active);
        assert_eq!(reinstated.audit_version, 3);
        // Suspension history survives reinstatement.
        assert!(reinstated.suspension.is_some());
    }

    #[test]
    fn test_reinstate_only_from_suspended() {
        let a = assignment(RoleId::FieldVolunteer);
        assert!(matches!(
            a.reinstate(),
            Err(AssignmentError::InvalidStatus { operation: "reinstate", .. })
        ));
    }

    #[test]
    fn test_revoke_from_active_and_suspended() {
        let a = assignment(RoleId::Moderator);
        let revoked = a.revoke(pair(), "abuse", true, Utc::now()).unwrap();
        assert_eq!(revoked.status, AssignmentStatus::Revoked);
        assert!(revoked.revocation.as_ref().unwrap().permanent_ban);

        // Revocation is terminal.
        assert!(revoked.revoke(pair(), "again", false, Utc::now()).is_err());
        assert!(revoked.reinstate().is_err());
    }

    #[test]
    fn test_renew_advances_expiry() {
        let catalog = RoleCatalog::builtin().unwrap();
        let role = catalog.get(RoleId::FieldVolunteer).unwrap();
        let a = assignment(RoleId::FieldVolunteer);
        let later = Utc::now() + Duration::days(300);
        let renewed = a.renew(role, later).unwrap();
        assert!(renewed.expires_at.unwrap() > a.expires_at.unwrap());
        assert_eq!(renewed.audit_version, 2);
    }

    #[test]
    fn test_renew_requires_active() {
        let catalog = RoleCatalog::builtin().unwrap();
        let role = catalog.get(RoleId::FieldVolunteer).unwrap();
        let a = assignment(RoleId::FieldVolunteer);
        let revoked = a.revoke(pair(), "gone", false, Utc::now()).unwrap();
        assert!(revoked.renew(role, Utc::now()).is_err());
    }

    #[test]
    fn test_check_expiration_is_idempotent() {
        let a = assignment(RoleId::FieldVolunteer);
        let far_future = Utc::now() + Duration::days(4000);

        let expired = a.check_expiration(far_future);
        assert_eq!(expired.status, AssignmentStatus::Expired);
        assert_eq!(expired.audit_version, 2);

        // Second call is a no-op.
        let again = expired.check_expiration(far_future);
        assert_eq!(again.status, AssignmentStatus::Expired);
        assert_eq!(again.audit_version, 2);

        // Not yet expired: unchanged.
        let fresh = a.check_expiration(Utc::now());
        assert_eq!(fresh.status, AssignmentStatus::Active);
        assert_eq!(fresh.audit_version, 1);
    }

    #[test]
    fn test_is_effective() {
        let a = assignment(RoleId::FieldVolunteer);
        assert!(a.is_effective(Utc::now()));
        assert!(!a.is_effective(Utc::now() + Duration::days(4000)));

        let suspended = a.suspend(pair(), "pause", None, Utc::now()).unwrap();
        assert!(!suspended.is_effective(Utc::now()));
    }
}
