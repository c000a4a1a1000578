//! Audit entry types
//!
//! This module defines the audit record emitted by every state-changing
//! engine operation. Entries are append-only at the sink; nothing in
//! the engine ever edits an entry after it has been recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Event types an audit entry can describe.
///
/// The set is closed: surrounding services match on these variants for
/// retention and alerting, so new activity gets a new variant rather
/// than a free-form string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A role assignment was created
    RoleAssigned,
    /// A role assignment was suspended
    RoleSuspended,
    /// A role assignment was revoked
    RoleRevoked,
    /// A suspended role assignment was reinstated
    RoleReinstated,
    /// A role assignment was renewed
    RoleRenewed,
    /// A role assignment lapsed past its expiry
    RoleExpired,

    /// A permission decision was rendered
    PermissionChecked,

    /// A break-glass request was created
    BreakGlassRequested,
    /// A break-glass request was granted
    BreakGlassGranted,
    /// A break-glass request was denied
    BreakGlassDenied,
    /// A break-glass grant was revoked
    BreakGlassRevoked,
    /// A break-glass grant expired
    BreakGlassExpired,
    /// A resource was accessed under a break-glass grant
    BreakGlassAccess,

    /// A two-person approval request was created
    TwoPersonRequested,
    /// An approval was recorded on a two-person request
    TwoPersonApproved,
    /// A two-person request reached its quorum
    TwoPersonSatisfied,
    /// A two-person request timed out
    TwoPersonExpired,
    /// A two-person request was withdrawn by its requester
    TwoPersonCancelled,

    /// A case was created
    CaseCreated,
    /// A case moved between statuses
    CaseStatusChanged,
    /// A case owner was set
    CaseAssigned,
    /// A team member was added or removed
    CaseTeamChanged,
    /// A flag was set or cleared on a case
    CaseFlagged,
    /// A note was added to a case
    CaseNoteAdded,
    /// A case was resolved
    CaseResolved,
    /// An SLA deadline was extended
    CaseSlaExtended,

    /// A scam report was attached to a record
    ScamReported,
    /// A user was banned
    UserBanned,
    /// A proof-of-life check was recorded
    ProofOfLife,
    /// A record was placed under legal hold
    LegalHold,
}

impl AuditEventType {
    /// Get the string representation of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleAssigned => "role.assigned",
            Self::RoleSuspended => "role.suspended",
            Self::RoleRevoked => "role.revoked",
            Self::RoleReinstated => "role.reinstated",
            Self::RoleRenewed => "role.renewed",
            Self::RoleExpired => "role.expired",
            Self::PermissionChecked => "permission.checked",
            Self::BreakGlassRequested => "break_glass.requested",
            Self::BreakGlassGranted => "break_glass.granted",
            Self::BreakGlassDenied => "break_glass.denied",
            Self::BreakGlassRevoked => "break_glass.revoked",
            Self::BreakGlassExpired => "break_glass.expired",
            Self::BreakGlassAccess => "break_glass.access",
            Self::TwoPersonRequested => "two_person.requested",
            Self::TwoPersonApproved => "two_person.approved",
            Self::TwoPersonSatisfied => "two_person.satisfied",
            Self::TwoPersonExpired => "two_person.expired",
            Self::TwoPersonCancelled => "two_person.cancelled",
            Self::CaseCreated => "case.created",
            Self::CaseStatusChanged => "case.status_changed",
            Self::CaseAssigned => "case.assigned",
            Self::CaseTeamChanged => "case.team_changed",
            Self::CaseFlagged => "case.flagged",
            Self::CaseNoteAdded => "case.note_added",
            Self::CaseResolved => "case.resolved",
            Self::CaseSlaExtended => "case.sla_extended",
            Self::ScamReported => "scam.reported",
            Self::UserBanned => "user.banned",
            Self::ProofOfLife => "proof_of_life.recorded",
            Self::LegalHold => "legal_hold.placed",
        }
    }

    /// Whether entries of this type must survive every retention sweep.
    ///
    /// Scam, ban, proof-of-life, and legal-hold events are preserved
    /// for legal/compliance use and can never be purged.
    pub fn is_legally_preserved(&self) -> bool {
        matches!(
            self,
            Self::ScamReported | Self::UserBanned | Self::ProofOfLife | Self::LegalHold
        )
    }
}

/// A single audit record.
///
/// One entry is emitted per state-changing engine operation. The entry
/// is immutable once recorded; correction happens by recording a new
/// entry, never by editing.
///
/// # Examples
///
/// ```
/// use reunite_audit::{AuditEntry, AuditEventType};
///
/// let entry = AuditEntry::new(AuditEventType::UserBanned, "banned for fraudulent claims");
/// // Ban events are always preserved for legal review.
/// assert!(entry.preserved_for_legal);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID
    pub id: Uuid,

    /// Timestamp when the entry was created
    pub timestamp: DateTime<Utc>,

    /// Event type
    pub event_type: AuditEventType,

    /// Case this entry refers to, if any
    pub case_id: Option<Uuid>,

    /// User this entry refers to, if any
    pub user_id: Option<Uuid>,

    /// Source IP, when the caller supplies one
    pub ip_address: Option<String>,

    /// Reason supplied by the actor, if any
    pub reason: Option<String>,

    /// Human-readable description of the action taken
    pub action_taken: String,

    /// Structured metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Whether this entry must survive every retention sweep
    pub preserved_for_legal: bool,
}

impl AuditEntry {
    /// Create a new audit entry.
    ///
    /// `preserved_for_legal` is derived from the event type and then
    /// only ever raised, never lowered, by [`AuditEntry::with_legal_hold`].
    ///
    /// # Arguments
    ///
    /// * `event_type` - The event type
    /// * `action_taken` - Human-readable description of what happened
    pub fn new(event_type: AuditEventType, action_taken: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type,
            case_id: None,
            user_id: None,
            ip_address: None,
            reason: None,
            action_taken: action_taken.into(),
            metadata: HashMap::new(),
            preserved_for_legal: event_type.is_legally_preserved(),
        }
    }

    /// Set the case reference.
    pub fn with_case(mut self, case_id: Uuid) -> Self {
        self.case_id = Some(case_id);
        self
    }

    /// Set the user reference.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set the source IP address.
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Set the actor-supplied reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Add a metadata value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Force legal preservation on, regardless of event type.
    ///
    /// There is deliberately no way to turn preservation off.
    pub fn with_legal_hold(mut self) -> Self {
        self.preserved_for_legal = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = AuditEntry::new(AuditEventType::CaseCreated, "case created");
        assert_eq!(entry.event_type, AuditEventType::CaseCreated);
        assert!(entry.case_id.is_none());
        assert!(!entry.preserved_for_legal);
    }

    #[test]
    fn test_legal_event_types_are_preserved() {
        for event_type in [
            AuditEventType::ScamReported,
            AuditEventType::UserBanned,
            AuditEventType::ProofOfLife,
            AuditEventType::LegalHold,
        ] {
            let entry = AuditEntry::new(event_type, "test");
            assert!(entry.preserved_for_legal, "{:?} must be preserved", event_type);
        }
    }

    #[test]
    fn test_legal_hold_is_one_way() {
        let entry = AuditEntry::new(AuditEventType::CaseCreated, "case created").with_legal_hold();
        assert!(entry.preserved_for_legal);
    }

    #[test]
    fn test_builder_references() {
        let case_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();
        let entry = AuditEntry::new(AuditEventType::CaseAssigned, "owner set")
            .with_case(case_id)
            .with_user(user_id)
            .with_ip("203.0.113.9")
            .with_reason("dispatch rotation")
            .with_metadata("owner", serde_json::json!(user_id));

        assert_eq!(entry.case_id, Some(case_id));
        assert_eq!(entry.user_id, Some(user_id));
        assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(entry.reason.as_deref(), Some("dispatch rotation"));
        assert_eq!(entry.metadata.len(), 1);
    }

    #[test]
    fn test_event_type_strings() {
        assert_eq!(AuditEventType::BreakGlassGranted.as_str(), "break_glass.granted");
        assert_eq!(AuditEventType::CaseStatusChanged.as_str(), "case.status_changed");
    }
}
