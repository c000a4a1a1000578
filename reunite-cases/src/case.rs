//! Case entity
//!
//! A case is the unit of work on the platform: a lost or found animal,
//! an injured stray, a trapped rescue, or a welfare check. The entity
//! is an immutable snapshot; lifecycle operations produce new snapshots
//! with an incremented audit version and never delete history.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reunite_audit::Versioned;
use reunite_roles::RoleId;

use crate::sla::SlaBlock;

/// Kind of case being worked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    /// An owner reported their pet missing
    LostPet,
    /// A finder reported an animal in their care
    FoundPet,
    /// An injured animal with no known owner
    InjuredStray,
    /// An animal that needs physical extraction
    TrappedRescue,
    /// A report of an animal possibly in distress
    WelfareCheck,
}

impl CaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LostPet => "lost_pet",
            Self::FoundPet => "found_pet",
            Self::InjuredStray => "injured_stray",
            Self::TrappedRescue => "trapped_rescue",
            Self::WelfareCheck => "welfare_check",
        }
    }

    /// Two-letter prefix used in human-readable case numbers.
    pub fn number_prefix(&self) -> &'static str {
        match self {
            Self::LostPet => "LP",
            Self::FoundPet => "FP",
            Self::InjuredStray => "IS",
            Self::TrappedRescue => "TR",
            Self::WelfareCheck => "WC",
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle states of a case.
///
/// `New` is the sole initial state and `Archived` is terminal; the
/// legal edges between states live in the transition table, not here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    New,
    Triaged,
    Assigned,
    InProgress,
    PendingVerification,
    PendingPickup,
    PendingTransport,
    InCustody,
    Matched,
    PendingRelease,
    Resolved,
    Closed,
    Archived,
    OnHold,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Triaged => "triaged",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::PendingVerification => "pending_verification",
            Self::PendingPickup => "pending_pickup",
            Self::PendingTransport => "pending_transport",
            Self::InCustody => "in_custody",
            Self::Matched => "matched",
            Self::PendingRelease => "pending_release",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Archived => "archived",
            Self::OnHold => "on_hold",
        }
    }

    /// Whether no further transitions leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::New,
            Self::Triaged,
            Self::Assigned,
            Self::InProgress,
            Self::PendingVerification,
            Self::PendingPickup,
            Self::PendingTransport,
            Self::InCustody,
            Self::Matched,
            Self::PendingRelease,
            Self::Resolved,
            Self::Closed,
            Self::Archived,
            Self::OnHold,
        ]
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Urgency of a case, an input to SLA policy selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CasePriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl CasePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for CasePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of the animal's condition, independent of priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseSeverity {
    Minor,
    Moderate,
    Serious,
    Critical,
}

/// Who performed an action on a case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseActor {
    /// A person acting under a role
    Human { id: Uuid, role: RoleId },
    /// The engine itself, for automated transitions
    System,
}

impl CaseActor {
    /// The acting user id, when human.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::Human { id, .. } => Some(*id),
            Self::System => None,
        }
    }
}

/// One entry in the append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub from: CaseStatus,
    pub to: CaseStatus,
    pub actor: CaseActor,
    pub reason: Option<String>,
    /// Whether a system-driven edge produced this entry
    pub automated: bool,
    pub timestamp: DateTime<Utc>,
}

/// Role of a member within the case team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Lead,
    Member,
    Observer,
}

/// A member of the case team.
///
/// Removal is a soft `removed_at` stamp; records are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: Uuid,
    pub role: TeamRole,
    pub added_by: CaseActor,
    pub added_at: DateTime<Utc>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl TeamMember {
    /// Whether this member is currently on the team.
    pub fn is_active(&self) -> bool {
        self.removed_at.is_none()
    }
}

/// Kinds of operational flags a case can carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseFlagType {
    /// Possible ownership-claim scam
    ScamSuspected,
    /// An ownership claim is contested
    Disputed,
    /// Records frozen for legal proceedings
    LegalHold,
    /// Animal needs urgent medical attention
    MedicalUrgent,
    /// Case involves sensitive parties, restrict visibility
    Sensitive,
}

/// A flag raised on a case.
///
/// Flags are additive: a newer flag of the same type supersedes for
/// active queries, but the old record stays in history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFlag {
    pub flag_type: CaseFlagType,
    pub set_by: CaseActor,
    pub reason: String,
    pub set_at: DateTime<Utc>,
    pub cleared_at: Option<DateTime<Utc>>,
}

impl CaseFlag {
    pub fn is_active(&self) -> bool {
        self.cleared_at.is_none()
    }
}

/// Who may see a note.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoteVisibility {
    /// Reporter and public followers of the case
    Public,
    /// Case team only
    Team,
    /// Staff with admin surfaces only
    Admin,
}

/// Kind of note content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    General,
    StatusUpdate,
    /// Moderator-facing commentary, never public
    Internal,
}

/// A note on a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseNote {
    pub id: Uuid,
    pub author: CaseActor,
    pub kind: NoteKind,
    pub visibility: NoteVisibility,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl CaseNote {
    /// Whether this note must live in the internal collection.
    ///
    /// Admin-visibility or internal-kind notes are routed only to
    /// `internal_notes`; this is a privacy boundary, not a display
    /// filter.
    pub fn is_internal(&self) -> bool {
        self.visibility == NoteVisibility::Admin || self.kind == NoteKind::Internal
    }
}

/// How a case ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// Animal reunited with its owner
    Reunited,
    /// Animal adopted by a new household
    Adopted,
    /// Handed off to a partner organization
    TransferredToPartner,
    /// Animal confirmed deceased
    Deceased,
    /// Search exhausted without locating the animal
    NotFound,
    Other,
}

/// Immutable record of how a case was resolved. Set once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub outcome: ResolutionOutcome,
    pub summary: String,
    pub resolved_by: CaseActor,
    pub resolved_at: DateTime<Utc>,
}

/// A rescue case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    /// Stable identifier
    pub id: Uuid,
    /// Human-readable case number, e.g. `LP-01890f3a`
    pub case_number: String,
    pub case_type: CaseType,
    pub status: CaseStatus,
    pub priority: CasePriority,
    pub severity: CaseSeverity,
    /// Reporter / creator of the case
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,

    /// Single accountable owner, set by assignment
    pub owner_id: Option<Uuid>,
    /// Team roster, append-only with soft removal
    pub team: Vec<TeamMember>,

    /// Deadlines and extension log
    pub sla: SlaBlock,

    /// Every transition ever applied, append-only
    pub status_history: Vec<StatusHistoryEntry>,
    /// Flag history, additive
    pub flags: Vec<CaseFlag>,
    /// Publicly visible notes
    pub notes: Vec<CaseNote>,
    /// Internal-only notes, never merged with `notes`
    pub internal_notes: Vec<CaseNote>,

    /// Write-once milestones
    pub triaged_at: Option<DateTime<Utc>>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,

    /// Set once at resolution, immutable thereafter
    pub resolution: Option<Resolution>,

    /// Free-form labels from intake
    pub tags: Vec<String>,

    /// Optimistic concurrency counter
    pub audit_version: u64,
}

impl Case {
    /// Team members currently on the case.
    pub fn active_team(&self) -> impl Iterator<Item = &TeamMember> {
        self.team.iter().filter(|m| m.is_active())
    }

    /// The newest uncleared flag of each type.
    pub fn active_flags(&self) -> Vec<&CaseFlag> {
        let mut latest: Vec<&CaseFlag> = Vec::new();
        for flag in self.flags.iter().filter(|f| f.is_active()) {
            match latest.iter_mut().find(|f| f.flag_type == flag.flag_type) {
                Some(existing) => {
                    if flag.set_at >= existing.set_at {
                        *existing = flag;
                    }
                }
                None => latest.push(flag),
            }
        }
        latest
    }

    /// Whether an uncleared flag of this type exists.
    pub fn has_active_flag(&self, flag_type: CaseFlagType) -> bool {
        self.flags.iter().any(|f| f.flag_type == flag_type && f.is_active())
    }
}

impl Versioned for Case {
    fn audit_version(&self) -> u64 {
        self.audit_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_value(CaseStatus::PendingVerification).unwrap();
        assert_eq!(json, "pending_verification");
        assert_eq!(CaseStatus::OnHold.as_str(), "on_hold");
    }

    #[test]
    fn test_only_archived_is_terminal() {
        for status in CaseStatus::all() {
            assert_eq!(status.is_terminal(), status == CaseStatus::Archived);
        }
    }

    #[test]
    fn test_actor_user_id() {
        let id = Uuid::now_v7();
        let human = CaseActor::Human {
            id,
            role: RoleId::Dispatcher,
        };
        assert_eq!(human.user_id(), Some(id));
        assert_eq!(CaseActor::System.user_id(), None);
    }

    #[test]
    fn test_internal_routing_predicate() {
        let base = CaseNote {
            id: Uuid::now_v7(),
            author: CaseActor::System,
            kind: NoteKind::General,
            visibility: NoteVisibility::Public,
            body: "spotted near the park".to_string(),
            created_at: Utc::now(),
        };
        assert!(!base.is_internal());

        let admin_note = CaseNote {
            visibility: NoteVisibility::Admin,
            ..base.clone()
        };
        assert!(admin_note.is_internal());

        let internal_kind = CaseNote {
            kind: NoteKind::Internal,
            ..base
        };
        assert!(internal_kind.is_internal());
    }

    #[test]
    fn test_active_flags_latest_of_type_wins() {
        let now = Utc::now();
        let case = Case {
            id: Uuid::now_v7(),
            case_number: "LP-test".to_string(),
            case_type: CaseType::LostPet,
            status: CaseStatus::New,
            priority: CasePriority::Normal,
            severity: CaseSeverity::Minor,
            created_by: Uuid::now_v7(),
            created_at: now,
            owner_id: None,
            team: Vec::new(),
            sla: SlaBlock::empty(),
            status_history: Vec::new(),
            flags: vec![
                CaseFlag {
                    flag_type: CaseFlagType::Disputed,
                    set_by: CaseActor::System,
                    reason: "first claim".to_string(),
                    set_at: now - chrono::Duration::hours(2),
                    cleared_at: None,
                },
                CaseFlag {
                    flag_type: CaseFlagType::Disputed,
                    set_by: CaseActor::System,
                    reason: "second claim".to_string(),
                    set_at: now,
                    cleared_at: None,
                },
            ],
            notes: Vec::new(),
            internal_notes: Vec::new(),
            triaged_at: None,
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            archived_at: None,
            resolution: None,
            tags: Vec::new(),
            audit_version: 1,
        };

        let active = case.active_flags();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].reason, "second claim");
        assert!(case.has_active_flag(CaseFlagType::Disputed));
        assert!(!case.has_active_flag(CaseFlagType::LegalHold));
    }
}
