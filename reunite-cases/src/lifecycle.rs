//! Case lifecycle operations
//!
//! Every operation is a pure transformation: it takes a case snapshot
//! plus the version the caller read, and returns a new snapshot with
//! the version bumped. A stale version is a [`ConflictError`], never a
//! silent overwrite. Each mutation emits one audit entry; persistence
//! of the returned snapshot is the caller's responsibility.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use reunite_audit::{
    ensure_version, AuditEntry, AuditEventType, AuditSink, AuditSinkError, ConflictError,
};

use crate::case::{
    Case, CaseActor, CaseFlag, CaseFlagType, CaseNote, CasePriority, CaseSeverity, CaseStatus,
    CaseType, NoteKind, NoteVisibility, Resolution, ResolutionOutcome, StatusHistoryEntry,
    TeamMember, TeamRole,
};
use crate::sla::{
    check_sla_status, CustomDeadline, DeadlineKind, SlaBlock, SlaExtension, SlaPolicyTable,
    SlaStatus,
};
use crate::transitions::{TransitionError, TransitionTable};

/// Failures of lifecycle operations.
///
/// Transition and conflict variants are expected control flow for
/// callers; the rest indicate misuse of an entity's lifecycle.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Audit(#[from] AuditSinkError),

    #[error("user {0} is already an active member of the case team")]
    AlreadyOnTeam(Uuid),

    #[error("user {0} is not an active member of the case team")]
    NotOnTeam(Uuid),

    #[error("case {0} already carries a resolution")]
    ResolutionAlreadySet(Uuid),

    #[error("case has no {0:?} deadline to extend")]
    MissingDeadline(DeadlineKind),
}

/// Parameters accepted from the intake collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseParams {
    pub case_type: CaseType,
    pub priority: CasePriority,
    pub severity: CaseSeverity,
    pub created_by: Uuid,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Owns the state machine and SLA policy, and drives case mutations.
pub struct CaseLifecycle {
    transitions: TransitionTable,
    sla_policies: SlaPolicyTable,
    sink: Arc<dyn AuditSink>,
}

impl CaseLifecycle {
    /// Create a lifecycle over validated configuration.
    pub fn new(
        transitions: TransitionTable,
        sla_policies: SlaPolicyTable,
        sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            transitions,
            sla_policies,
            sink,
        }
    }

    /// The state machine this lifecycle enforces.
    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Create a case in the `new` state with SLA deadlines computed
    /// from the policy table.
    ///
    /// # Errors
    ///
    /// [`CaseError::Audit`] if the creation entry cannot be recorded.
    pub async fn create_case(&self, params: CaseParams, now: DateTime<Utc>) -> Result<Case, CaseError> {
        let id = Uuid::now_v7();
        let case_number = format!(
            "{}-{}",
            params.case_type.number_prefix(),
            &id.simple().to_string()[..8]
        );
        let policy = self.sla_policies.policy_for(params.case_type, params.priority);

        let case = Case {
            id,
            case_number: case_number.clone(),
            case_type: params.case_type,
            status: CaseStatus::New,
            priority: params.priority,
            severity: params.severity,
            created_by: params.created_by,
            created_at: now,
            owner_id: None,
            team: Vec::new(),
            sla: SlaBlock::from_policy(policy, now),
            status_history: Vec::new(),
            flags: Vec::new(),
            notes: Vec::new(),
            internal_notes: Vec::new(),
            triaged_at: None,
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            archived_at: None,
            resolution: None,
            tags: params.tags,
            audit_version: 1,
        };

        debug!(case_id = %id, case_number = %case_number, "case created");
        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::CaseCreated,
                    format!("created case {case_number}"),
                )
                .with_case(id)
                .with_user(params.created_by)
                .with_metadata("case_type", params.case_type.as_str().into())
                .with_metadata("priority", params.priority.as_str().into()),
            )
            .await?;
        Ok(case)
    }

    /// Apply a status transition.
    ///
    /// Milestone timestamps touched by the target state are stamped
    /// exactly once and never cleared.
    ///
    /// # Errors
    ///
    /// [`CaseError::Transition`] when the edge is absent, the actor is
    /// not permitted, or a required reason is missing;
    /// [`CaseError::Conflict`] on a stale version.
    pub async fn transition_status(
        &self,
        case: &Case,
        expected_version: u64,
        to: CaseStatus,
        actor: CaseActor,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        ensure_version(case, expected_version)?;
        let edge = self.transitions.authorize(case.status, to, &actor, reason)?;
        let automated = edge.automated;

        let mut next = case.clone();
        next.status = to;
        next.status_history.push(StatusHistoryEntry {
            from: case.status,
            to,
            actor,
            reason: reason.map(str::to_string),
            automated,
            timestamp: now,
        });
        match to {
            CaseStatus::Triaged => next.triaged_at = next.triaged_at.or(Some(now)),
            CaseStatus::Resolved => next.resolved_at = next.resolved_at.or(Some(now)),
            CaseStatus::Closed => next.closed_at = next.closed_at.or(Some(now)),
            CaseStatus::Archived => next.archived_at = next.archived_at.or(Some(now)),
            _ => {}
        }
        next.audit_version += 1;

        let mut entry = AuditEntry::new(
            AuditEventType::CaseStatusChanged,
            format!("case {} moved from {} to {}", case.case_number, case.status, to),
        )
        .with_case(case.id)
        .with_metadata("from", case.status.as_str().into())
        .with_metadata("to", to.as_str().into())
        .with_metadata("automated", automated.into());
        if let Some(user_id) = actor.user_id() {
            entry = entry.with_user(user_id);
        }
        if let Some(reason) = reason {
            entry = entry.with_reason(reason);
        }
        self.sink.record(entry).await?;
        Ok(next)
    }

    /// Set the case owner and stamp the first-response milestone.
    ///
    /// Re-assignment never overwrites an existing first-response
    /// timestamp.
    pub async fn assign_case(
        &self,
        case: &Case,
        expected_version: u64,
        owner_id: Uuid,
        actor: CaseActor,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        ensure_version(case, expected_version)?;

        let mut next = case.clone();
        next.owner_id = Some(owner_id);
        next.first_response_at = next.first_response_at.or(Some(now));
        next.audit_version += 1;

        let mut entry = AuditEntry::new(
            AuditEventType::CaseAssigned,
            format!("case {} assigned", case.case_number),
        )
        .with_case(case.id)
        .with_metadata("owner_id", owner_id.to_string().into());
        if let Some(user_id) = actor.user_id() {
            entry = entry.with_user(user_id);
        }
        self.sink.record(entry).await?;
        Ok(next)
    }

    /// Append a team member.
    ///
    /// # Errors
    ///
    /// [`CaseError::AlreadyOnTeam`] if the user is already active on
    /// the roster.
    pub async fn add_team_member(
        &self,
        case: &Case,
        expected_version: u64,
        user_id: Uuid,
        team_role: TeamRole,
        actor: CaseActor,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        ensure_version(case, expected_version)?;
        if case.active_team().any(|m| m.user_id == user_id) {
            return Err(CaseError::AlreadyOnTeam(user_id));
        }

        let mut next = case.clone();
        next.team.push(TeamMember {
            user_id,
            role: team_role,
            added_by: actor,
            added_at: now,
            removed_at: None,
        });
        next.audit_version += 1;

        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::CaseTeamChanged,
                    format!("added member to case {}", case.case_number),
                )
                .with_case(case.id)
                .with_user(user_id),
            )
            .await?;
        Ok(next)
    }

    /// Soft-remove a team member by stamping `removed_at`. The roster
    /// record is never deleted.
    ///
    /// # Errors
    ///
    /// [`CaseError::NotOnTeam`] if the user has no active record.
    pub async fn remove_team_member(
        &self,
        case: &Case,
        expected_version: u64,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        ensure_version(case, expected_version)?;

        let mut next = case.clone();
        let member = next
            .team
            .iter_mut()
            .find(|m| m.user_id == user_id && m.is_active())
            .ok_or(CaseError::NotOnTeam(user_id))?;
        member.removed_at = Some(now);
        next.audit_version += 1;

        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::CaseTeamChanged,
                    format!("removed member from case {}", case.case_number),
                )
                .with_case(case.id)
                .with_user(user_id),
            )
            .await?;
        Ok(next)
    }

    /// Raise a flag. A new flag of the same type supersedes for active
    /// queries; prior records stay in history.
    ///
    /// Scam and legal-hold flags are audited under their preserved
    /// event types so retention jobs can never purge them.
    pub async fn set_flag(
        &self,
        case: &Case,
        expected_version: u64,
        flag_type: CaseFlagType,
        reason: impl Into<String>,
        actor: CaseActor,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        ensure_version(case, expected_version)?;
        let reason = reason.into();

        let mut next = case.clone();
        next.flags.push(CaseFlag {
            flag_type,
            set_by: actor,
            reason: reason.clone(),
            set_at: now,
            cleared_at: None,
        });
        next.audit_version += 1;

        let event_type = match flag_type {
            CaseFlagType::ScamSuspected => AuditEventType::ScamReported,
            CaseFlagType::LegalHold => AuditEventType::LegalHold,
            _ => AuditEventType::CaseFlagged,
        };
        let mut entry = AuditEntry::new(
            event_type,
            format!("flagged case {} as {:?}", case.case_number, flag_type),
        )
        .with_case(case.id)
        .with_reason(reason);
        if let Some(user_id) = actor.user_id() {
            entry = entry.with_user(user_id);
        }
        self.sink.record(entry).await?;
        Ok(next)
    }

    /// Clear every active flag of a type by stamping `cleared_at`.
    pub async fn clear_flag(
        &self,
        case: &Case,
        expected_version: u64,
        flag_type: CaseFlagType,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        ensure_version(case, expected_version)?;

        let mut next = case.clone();
        for flag in next
            .flags
            .iter_mut()
            .filter(|f| f.flag_type == flag_type && f.is_active())
        {
            flag.cleared_at = Some(now);
        }
        next.audit_version += 1;

        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::CaseFlagged,
                    format!("cleared {:?} flags on case {}", flag_type, case.case_number),
                )
                .with_case(case.id),
            )
            .await?;
        Ok(next)
    }

    /// Add a note, routed by visibility.
    ///
    /// Admin-visibility or internal-kind notes land only in the
    /// internal collection; the two collections are never merged.
    pub async fn add_note(
        &self,
        case: &Case,
        expected_version: u64,
        author: CaseActor,
        kind: NoteKind,
        visibility: NoteVisibility,
        body: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        ensure_version(case, expected_version)?;

        let note = CaseNote {
            id: Uuid::now_v7(),
            author,
            kind,
            visibility,
            body: body.into(),
            created_at: now,
        };
        let internal = note.is_internal();

        let mut next = case.clone();
        if internal {
            next.internal_notes.push(note);
        } else {
            next.notes.push(note);
        }
        next.audit_version += 1;

        let mut entry = AuditEntry::new(
            AuditEventType::CaseNoteAdded,
            format!("note added to case {}", case.case_number),
        )
        .with_case(case.id)
        .with_metadata("internal", internal.into());
        if let Some(user_id) = author.user_id() {
            entry = entry.with_user(user_id);
        }
        self.sink.record(entry).await?;
        Ok(next)
    }

    /// Resolve a case: one transition to `resolved` plus an immutable
    /// resolution snapshot.
    ///
    /// # Errors
    ///
    /// [`CaseError::ResolutionAlreadySet`] if a snapshot exists;
    /// [`CaseError::Transition`] if the edge to `resolved` is not
    /// legal for this actor from the current state.
    pub async fn resolve_case(
        &self,
        case: &Case,
        expected_version: u64,
        outcome: ResolutionOutcome,
        summary: impl Into<String>,
        actor: CaseActor,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        if case.resolution.is_some() {
            return Err(CaseError::ResolutionAlreadySet(case.id));
        }
        let mut next = self
            .transition_status(case, expected_version, CaseStatus::Resolved, actor, Some(reason), now)
            .await?;
        next.resolution = Some(Resolution {
            outcome,
            summary: summary.into(),
            resolved_by: actor,
            resolved_at: now,
        });

        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::CaseResolved,
                    format!("case {} resolved", case.case_number),
                )
                .with_case(case.id)
                .with_reason(reason)
                .with_metadata(
                    "outcome",
                    serde_json::to_value(outcome).unwrap_or(serde_json::Value::Null),
                ),
            )
            .await?;
        Ok(next)
    }

    /// Extend one of the standard deadlines, appending to the
    /// extension log.
    ///
    /// # Errors
    ///
    /// [`CaseError::MissingDeadline`] if the case has no such deadline.
    pub async fn extend_deadline(
        &self,
        case: &Case,
        expected_version: u64,
        deadline: DeadlineKind,
        new_due_at: DateTime<Utc>,
        reason: impl Into<String>,
        actor: CaseActor,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        ensure_version(case, expected_version)?;
        let reason = reason.into();

        let mut next = case.clone();
        let slot = match deadline {
            DeadlineKind::Triage => &mut next.sla.triage_due_at,
            DeadlineKind::FirstResponse => &mut next.sla.first_response_due_at,
            DeadlineKind::Resolution => &mut next.sla.resolution_due_at,
        };
        let previous = slot.ok_or(CaseError::MissingDeadline(deadline))?;
        *slot = Some(new_due_at);
        next.sla.extensions.push(SlaExtension {
            deadline,
            previous_due_at: previous,
            new_due_at,
            extended_by: actor,
            reason: reason.clone(),
            extended_at: now,
        });
        next.audit_version += 1;

        let mut entry = AuditEntry::new(
            AuditEventType::CaseSlaExtended,
            format!("extended {:?} deadline on case {}", deadline, case.case_number),
        )
        .with_case(case.id)
        .with_reason(reason);
        if let Some(user_id) = actor.user_id() {
            entry = entry.with_user(user_id);
        }
        self.sink.record(entry).await?;
        Ok(next)
    }

    /// Attach a caller-defined deadline alongside the standard three.
    pub async fn add_custom_deadline(
        &self,
        case: &Case,
        expected_version: u64,
        label: impl Into<String>,
        due_at: DateTime<Utc>,
        actor: CaseActor,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        ensure_version(case, expected_version)?;
        let label = label.into();

        let mut next = case.clone();
        next.sla.custom_deadlines.push(CustomDeadline {
            label: label.clone(),
            due_at,
            created_by: actor,
            created_at: now,
        });
        next.audit_version += 1;

        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::CaseSlaExtended,
                    format!("added deadline '{label}' to case {}", case.case_number),
                )
                .with_case(case.id),
            )
            .await?;
        Ok(next)
    }

    /// Derive the case's SLA standing. Pure; emits nothing.
    pub fn check_sla_status(&self, case: &Case, now: DateTime<Utc>) -> SlaStatus {
        check_sla_status(case, now)
    }
}
