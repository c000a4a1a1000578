//! Case state machine
//!
//! The legal transitions form a closed, explicit table validated at
//! load. An edge absent from the table is rejected for every actor,
//! regardless of privilege; automated edges are reserved for the
//! system actor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use reunite_roles::RoleId;

use crate::case::{CaseActor, CaseStatus};

/// One legal edge in the state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub from: CaseStatus,
    pub to: CaseStatus,
    /// Roles allowed to drive this edge; empty for automated edges
    pub allowed_roles: Vec<RoleId>,
    /// Whether a non-empty reason must accompany the transition
    pub requires_reason: bool,
    /// Whether only the system actor may drive this edge
    pub automated: bool,
}

/// Table construction failures. These are configuration errors and
/// fail fast at load.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("duplicate transition from {from} to {to}")]
    DuplicateEdge { from: CaseStatus, to: CaseStatus },

    #[error("transition out of terminal state {0}")]
    EdgeFromTerminal(CaseStatus),

    #[error("transition into initial state new (from {0})")]
    EdgeIntoInitial(CaseStatus),

    #[error("automated transition from {from} to {to} lists allowed roles")]
    AutomatedWithRoles { from: CaseStatus, to: CaseStatus },
}

/// Why a requested transition was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("no transition from {from} to {to}")]
    NoTransition { from: CaseStatus, to: CaseStatus },

    #[error("transition from {from} to {to} is automated and accepts only the system actor")]
    AutomatedOnly { from: CaseStatus, to: CaseStatus },

    #[error("actor is not allowed to transition from {from} to {to}")]
    ActorNotAllowed { from: CaseStatus, to: CaseStatus },

    #[error("transition from {from} to {to} requires a reason")]
    ReasonRequired { from: CaseStatus, to: CaseStatus },
}

/// The validated transition table.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    transitions: Vec<Transition>,
}

const STAFF: &[RoleId] = &[RoleId::Coordinator, RoleId::Admin];
const MODERATORS_UP: &[RoleId] = &[
    RoleId::Moderator,
    RoleId::SeniorModerator,
    RoleId::Coordinator,
    RoleId::Admin,
];
const DISPATCH: &[RoleId] = &[
    RoleId::Dispatcher,
    RoleId::TeamLead,
    RoleId::Coordinator,
    RoleId::Admin,
];

impl TransitionTable {
    /// Validate and build a table from explicit edges.
    ///
    /// # Errors
    ///
    /// [`TableError`] on duplicate edges, edges out of `archived`,
    /// edges into `new`, or automated edges carrying role lists.
    pub fn from_transitions(transitions: Vec<Transition>) -> Result<Self, TableError> {
        for (i, t) in transitions.iter().enumerate() {
            if t.from.is_terminal() {
                return Err(TableError::EdgeFromTerminal(t.from));
            }
            if t.to == CaseStatus::New {
                return Err(TableError::EdgeIntoInitial(t.from));
            }
            if t.automated && !t.allowed_roles.is_empty() {
                return Err(TableError::AutomatedWithRoles {
                    from: t.from,
                    to: t.to,
                });
            }
            if transitions[..i]
                .iter()
                .any(|other| other.from == t.from && other.to == t.to)
            {
                return Err(TableError::DuplicateEdge {
                    from: t.from,
                    to: t.to,
                });
            }
        }
        Ok(Self { transitions })
    }

    /// The built-in production state machine.
    pub fn builtin() -> Result<Self, TableError> {
        use CaseStatus::*;

        let manual = |from, to, roles: &[RoleId], requires_reason| Transition {
            from,
            to,
            allowed_roles: roles.to_vec(),
            requires_reason,
            automated: false,
        };
        let automated = |from, to| Transition {
            from,
            to,
            allowed_roles: Vec::new(),
            requires_reason: false,
            automated: true,
        };

        let triage_roles: Vec<RoleId> =
            [DISPATCH, &[RoleId::Moderator, RoleId::SeniorModerator][..]].concat();
        let volunteer_work: Vec<RoleId> = [
            DISPATCH,
            &[
                RoleId::FieldVolunteer,
                RoleId::TransportVolunteer,
                RoleId::FosterVolunteer,
            ][..],
        ]
        .concat();
        let field_work: Vec<RoleId> = [DISPATCH, &[RoleId::FieldVolunteer][..]].concat();
        let transport_work: Vec<RoleId> = [
            DISPATCH,
            &[RoleId::TransportVolunteer, RoleId::FosterVolunteer][..],
        ]
        .concat();

        Self::from_transitions(vec![
            manual(New, Triaged, &triage_roles, false),
            manual(New, OnHold, DISPATCH, true),
            manual(OnHold, Triaged, DISPATCH, false),
            manual(Triaged, Assigned, DISPATCH, false),
            manual(Assigned, InProgress, &volunteer_work, false),
            manual(InProgress, OnHold, DISPATCH, true),
            manual(OnHold, InProgress, DISPATCH, false),
            manual(InProgress, PendingVerification, &volunteer_work, false),
            manual(PendingVerification, Matched, MODERATORS_UP, false),
            manual(PendingVerification, InProgress, MODERATORS_UP, true),
            manual(InProgress, PendingPickup, &field_work, false),
            manual(PendingPickup, PendingTransport, &transport_work, false),
            manual(PendingTransport, InCustody, &transport_work, false),
            manual(InProgress, InCustody, &field_work, false),
            manual(InCustody, Matched, MODERATORS_UP, false),
            manual(Matched, PendingRelease, MODERATORS_UP, false),
            manual(Matched, InProgress, MODERATORS_UP, true),
            manual(PendingRelease, Resolved, MODERATORS_UP, true),
            manual(Resolved, InProgress, STAFF, true),
            automated(Resolved, Closed),
            automated(Closed, Archived),
        ])
    }

    /// Look up an edge.
    pub fn edge(&self, from: CaseStatus, to: CaseStatus) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|t| t.from == from && t.to == to)
    }

    /// All edges leaving a state.
    pub fn edges_from(&self, from: CaseStatus) -> Vec<&Transition> {
        self.transitions.iter().filter(|t| t.from == from).collect()
    }

    /// Authorize a transition request against the table.
    ///
    /// # Errors
    ///
    /// [`TransitionError`] when the edge is absent, the actor is not
    /// permitted on it, or a required reason is missing.
    pub fn authorize(
        &self,
        from: CaseStatus,
        to: CaseStatus,
        actor: &CaseActor,
        reason: Option<&str>,
    ) -> Result<&Transition, TransitionError> {
        let edge = self
            .edge(from, to)
            .ok_or(TransitionError::NoTransition { from, to })?;

        match actor {
            CaseActor::System => {
                if !edge.automated {
                    return Err(TransitionError::ActorNotAllowed { from, to });
                }
            }
            CaseActor::Human { role, .. } => {
                if edge.automated {
                    return Err(TransitionError::AutomatedOnly { from, to });
                }
                if !edge.allowed_roles.contains(role) {
                    return Err(TransitionError::ActorNotAllowed { from, to });
                }
            }
        }

        if edge.requires_reason && reason.map_or(true, |r| r.trim().is_empty()) {
            return Err(TransitionError::ReasonRequired { from, to });
        }
        Ok(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn human(role: RoleId) -> CaseActor {
        CaseActor::Human {
            id: Uuid::now_v7(),
            role,
        }
    }

    #[test]
    fn test_builtin_table_validates() {
        assert!(TransitionTable::builtin().is_ok());
    }

    #[test]
    fn test_absent_edge_rejected_for_every_role() {
        let table = TransitionTable::builtin().unwrap();
        for &role in RoleId::all() {
            let result = table.authorize(
                CaseStatus::New,
                CaseStatus::Resolved,
                &human(role),
                Some("shortcut"),
            );
            assert_eq!(
                result.unwrap_err(),
                TransitionError::NoTransition {
                    from: CaseStatus::New,
                    to: CaseStatus::Resolved,
                }
            );
        }
    }

    #[test]
    fn test_no_transition_message() {
        let table = TransitionTable::builtin().unwrap();
        let err = table
            .authorize(
                CaseStatus::New,
                CaseStatus::Resolved,
                &CaseActor::System,
                None,
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "no transition from new to resolved");
    }

    #[test]
    fn test_automated_edge_accepts_only_system() {
        let table = TransitionTable::builtin().unwrap();
        assert!(table
            .authorize(CaseStatus::Resolved, CaseStatus::Closed, &CaseActor::System, None)
            .is_ok());
        let err = table
            .authorize(
                CaseStatus::Resolved,
                CaseStatus::Closed,
                &human(RoleId::Admin),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, TransitionError::AutomatedOnly { .. }));
    }

    #[test]
    fn test_system_rejected_on_manual_edge() {
        let table = TransitionTable::builtin().unwrap();
        let err = table
            .authorize(CaseStatus::New, CaseStatus::Triaged, &CaseActor::System, None)
            .unwrap_err();
        assert!(matches!(err, TransitionError::ActorNotAllowed { .. }));
    }

    #[test]
    fn test_reason_required_rejects_empty() {
        let table = TransitionTable::builtin().unwrap();
        let actor = human(RoleId::Moderator);
        for reason in [None, Some(""), Some("   ")] {
            let err = table
                .authorize(
                    CaseStatus::PendingRelease,
                    CaseStatus::Resolved,
                    &actor,
                    reason,
                )
                .unwrap_err();
            assert!(matches!(err, TransitionError::ReasonRequired { .. }));
        }
        assert!(table
            .authorize(
                CaseStatus::PendingRelease,
                CaseStatus::Resolved,
                &actor,
                Some("claim verified in person"),
            )
            .is_ok());
    }

    #[test]
    fn test_no_edges_leave_archived() {
        let table = TransitionTable::builtin().unwrap();
        assert!(table.edges_from(CaseStatus::Archived).is_empty());
    }

    #[test]
    fn test_edge_into_new_fails_validation() {
        let err = TransitionTable::from_transitions(vec![Transition {
            from: CaseStatus::Triaged,
            to: CaseStatus::New,
            allowed_roles: vec![RoleId::Admin],
            requires_reason: false,
            automated: false,
        }])
        .unwrap_err();
        assert_eq!(err, TableError::EdgeIntoInitial(CaseStatus::Triaged));
    }

    #[test]
    fn test_edge_from_archived_fails_validation() {
        let err = TransitionTable::from_transitions(vec![Transition {
            from: CaseStatus::Archived,
            to: CaseStatus::Triaged,
            allowed_roles: vec![RoleId::Admin],
            requires_reason: false,
            automated: false,
        }])
        .unwrap_err();
        assert_eq!(err, TableError::EdgeFromTerminal(CaseStatus::Archived));
    }

    #[test]
    fn test_duplicate_edge_fails_validation() {
        let edge = Transition {
            from: CaseStatus::New,
            to: CaseStatus::Triaged,
            allowed_roles: vec![RoleId::Dispatcher],
            requires_reason: false,
            automated: false,
        };
        let err =
            TransitionTable::from_transitions(vec![edge.clone(), edge]).unwrap_err();
        assert!(matches!(err, TableError::DuplicateEdge { .. }));
    }
}
