//! # Reunite Cases
//!
//! Case entity and lifecycle for the Reunite engine: the finite-state
//! machine a rescue case moves through, SLA deadline policy, team and
//! assignment management, notes, and flags.
//!
//! ## Overview
//!
//! The reunite-cases crate handles:
//! - **Case model**: immutable snapshots with append-only history,
//!   write-once milestones, and a hard public/internal note split
//! - **State machine**: a closed transition table validated at load;
//!   an absent edge is rejected for every actor, and automated edges
//!   accept only the system actor
//! - **SLA policy**: deadlines computed from a static table keyed by
//!   case type and priority, with a documented default fallback
//! - **Lifecycle operations**: pure snapshot-in/snapshot-out
//!   transformations under compare-and-swap version discipline, each
//!   emitting one audit entry
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use reunite_audit::MemoryAuditSink;
//! use reunite_cases::{
//!     CaseLifecycle, CaseParams, CasePriority, CaseSeverity, CaseType, SlaPolicyTable,
//!     TransitionTable,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let lifecycle = CaseLifecycle::new(
//!     TransitionTable::builtin()?,
//!     SlaPolicyTable::builtin(),
//!     Arc::new(MemoryAuditSink::new()),
//! );
//! let case = lifecycle
//!     .create_case(
//!         CaseParams {
//!             case_type: CaseType::LostPet,
//!             priority: CasePriority::Urgent,
//!             severity: CaseSeverity::Serious,
//!             created_by: uuid::Uuid::now_v7(),
//!             tags: vec![],
//!         },
//!         Utc::now(),
//!     )
//!     .await?;
//! assert!(case.sla.triage_due_at.is_some());
//! # Ok(())
//! # }
//! ```

pub mod case;
pub mod lifecycle;
pub mod sla;
pub mod transitions;

// Re-export main types for convenience
pub use case::{
    Case, CaseActor, CaseFlag, CaseFlagType, CaseNote, CasePriority, CaseSeverity, CaseStatus,
    CaseType, NoteKind, NoteVisibility, Resolution, ResolutionOutcome, StatusHistoryEntry,
    TeamMember, TeamRole,
};
pub use lifecycle::{CaseError, CaseLifecycle, CaseParams};
pub use sla::{
    check_sla_status, CustomDeadline, DeadlineKind, SlaBlock, SlaExtension, SlaPolicy,
    SlaPolicyTable, SlaStatus, DEFAULT_SLA_POLICY,
};
pub use transitions::{TableError, Transition, TransitionError, TransitionTable};
