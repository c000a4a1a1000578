//! # Reunite Roles
//!
//! This crate provides the role catalog and role-assignment lifecycle
//! for the Reunite engine, shared by the access-decision and
//! case-lifecycle crates.
//!
//! ## Overview
//!
//! The reunite-roles crate handles:
//! - **Capabilities**: the closed set of operational permission tokens
//! - **Role Catalog**: the static registry of role definitions with
//!   hierarchy, eligibility requirements, and approval rights
//! - **Assignments**: binding a user to a role, with a full
//!   suspend/revoke/reinstate/renew lifecycle and an audited manager
//!   layer that records one entry per state change
//! - **Eligibility validation**: accumulating every blocker and warning
//!   for a candidate assignment in one pass
//! - **Role sets**: the derived per-user snapshot (effective
//!   permissions, highest role, pending renewals) recomputed on every
//!   decision
//!
//! ## Architecture
//!
//! ```text
//! RoleCatalog (static, validated at load)
//!        |
//! UserRoleAssignment (per user, per role, versioned lifecycle)
//!        |
//! UserRoleSet (derived snapshot, never the source of truth)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use uuid::Uuid;
//! use reunite_roles::{Capability, RoleCatalog, RoleId, UserRoleAssignment, UserRoleSet};
//!
//! let catalog = RoleCatalog::builtin().unwrap();
//! let role = catalog.get(RoleId::FieldVolunteer).unwrap();
//!
//! let user_id = Uuid::now_v7();
//! let granter = Uuid::now_v7();
//! let assignment =
//!     UserRoleAssignment::new(user_id, role, granter, "passed onboarding", Utc::now());
//!
//! let role_set = UserRoleSet::compute(&catalog, &[assignment], Utc::now()).unwrap();
//! assert!(role_set.has(Capability::DispatchAccept));
//! ```

pub mod assignment;
pub mod capability;
pub mod catalog;
pub mod eligibility;
pub mod manager;
pub mod role_set;
pub mod validate;

// Re-export main types for convenience
pub use assignment::{ApproverPair, AssignmentError, AssignmentStatus, UserRoleAssignment};
pub use manager::{RoleAssignmentManager, RoleLifecycleError};
pub use capability::Capability;
pub use catalog::{
    CatalogError, LifecyclePolicy, OperationalLimits, Prerequisite, RoleCatalog, RoleCategory,
    RoleDefinition, RoleId, RoleRequirements,
};
pub use eligibility::{
    BackgroundCheckStatus, EligibilityProfile, IdentityAssuranceLevel, WaiverKind,
};
pub use role_set::{AssignmentScope, UserRoleSet};
pub use validate::{
    conflict_between, validate_assignment, AssignmentValidation, ConflictResolution,
    ValidationIssue,
};
