//! # Reunite Access
//!
//! This crate renders permission decisions for the Reunite engine,
//! combining the role catalog with the two heightened-risk controls:
//! time-boxed break-glass access to sensitive fields, and quorum-based
//! two-person approval for high-impact actions.
//!
//! ## Overview
//!
//! The reunite-access crate handles:
//! - **Decision pipeline**: active roles -> base permission -> region
//!   scope -> break-glass -> two-person, with every executed check
//!   recorded for audit explainability
//! - **Break-glass**: scoped, TTL-bounded grants over sensitive fields
//!   with an append-only access log and mandatory post-hoc review
//! - **Two-person approval**: static rule table, distinct-approver
//!   quorum, hard timeout windows
//! - **Expiry sweeping**: an optional periodic sweep that moves
//!   timed-out requests to terminal states for audit closure
//!
//! ## Decisions are values
//!
//! Denials, break-glass requirements, and two-person requirements are
//! ordinary return values callers branch on; `Err` is reserved for
//! configuration and invalid-lifecycle errors.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use reunite_access::{AccessContext, AccessEngine, AccessPolicies, Decision};
//! use reunite_roles::{Capability, RoleCatalog, UserRoleSet};
//!
//! let engine = AccessEngine::new(RoleCatalog::builtin().unwrap(), AccessPolicies::builtin());
//! let role_set = UserRoleSet::compute(engine.catalog(), &[], Utc::now()).unwrap();
//! let ctx = AccessContext::new(Utc::now());
//!
//! let result = engine.check_permission(&role_set, Capability::CaseView, &ctx);
//! assert!(matches!(result.decision, Decision::Deny));
//! ```

pub mod break_glass;
pub mod context;
pub mod decision;
pub mod engine;
pub mod sweep;
pub mod two_person;

// Re-export main types for convenience
pub use break_glass::{
    AccessKind, BreakGlassError, BreakGlassManager, BreakGlassPolicy, BreakGlassReason,
    BreakGlassRequest, BreakGlassScope, BreakGlassStatus, ResourceAccess,
};
pub use context::{AccessContext, AlertTier, SCHEMA_VERSION};
pub use decision::{CheckKind, CheckStep, Decision, PermissionCheckResult};
pub use engine::{
    AccessEngine, AccessPolicies, PermissionExplanation, PolicyRelevance, RoleContribution,
};
pub use sweep::{ExpirySweeper, SweepPolicy};
pub use two_person::{
    Approval, TwoPersonApprovalRequest, TwoPersonCondition, TwoPersonError, TwoPersonManager,
    TwoPersonRule, TwoPersonStatus,
};
