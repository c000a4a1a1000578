//! Decision types
//!
//! Structured outcomes of a permission check. Decisions are ordinary
//! values callers branch on; the full check trail travels with every
//! result so the decision can be explained for compliance audits.

use serde::{Deserialize, Serialize};

use reunite_audit::{AuditEntry, AuditEventType};
use reunite_roles::{Capability, RoleId};

use crate::break_glass::BreakGlassScope;

/// The checks the decision pipeline can run, in pipeline order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// The caller holds at least one active role
    ActiveRoles,
    /// The capability is in the effective permission set
    BasePermission,
    /// The target region is within the caller's assignment scopes
    Scope,
    /// Break-glass evidence covers the protected scopes
    BreakGlass,
    /// Two-person quorum evidence meets the rule
    TwoPerson,
}

impl CheckKind {
    /// Get the string representation of the check.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActiveRoles => "active_roles",
            Self::BasePermission => "base_permission",
            Self::Scope => "scope",
            Self::BreakGlass => "break_glass",
            Self::TwoPerson => "two_person",
        }
    }
}

/// One executed pipeline check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckStep {
    /// Which check ran
    pub kind: CheckKind,
    /// Whether it passed
    pub passed: bool,
    /// Detail for the audit trail
    pub detail: Option<String>,
}

impl CheckStep {
    /// A passing step.
    pub fn passed(kind: CheckKind) -> Self {
        Self {
            kind,
            passed: true,
            detail: None,
        }
    }

    /// A failing step with detail.
    pub fn failed(kind: CheckKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

/// The outcome of a permission check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum Decision {
    /// The action may proceed
    Allow,
    /// The action is denied
    Deny,
    /// The action needs a valid break-glass grant for these scopes
    RequiresBreakGlass {
        /// Scopes not covered by supplied evidence
        missing_scopes: Vec<BreakGlassScope>,
    },
    /// The action needs two-person approval
    RequiresTwoPerson {
        /// Distinct approvals the rule demands
        required_approvals: u32,
    },
}

/// Full result of one permission check.
///
/// Deterministic and side-effect-free for identical inputs. Carries
/// every executed check, a one-sentence audit note, and the named
/// policies that fired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCheckResult {
    /// Capability that was checked
    pub capability: Capability,

    /// Outcome
    pub decision: Decision,

    /// Every check executed, in order
    pub checks: Vec<CheckStep>,

    /// Capabilities the caller lacks (on base-permission denial)
    #[serde(default)]
    pub missing_permissions: Vec<Capability>,

    /// Roles that would grant the capability (UI guidance; never
    /// auto-granted)
    #[serde(default)]
    pub granting_roles: Vec<RoleId>,

    /// One human-readable sentence for the append-only audit sink
    pub audit_note: String,

    /// Named policies that fired
    #[serde(default)]
    pub applied_policies: Vec<String>,
}

impl PermissionCheckResult {
    /// Whether the decision is `Allow`.
    pub fn allowed(&self) -> bool {
        matches!(self.decision, Decision::Allow)
    }

    /// Build the `permission.checked` entry for the audit sink.
    ///
    /// The engine itself performs no I/O; callers record this entry
    /// when persisting the decision.
    pub fn to_audit_entry(&self, user_id: uuid::Uuid) -> AuditEntry {
        AuditEntry::new(AuditEventType::PermissionChecked, self.audit_note.clone())
            .with_user(user_id)
            .with_metadata("capability", serde_json::json!(self.capability))
            .with_metadata(
                "decision",
                serde_json::to_value(&self.decision).unwrap_or(serde_json::Value::Null),
            )
            .with_metadata("applied_policies", serde_json::json!(self.applied_policies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_step_constructors() {
        let pass = CheckStep::passed(CheckKind::ActiveRoles);
        assert!(pass.passed);
        assert!(pass.detail.is_none());

        let fail = CheckStep::failed(CheckKind::Scope, "region mismatch");
        assert!(!fail.passed);
        assert_eq!(fail.detail.as_deref(), Some("region mismatch"));
    }

    #[test]
    fn test_result_to_audit_entry() {
        let result = PermissionCheckResult {
            capability: Capability::CaseView,
            decision: Decision::Allow,
            checks: vec![CheckStep::passed(CheckKind::ActiveRoles)],
            missing_permissions: vec![],
            granting_roles: vec![],
            audit_note: "allowed case.view".to_string(),
            applied_policies: vec![],
        };
        let user_id = uuid::Uuid::now_v7();

        let entry = result.to_audit_entry(user_id);
        assert_eq!(entry.event_type, AuditEventType::PermissionChecked);
        assert_eq!(entry.user_id, Some(user_id));
        assert_eq!(entry.action_taken, "allowed case.view");
        assert_eq!(entry.metadata["decision"]["decision"], "allow");
    }

    #[test]
    fn test_decision_serde_tags() {
        let json = serde_json::to_value(Decision::RequiresTwoPerson {
            required_approvals: 2,
        })
        .unwrap();
        assert_eq!(json["decision"], "requires_two_person");
        assert_eq!(json["required_approvals"], 2);
    }
}
