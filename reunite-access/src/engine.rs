//! Permission decision engine
//!
//! Runs the ordered check pipeline over a derived role set, applying
//! break-glass and two-person policy, and can reconstruct a full
//! explanation of any decision for compliance review.

use serde::{Deserialize, Serialize};

use reunite_roles::{Capability, RoleCatalog, RoleId, UserRoleSet};

use crate::break_glass::{BreakGlassPolicy, BreakGlassScope};
use crate::context::AccessContext;
use crate::decision::{CheckKind, CheckStep, Decision, PermissionCheckResult};
use crate::two_person::TwoPersonRule;

/// Static policy tables the engine applies.
///
/// Loaded at process start; no runtime API mutates them.
#[derive(Debug, Clone)]
pub struct AccessPolicies {
    /// Break-glass configuration
    pub break_glass: BreakGlassPolicy,
    /// Two-person rule table
    pub two_person_rules: Vec<TwoPersonRule>,
}

impl AccessPolicies {
    /// The built-in production policy set.
    pub fn builtin() -> Self {
        Self {
            break_glass: BreakGlassPolicy::builtin(),
            two_person_rules: TwoPersonRule::builtin(),
        }
    }
}

impl Default for AccessPolicies {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The permission decision engine.
///
/// Every check is a deterministic, side-effect-free function of
/// `(role_set, capability, context)`; identical inputs always produce
/// identical results.
#[derive(Debug, Clone)]
pub struct AccessEngine {
    catalog: RoleCatalog,
    policies: AccessPolicies,
}

impl AccessEngine {
    /// Create an engine over a validated catalog and policy set.
    pub fn new(catalog: RoleCatalog, policies: AccessPolicies) -> Self {
        Self { catalog, policies }
    }

    /// The catalog this engine consults.
    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    /// The policies this engine applies.
    pub fn policies(&self) -> &AccessPolicies {
        &self.policies
    }

    /// Check one capability against a role set and context.
    ///
    /// The pipeline runs in order (active roles, base permission,
    /// region scope, break-glass, two-person), stops at the first
    /// failing check, and always returns every check that executed.
    pub fn check_permission(
        &self,
        role_set: &UserRoleSet,
        capability: Capability,
        ctx: &AccessContext,
    ) -> PermissionCheckResult {
        let mut checks: Vec<CheckStep> = Vec::new();
        let mut applied_policies: Vec<String> = Vec::new();

        // 1. Active-role check
        if !role_set.has_active_roles {
            checks.push(CheckStep::failed(CheckKind::ActiveRoles, "no active roles"));
            return self.finish(
                capability,
                Decision::Deny,
                checks,
                Vec::new(),
                Vec::new(),
                applied_policies,
                format!("denied {capability}: caller holds no active roles"),
            );
        }
        checks.push(CheckStep::passed(CheckKind::ActiveRoles));

        // 2. Base permission check
        if !role_set.has(capability) {
            let granting_roles = self.catalog.roles_granting(capability);
            checks.push(CheckStep::failed(
                CheckKind::BasePermission,
                format!("{capability} not in effective permission set"),
            ));
            return self.finish(
                capability,
                Decision::Deny,
                checks,
                vec![capability],
                granting_roles,
                applied_policies,
                format!("denied {capability}: not granted by any active role"),
            );
        }
        checks.push(CheckStep::passed(CheckKind::BasePermission));

        // 3. Scope check
        if let Some(region) = &ctx.region_id {
            let in_scope = role_set
                .scopes
                .iter()
                .any(|s| s.region_ids.is_empty() || s.region_ids.contains(region));
            if !in_scope {
                checks.push(CheckStep::failed(
                    CheckKind::Scope,
                    format!("no assignment covers region {region}"),
                ));
                return self.finish(
                    capability,
                    Decision::Deny,
                    checks,
                    Vec::new(),
                    Vec::new(),
                    applied_policies,
                    format!("denied {capability}: outside assignment region scope ({region})"),
                );
            }
            checks.push(CheckStep::passed(CheckKind::Scope));
        }

        // 4. Break-glass check
        if let Some(required) = self.policies.break_glass.protected_scopes(capability) {
            applied_policies.push("break_glass".to_string());
            let missing: Vec<BreakGlassScope> = required
                .iter()
                .filter(|scope| {
                    ctx.break_glass
                        .as_ref()
                        .map_or(true, |grant| !grant.is_valid(**scope, ctx.now))
                })
                .copied()
                .collect();
            if !missing.is_empty() {
                let scope_list = missing
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                checks.push(CheckStep::failed(
                    CheckKind::BreakGlass,
                    format!("no valid grant for scopes: {scope_list}"),
                ));
                return self.finish(
                    capability,
                    Decision::RequiresBreakGlass {
                        missing_scopes: missing,
                    },
                    checks,
                    Vec::new(),
                    Vec::new(),
                    applied_policies,
                    format!("{capability} requires break-glass access ({scope_list})"),
                );
            }
            checks.push(CheckStep::passed(CheckKind::BreakGlass));
        }

        // 5. Two-person check
        if let Some(rule) = self
            .policies
            .two_person_rules
            .iter()
            .find(|r| r.action == capability)
        {
            if rule.condition.evaluate(ctx) {
                applied_policies.push("two_person".to_string());
                let satisfied = ctx
                    .two_person
                    .as_ref()
                    .map_or(false, |req| req.satisfies(capability, ctx.now));
                if !satisfied {
                    checks.push(CheckStep::failed(
                        CheckKind::TwoPerson,
                        format!("{} distinct approvals required", rule.required_approvals),
                    ));
                    return self.finish(
                        capability,
                        Decision::RequiresTwoPerson {
                            required_approvals: rule.required_approvals,
                        },
                        checks,
                        Vec::new(),
                        Vec::new(),
                        applied_policies,
                        format!(
                            "{capability} requires two-person approval ({} approvers)",
                            rule.required_approvals
                        ),
                    );
                }
                checks.push(CheckStep::passed(CheckKind::TwoPerson));
            }
        }

        self.finish(
            capability,
            Decision::Allow,
            checks,
            Vec::new(),
            Vec::new(),
            applied_policies,
            format!("allowed {capability}"),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        capability: Capability,
        decision: Decision,
        checks: Vec<CheckStep>,
        missing_permissions: Vec<Capability>,
        granting_roles: Vec<RoleId>,
        applied_policies: Vec<String>,
        audit_note: String,
    ) -> PermissionCheckResult {
        PermissionCheckResult {
            capability,
            decision,
            checks,
            missing_permissions,
            granting_roles,
            audit_note,
            applied_policies,
        }
    }

    /// Check several capabilities; a pure fan-out of
    /// [`AccessEngine::check_permission`].
    pub fn check_permissions(
        &self,
        role_set: &UserRoleSet,
        capabilities: &[Capability],
        ctx: &AccessContext,
    ) -> Vec<PermissionCheckResult> {
        capabilities
            .iter()
            .map(|c| self.check_permission(role_set, *c, ctx))
            .collect()
    }

    /// Whether every capability is allowed.
    pub fn has_all_permissions(
        &self,
        role_set: &UserRoleSet,
        capabilities: &[Capability],
        ctx: &AccessContext,
    ) -> bool {
        capabilities
            .iter()
            .all(|c| self.check_permission(role_set, *c, ctx).allowed())
    }

    /// Whether at least one capability is allowed.
    pub fn has_any_permission(
        &self,
        role_set: &UserRoleSet,
        capabilities: &[Capability],
        ctx: &AccessContext,
    ) -> bool {
        capabilities
            .iter()
            .any(|c| self.check_permission(role_set, *c, ctx).allowed())
    }

    /// Reconstruct a full explanation of a decision.
    ///
    /// Reports which held roles contribute the capability, which
    /// policies are relevant to it (whether or not they applied under
    /// this context), and remediation hints.
    pub fn explain_permission(
        &self,
        role_set: &UserRoleSet,
        capability: Capability,
        ctx: &AccessContext,
    ) -> PermissionExplanation {
        let result = self.check_permission(role_set, capability, ctx);

        let role_contributions: Vec<RoleContribution> = role_set
            .scopes
            .iter()
            .map(|scope| {
                let grants = self
                    .catalog
                    .get(scope.role_id)
                    .map(|d| d.permissions.contains(&capability))
                    .unwrap_or(false);
                RoleContribution {
                    role_id: scope.role_id,
                    grants,
                }
            })
            .collect();

        let mut relevant_policies = Vec::new();
        if self
            .policies
            .break_glass
            .protected_scopes(capability)
            .is_some()
        {
            relevant_policies.push(PolicyRelevance {
                policy: "break_glass".to_string(),
                applied: result.applied_policies.iter().any(|p| p == "break_glass"),
            });
        }
        if let Some(rule) = self
            .policies
            .two_person_rules
            .iter()
            .find(|r| r.action == capability)
        {
            relevant_policies.push(PolicyRelevance {
                policy: format!("two_person ({})", rule.reason),
                applied: result.applied_policies.iter().any(|p| p == "two_person"),
            });
        }

        let mut remediation = Vec::new();
        match &result.decision {
            Decision::Allow => {}
            Decision::Deny => {
                if !role_set.has_active_roles {
                    remediation.push("activate or renew a role assignment".to_string());
                } else if !result.granting_roles.is_empty() {
                    let roles = result
                        .granting_roles
                        .iter()
                        .map(|r| r.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    remediation.push(format!("capability is granted by: {roles}"));
                } else if ctx.region_id.is_some() {
                    remediation
                        .push("request a scope extension covering the target region".to_string());
                }
            }
            Decision::RequiresBreakGlass { missing_scopes } => {
                for scope in missing_scopes {
                    remediation.push(format!("obtain a break-glass grant covering {scope}"));
                }
            }
            Decision::RequiresTwoPerson { required_approvals } => {
                remediation.push(format!(
                    "collect {required_approvals} approvals from eligible roles"
                ));
            }
        }

        PermissionExplanation {
            capability,
            role_contributions,
            relevant_policies,
            remediation,
            result,
        }
    }
}

/// Whether one held role contributes a capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleContribution {
    /// The held role
    pub role_id: RoleId,
    /// Whether it grants the capability
    pub grants: bool,
}

/// A policy that exists for a capability, and whether it applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRelevance {
    /// Policy name
    pub policy: String,
    /// Whether it fired under the supplied context
    pub applied: bool,
}

/// Full explanation of a permission decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionExplanation {
    /// Capability explained
    pub capability: Capability,
    /// Per-role contribution of the caller's held roles
    pub role_contributions: Vec<RoleContribution>,
    /// Policies relevant to the capability, applied or not
    pub relevant_policies: Vec<PolicyRelevance>,
    /// Remediation hints
    pub remediation: Vec<String>,
    /// The underlying decision
    pub result: PermissionCheckResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reunite_roles::{RoleCatalog, UserRoleAssignment};
    use uuid::Uuid;

    fn engine() -> AccessEngine {
        AccessEngine::new(RoleCatalog::builtin().unwrap(), AccessPolicies::builtin())
    }

    fn role_set_for(engine: &AccessEngine, role_id: RoleId) -> UserRoleSet {
        let role = engine.catalog().get(role_id).unwrap();
        let assignment =
            UserRoleAssignment::new(Uuid::now_v7(), role, Uuid::now_v7(), "grant", Utc::now());
        UserRoleSet::compute(engine.catalog(), &[assignment], Utc::now()).unwrap()
    }

    #[test]
    fn test_no_active_roles_denies() {
        let engine = engine();
        let empty = UserRoleSet::compute(engine.catalog(), &[], Utc::now()).unwrap();
        let ctx = AccessContext::new(Utc::now());

        let result = engine.check_permission(&empty, Capability::CaseView, &ctx);
        assert_eq!(result.decision, Decision::Deny);
        assert_eq!(result.checks.len(), 1);
        assert!(!result.checks[0].passed);
    }

    #[test]
    fn test_base_permission_denial_lists_granting_roles() {
        let engine = engine();
        let junior = role_set_for(&engine, RoleId::JuniorModerator);
        let ctx = AccessContext::new(Utc::now());

        let result = engine.check_permission(&junior, Capability::VerificationApprove, &ctx);
        assert_eq!(result.decision, Decision::Deny);
        assert_eq!(result.missing_permissions, vec![Capability::VerificationApprove]);
        assert!(result.granting_roles.contains(&RoleId::Moderator));
        // The denied check trail still shows what ran.
        assert_eq!(result.checks.len(), 2);
    }

    #[test]
    fn test_allow_carries_audit_note() {
        let engine = engine();
        let moderator = role_set_for(&engine, RoleId::Moderator);
        let ctx = AccessContext::new(Utc::now());

        let result = engine.check_permission(&moderator, Capability::VerificationApprove, &ctx);
        assert!(result.allowed());
        assert!(result.audit_note.contains("verification.approve"));
    }

    #[test]
    fn test_determinism() {
        let engine = engine();
        let moderator = role_set_for(&engine, RoleId::Moderator);
        let ctx = AccessContext::new(Utc::now()).with_claim_score(40).with_dispute();

        let a = engine.check_permission(&moderator, Capability::CaseReleaseApprove, &ctx);
        let b = engine.check_permission(&moderator, Capability::CaseReleaseApprove, &ctx);
        assert_eq!(a.decision, b.decision);
        assert_eq!(a.applied_policies, b.applied_policies);
    }

    #[test]
    fn test_scope_check() {
        let engine = engine();
        let role = engine.catalog().get(RoleId::Dispatcher).unwrap();
        let scoped = UserRoleAssignment::new(Uuid::now_v7(), role, Uuid::now_v7(), "x", Utc::now())
            .with_regions(vec!["pnw".to_string()]);
        let set = UserRoleSet::compute(engine.catalog(), &[scoped], Utc::now()).unwrap();

        let in_region = AccessContext::new(Utc::now()).with_region("pnw");
        assert!(engine
            .check_permission(&set, Capability::CaseAssign, &in_region)
            .allowed());

        let out_of_region = AccessContext::new(Utc::now()).with_region("southeast");
        let result = engine.check_permission(&set, Capability::CaseAssign, &out_of_region);
        assert_eq!(result.decision, Decision::Deny);
        assert!(result.checks.iter().any(|c| c.kind == CheckKind::Scope && !c.passed));
    }

    #[test]
    fn test_unrestricted_assignment_covers_any_region() {
        let engine = engine();
        let set = role_set_for(&engine, RoleId::Dispatcher);
        let ctx = AccessContext::new(Utc::now()).with_region("anywhere");
        assert!(engine.check_permission(&set, Capability::CaseAssign, &ctx).allowed());
    }

    #[test]
    fn test_two_person_condition_skips_strong_claims() {
        let engine = engine();
        let senior = role_set_for(&engine, RoleId::SeniorModerator);

        // Strong, undisputed claim: the release rule does not fire.
        let strong = AccessContext::new(Utc::now()).with_claim_score(90);
        let result = engine.check_permission(&senior, Capability::CaseReleaseApprove, &strong);
        assert!(result.allowed());
        assert!(result.applied_policies.is_empty());

        // Weak claim: rule fires.
        let weak = AccessContext::new(Utc::now()).with_claim_score(30);
        let result = engine.check_permission(&senior, Capability::CaseReleaseApprove, &weak);
        assert_eq!(
            result.decision,
            Decision::RequiresTwoPerson { required_approvals: 2 }
        );
    }

    #[test]
    fn test_batch_fanouts() {
        let engine = engine();
        let member = role_set_for(&engine, RoleId::Member);
        let ctx = AccessContext::new(Utc::now());

        let caps = [Capability::CaseView, Capability::CaseArchive];
        let results = engine.check_permissions(&member, &caps, &ctx);
        assert_eq!(results.len(), 2);
        assert!(results[0].allowed());
        assert!(!results[1].allowed());

        assert!(engine.has_any_permission(&member, &caps, &ctx));
        assert!(!engine.has_all_permissions(&member, &caps, &ctx));
    }

    #[test]
    fn test_explain_lists_relevant_policies_even_when_not_applied() {
        let engine = engine();
        let senior = role_set_for(&engine, RoleId::SeniorModerator);
        let strong = AccessContext::new(Utc::now()).with_claim_score(90);

        let explanation =
            engine.explain_permission(&senior, Capability::CaseReleaseApprove, &strong);
        assert!(explanation.result.allowed());
        // The two-person policy is relevant to this capability even
        // though the condition did not fire.
        assert_eq!(explanation.relevant_policies.len(), 1);
        assert!(!explanation.relevant_policies[0].applied);
        assert!(explanation.role_contributions.iter().any(|c| c.grants));
    }

    #[test]
    fn test_explain_remediation_for_denial() {
        let engine = engine();
        let junior = role_set_for(&engine, RoleId::JuniorModerator);
        let ctx = AccessContext::new(Utc::now());

        let explanation =
            engine.explain_permission(&junior, Capability::VerificationApprove, &ctx);
        assert!(!explanation.result.allowed());
        assert!(explanation
            .remediation
            .iter()
            .any(|r| r.contains("moderator")));
    }
}
