//! Two-person approval
//!
//! Quorum rules requiring a minimum number of distinct, eligible
//! approvers (never the requester) before a high-impact action is
//! permitted. The time window is a hard boundary: a request that times
//! out can never later become satisfied, whatever approvals accumulate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use reunite_audit::{AuditEntry, AuditEventType, AuditSink, Versioned};
use reunite_roles::{Capability, RoleId};

use crate::context::AccessContext;

/// Condition under which a rule applies.
///
/// Conditions are data, not code: every field a condition may inspect
/// is an explicit member of [`AccessContext`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TwoPersonCondition {
    /// The rule always applies
    Always,
    /// Applies when the claim score is below the threshold, or the
    /// claim is disputed
    ClaimScoreBelowOrDisputed {
        /// Score threshold
        threshold: u32,
    },
}

impl TwoPersonCondition {
    /// Evaluate the condition against a decision context.
    pub fn evaluate(&self, ctx: &AccessContext) -> bool {
        match self {
            Self::Always => true,
            Self::ClaimScoreBelowOrDisputed { threshold } => {
                ctx.has_dispute || ctx.claim_score.map_or(true, |score| score < *threshold)
            }
        }
    }
}

/// One entry of the static two-person rule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoPersonRule {
    /// Action the rule protects
    pub action: Capability,

    /// Distinct approvals required
    pub required_approvals: u32,

    /// Roles whose holders may approve
    pub eligible_roles: Vec<RoleId>,

    /// Minutes before the request times out
    pub window_minutes: i64,

    /// Human-readable rationale for the rule
    pub reason: String,

    /// When the rule applies
    pub condition: TwoPersonCondition,
}

impl TwoPersonRule {
    /// The built-in production rule table.
    pub fn builtin() -> Vec<TwoPersonRule> {
        vec![
            TwoPersonRule {
                action: Capability::VolunteerSuspend,
                required_approvals: 2,
                eligible_roles: vec![
                    RoleId::SeniorModerator,
                    RoleId::Coordinator,
                    RoleId::Admin,
                ],
                window_minutes: 24 * 60,
                reason: "suspending a volunteer removes operational capacity".to_string(),
                condition: TwoPersonCondition::Always,
            },
            TwoPersonRule {
                action: Capability::VolunteerRevoke,
                required_approvals: 2,
                eligible_roles: vec![RoleId::Coordinator, RoleId::Admin],
                window_minutes: 24 * 60,
                reason: "revocation is permanent and bars reapplication".to_string(),
                condition: TwoPersonCondition::Always,
            },
            TwoPersonRule {
                action: Capability::CaseReleaseApprove,
                required_approvals: 2,
                eligible_roles: vec![
                    RoleId::Moderator,
                    RoleId::SeniorModerator,
                    RoleId::Coordinator,
                    RoleId::Admin,
                ],
                window_minutes: 12 * 60,
                reason: "weak or disputed ownership claims need a second reviewer".to_string(),
                condition: TwoPersonCondition::ClaimScoreBelowOrDisputed { threshold: 60 },
            },
            TwoPersonRule {
                action: Capability::DataExport,
                required_approvals: 2,
                eligible_roles: vec![RoleId::Coordinator, RoleId::Admin],
                window_minutes: 4 * 60,
                reason: "bulk export moves sensitive data out of the platform".to_string(),
                condition: TwoPersonCondition::Always,
            },
        ]
    }
}

/// Two-person request lifecycle states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TwoPersonStatus {
    /// Collecting approvals
    Pending,
    /// Quorum reached inside the window
    Satisfied,
    /// Window elapsed before quorum
    Expired,
    /// Withdrawn by the requester
    Cancelled,
}

/// One recorded approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    /// Approving user
    pub approver_id: Uuid,
    /// Role the approver acted under
    pub approver_role: RoleId,
    /// When the approval was recorded
    pub approved_at: DateTime<Utc>,
}

/// Two-person approval errors.
#[derive(Debug, Error)]
pub enum TwoPersonError {
    /// No rule exists for this action
    #[error("No two-person rule for action {0}")]
    NoRuleForAction(Capability),

    /// The requester may not approve their own request
    #[error("Requester {0} cannot approve their own request")]
    RequesterCannotApprove(Uuid),

    /// Only the requester may withdraw a request
    #[error("User {0} is not the requester and cannot cancel this request")]
    OnlyRequesterMayCancel(Uuid),

    /// The approver's role is not eligible under the rule
    #[error("Role {0} is not eligible to approve this request")]
    IneligibleRole(RoleId),

    /// The operation is not valid from the request's current status
    #[error("Cannot {operation} a request in status {status:?}")]
    InvalidStatus {
        /// Current status
        status: TwoPersonStatus,
        /// Operation attempted
        operation: &'static str,
    },

    /// The approval window has elapsed
    #[error("Approval window elapsed at {0}")]
    WindowElapsed(DateTime<Utc>),

    /// The manager holds no request with this id
    #[error("Unknown two-person request: {0}")]
    UnknownRequest(Uuid),

    /// The audit sink rejected the entry
    #[error("Audit sink error: {0}")]
    Sink(#[from] reunite_audit::AuditSinkError),
}

/// A quorum-approval request for one high-impact action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoPersonApprovalRequest {
    /// Unique request ID
    pub id: Uuid,

    /// Action awaiting approval
    pub action: Capability,

    /// Who wants to perform the action
    pub requester_id: Uuid,

    /// Reference to the resource the action targets
    pub target: String,

    /// Snapshot of the decision context at request time
    pub context_snapshot: serde_json::Value,

    /// Distinct approvals required
    pub required_approvals: u32,

    /// Roles whose holders may approve
    pub eligible_roles: Vec<RoleId>,

    /// Recorded approvals, at most one per approver
    #[serde(default)]
    pub approvals: Vec<Approval>,

    /// When the request was created
    pub created_at: DateTime<Utc>,

    /// Hard end of the approval window
    pub timeout_at: DateTime<Utc>,

    /// Lifecycle status
    pub status: TwoPersonStatus,

    /// Monotonically incrementing audit version
    pub audit_version: u64,
}

impl TwoPersonApprovalRequest {
    /// Instantiate a request from a rule.
    pub fn from_rule(
        rule: &TwoPersonRule,
        requester_id: Uuid,
        target: impl Into<String>,
        context_snapshot: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            action: rule.action,
            requester_id,
            target: target.into(),
            context_snapshot,
            required_approvals: rule.required_approvals,
            eligible_roles: rule.eligible_roles.clone(),
            approvals: Vec::new(),
            created_at: now,
            timeout_at: now + Duration::minutes(rule.window_minutes),
            status: TwoPersonStatus::Pending,
            audit_version: 1,
        }
    }

    /// Distinct eligible approvers recorded so far.
    ///
    /// Approvals are deduplicated at submission, but the count is
    /// re-derived defensively from distinct user ids, excluding the
    /// requester and ineligible roles.
    pub fn distinct_approvals(&self) -> usize {
        let mut seen: Vec<Uuid> = Vec::new();
        for approval in &self.approvals {
            if approval.approver_id == self.requester_id {
                continue;
            }
            if !self.eligible_roles.contains(&approval.approver_role) {
                continue;
            }
            if !seen.contains(&approval.approver_id) {
                seen.push(approval.approver_id);
            }
        }
        seen.len()
    }

    /// Whether the request is satisfied at `now`.
    ///
    /// Holds iff the request is still `Pending`, the window has not
    /// elapsed, and distinct eligible approvals meet the quorum.
    pub fn is_satisfied(&self, now: DateTime<Utc>) -> bool {
        self.status == TwoPersonStatus::Pending
            && now <= self.timeout_at
            && self.distinct_approvals() >= self.required_approvals as usize
    }

    /// Whether this request is usable evidence for `action` at `now`.
    ///
    /// Accepts both a pending request that currently meets quorum and
    /// one the manager already marked `Satisfied`, as long as the
    /// window has not elapsed.
    pub fn satisfies(&self, action: Capability, now: DateTime<Utc>) -> bool {
        self.action == action
            && now <= self.timeout_at
            && matches!(self.status, TwoPersonStatus::Pending | TwoPersonStatus::Satisfied)
            && self.distinct_approvals() >= self.required_approvals as usize
    }

    /// Record one approval.
    ///
    /// Idempotent per user: a second submission by the same approver
    /// returns the request unchanged. The requester and ineligible
    /// roles are rejected outright.
    ///
    /// # Errors
    ///
    /// [`TwoPersonError::WindowElapsed`] after the timeout,
    /// [`TwoPersonError::RequesterCannotApprove`],
    /// [`TwoPersonError::IneligibleRole`], or
    /// [`TwoPersonError::InvalidStatus`] outside `Pending`.
    pub fn approve(
        &self,
        approver_id: Uuid,
        approver_role: RoleId,
        now: DateTime<Utc>,
    ) -> Result<Self, TwoPersonError> {
        if self.status != TwoPersonStatus::Pending {
            return Err(TwoPersonError::InvalidStatus {
                status: self.status,
                operation: "approve",
            });
        }
        if now > self.timeout_at {
            return Err(TwoPersonError::WindowElapsed(self.timeout_at));
        }
        if approver_id == self.requester_id {
            return Err(TwoPersonError::RequesterCannotApprove(approver_id));
        }
        if !self.eligible_roles.contains(&approver_role) {
            return Err(TwoPersonError::IneligibleRole(approver_role));
        }
        if self.approvals.iter().any(|a| a.approver_id == approver_id) {
            return Ok(self.clone());
        }
        let mut next = self.clone();
        next.approvals.push(Approval {
            approver_id,
            approver_role,
            approved_at: now,
        });
        next.audit_version += 1;
        Ok(next)
    }

    /// Withdraw a pending request.
    ///
    /// Only the requester may cancel, and only while the request is
    /// `Pending`; a cancelled request is terminal.
    ///
    /// # Errors
    ///
    /// [`TwoPersonError::OnlyRequesterMayCancel`] for anyone else,
    /// [`TwoPersonError::InvalidStatus`] outside `Pending`.
    pub fn cancel(&self, cancelled_by: Uuid) -> Result<Self, TwoPersonError> {
        if cancelled_by != self.requester_id {
            return Err(TwoPersonError::OnlyRequesterMayCancel(cancelled_by));
        }
        if self.status != TwoPersonStatus::Pending {
            return Err(TwoPersonError::InvalidStatus {
                status: self.status,
                operation: "cancel",
            });
        }
        let mut next = self.clone();
        next.status = TwoPersonStatus::Cancelled;
        next.audit_version += 1;
        Ok(next)
    }

    /// Transition a pending request past its window to `Expired`.
    ///
    /// Idempotent. An expired request is terminal: it can never become
    /// satisfied.
    pub fn check_expiration(&self, now: DateTime<Utc>) -> Self {
        if self.status == TwoPersonStatus::Pending && now > self.timeout_at {
            let mut next = self.clone();
            next.status = TwoPersonStatus::Expired;
            next.audit_version += 1;
            return next;
        }
        self.clone()
    }
}

impl Versioned for TwoPersonApprovalRequest {
    fn audit_version(&self) -> u64 {
        self.audit_version
    }
}

/// In-memory two-person request store.
///
/// The approval append and the satisfied evaluation happen under one
/// mutex guard, so concurrent approvals by different people commute
/// and there is no window where quorum is met but the stored status
/// reads stale.
pub struct TwoPersonManager {
    store: Mutex<HashMap<Uuid, TwoPersonApprovalRequest>>,
    rules: Vec<TwoPersonRule>,
    sink: Arc<dyn AuditSink>,
}

impl TwoPersonManager {
    /// Create a manager over a rule table and audit sink.
    pub fn new(rules: Vec<TwoPersonRule>, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
            rules,
            sink,
        }
    }

    /// Find the rule for an action, if one exists.
    pub fn rule_for(&self, action: Capability) -> Option<&TwoPersonRule> {
        self.rules.iter().find(|r| r.action == action)
    }

    /// Create a request for an action from its rule.
    ///
    /// # Errors
    ///
    /// [`TwoPersonError::NoRuleForAction`] when the action has no rule.
    pub async fn create(
        &self,
        action: Capability,
        requester_id: Uuid,
        target: impl Into<String>,
        context_snapshot: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<TwoPersonApprovalRequest, TwoPersonError> {
        let rule = self
            .rule_for(action)
            .ok_or(TwoPersonError::NoRuleForAction(action))?;
        let request =
            TwoPersonApprovalRequest::from_rule(rule, requester_id, target, context_snapshot, now);
        let mut store = self.store.lock().await;
        self.sink
            .record(
                AuditEntry::new(
                    AuditEventType::TwoPersonRequested,
                    format!("two-person approval requested for {action}"),
                )
                .with_user(requester_id)
                .with_reason(rule.reason.clone())
                .with_metadata("request_id", serde_json::json!(request.id))
                .with_metadata("required_approvals", serde_json::json!(rule.required_approvals)),
            )
            .await?;
        store.insert(request.id, request.clone());
        Ok(request)
    }

    /// Record one approval, atomically evaluating satisfaction.
    ///
    /// When the approval completes the quorum, the stored request moves
    /// to `Satisfied` under the same lock and a satisfaction entry is
    /// recorded.
    pub async fn approve(
        &self,
        request_id: Uuid,
        approver_id: Uuid,
        approver_role: RoleId,
        now: DateTime<Utc>,
    ) -> Result<TwoPersonApprovalRequest, TwoPersonError> {
        let mut store = self.store.lock().await;
        let current = store
            .get(&request_id)
            .ok_or(TwoPersonError::UnknownRequest(request_id))?;
        let mut updated = current.approve(approver_id, approver_role, now)?;
        self.sink
            .record(
                AuditEntry::new(AuditEventType::TwoPersonApproved, "approval recorded")
                    .with_user(approver_id)
                    .with_metadata("request_id", serde_json::json!(request_id)),
            )
            .await?;
        if updated.is_satisfied(now) {
            updated.status = TwoPersonStatus::Satisfied;
            updated.audit_version += 1;
            self.sink
                .record(
                    AuditEntry::new(
                        AuditEventType::TwoPersonSatisfied,
                        format!("quorum reached for {}", updated.action),
                    )
                    .with_user(updated.requester_id)
                    .with_metadata("request_id", serde_json::json!(request_id)),
                )
                .await?;
            tracing::info!(request_id = %request_id, action = %updated.action, "two-person quorum reached");
        }
        store.insert(request_id, updated.clone());
        Ok(updated)
    }

    /// Withdraw a pending request on behalf of its requester,
    /// recording the cancellation under the same guard.
    pub async fn cancel(
        &self,
        request_id: Uuid,
        cancelled_by: Uuid,
    ) -> Result<TwoPersonApprovalRequest, TwoPersonError> {
        let mut store = self.store.lock().await;
        let current = store
            .get(&request_id)
            .ok_or(TwoPersonError::UnknownRequest(request_id))?;
        let cancelled = current.cancel(cancelled_by)?;
        self.sink
            .record(
                AuditEntry::new(AuditEventType::TwoPersonCancelled, "request withdrawn")
                    .with_user(cancelled_by)
                    .with_metadata("request_id", serde_json::json!(request_id)),
            )
            .await?;
        store.insert(request_id, cancelled.clone());
        tracing::info!(request_id = %request_id, "two-person request cancelled");
        Ok(cancelled)
    }

    /// Fetch a request snapshot.
    pub async fn get(&self, request_id: Uuid) -> Option<TwoPersonApprovalRequest> {
        self.store.lock().await.get(&request_id).cloned()
    }

    /// Transition every pending request past its window to `Expired`.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, TwoPersonError> {
        let mut store = self.store.lock().await;
        let expiring: Vec<Uuid> = store
            .values()
            .filter(|r| r.status == TwoPersonStatus::Pending && now > r.timeout_at)
            .map(|r| r.id)
            .collect();
        for id in &expiring {
            if let Some(current) = store.get(id) {
                let expired = current.check_expiration(now);
                self.sink
                    .record(
                        AuditEntry::new(AuditEventType::TwoPersonExpired, "approval window elapsed")
                            .with_user(expired.requester_id)
                            .with_metadata("request_id", serde_json::json!(id)),
                    )
                    .await?;
                store.insert(*id, expired);
            }
        }
        if !expiring.is_empty() {
            tracing::info!(count = expiring.len(), "expired two-person requests");
        }
        Ok(expiring.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reunite_audit::MemoryAuditSink;

    fn suspend_rule() -> TwoPersonRule {
        TwoPersonRule::builtin()
            .into_iter()
            .find(|r| r.action == Capability::VolunteerSuspend)
            .unwrap()
    }

    fn request(now: DateTime<Utc>) -> TwoPersonApprovalRequest {
        TwoPersonApprovalRequest::from_rule(
            &suspend_rule(),
            Uuid::now_v7(),
            "assignment:123",
            serde_json::json!({}),
            now,
        )
    }

    #[test]
    fn test_duplicate_approver_never_double_counts() {
        let now = Utc::now();
        let req = request(now);
        let approver = Uuid::now_v7();

        let once = req.approve(approver, RoleId::Coordinator, now).unwrap();
        let twice = once.approve(approver, RoleId::Coordinator, now).unwrap();
        assert_eq!(twice.distinct_approvals(), 1);
        assert_eq!(twice.approvals.len(), 1);
        assert!(!twice.is_satisfied(now));
    }

    #[test]
    fn test_requester_excluded() {
        let now = Utc::now();
        let req = request(now);
        let err = req
            .approve(req.requester_id, RoleId::Admin, now)
            .unwrap_err();
        assert!(matches!(err, TwoPersonError::RequesterCannotApprove(_)));
    }

    #[test]
    fn test_ineligible_role_rejected() {
        let now = Utc::now();
        let req = request(now);
        let err = req
            .approve(Uuid::now_v7(), RoleId::FieldVolunteer, now)
            .unwrap_err();
        assert!(matches!(err, TwoPersonError::IneligibleRole(RoleId::FieldVolunteer)));
    }

    #[test]
    fn test_quorum_of_distinct_approvers() {
        let now = Utc::now();
        let req = request(now);
        let one = req
            .approve(Uuid::now_v7(), RoleId::SeniorModerator, now)
            .unwrap();
        assert!(!one.is_satisfied(now));
        let two = one.approve(Uuid::now_v7(), RoleId::Coordinator, now).unwrap();
        assert!(two.is_satisfied(now));
        assert!(two.satisfies(Capability::VolunteerSuspend, now));
        assert!(!two.satisfies(Capability::VolunteerRevoke, now));
    }

    #[test]
    fn test_timeout_is_a_hard_boundary() {
        let now = Utc::now();
        let req = request(now);
        let late = now + Duration::hours(25);

        // Approvals after the window are rejected.
        assert!(matches!(
            req.approve(Uuid::now_v7(), RoleId::Admin, late),
            Err(TwoPersonError::WindowElapsed(_))
        ));

        // Even a quorum collected in time stops satisfying after the
        // window closes.
        let two = req
            .approve(Uuid::now_v7(), RoleId::Admin, now)
            .unwrap()
            .approve(Uuid::now_v7(), RoleId::Coordinator, now)
            .unwrap();
        assert!(two.is_satisfied(now));
        assert!(!two.is_satisfied(late));
        assert!(!two.satisfies(Capability::VolunteerSuspend, late));

        // And an expired request is terminal.
        let expired = two.check_expiration(late);
        assert_eq!(expired.status, TwoPersonStatus::Expired);
        assert!(!expired.is_satisfied(now));
    }

    #[test]
    fn test_condition_evaluation() {
        let always = TwoPersonCondition::Always;
        let conditional = TwoPersonCondition::ClaimScoreBelowOrDisputed { threshold: 60 };

        let mut ctx = AccessContext::new(Utc::now());
        assert!(always.evaluate(&ctx));
        // No score at all: treat as weak.
        assert!(conditional.evaluate(&ctx));

        ctx.claim_score = Some(80);
        assert!(!conditional.evaluate(&ctx));

        ctx.claim_score = Some(40);
        assert!(conditional.evaluate(&ctx));

        ctx.claim_score = Some(80);
        ctx.has_dispute = true;
        assert!(conditional.evaluate(&ctx));
    }

    #[test]
    fn test_cancel_is_requester_only_and_terminal() {
        let now = Utc::now();
        let req = request(now);

        // Anyone else is rejected.
        let err = req.cancel(Uuid::now_v7()).unwrap_err();
        assert!(matches!(err, TwoPersonError::OnlyRequesterMayCancel(_)));

        let cancelled = req.cancel(req.requester_id).unwrap();
        assert_eq!(cancelled.status, TwoPersonStatus::Cancelled);
        assert!(!cancelled.satisfies(Capability::VolunteerSuspend, now));

        // Terminal: no approvals, no second cancel.
        assert!(cancelled.approve(Uuid::now_v7(), RoleId::Admin, now).is_err());
        assert!(matches!(
            cancelled.cancel(cancelled.requester_id),
            Err(TwoPersonError::InvalidStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_manager_cancel_records_entry() {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = TwoPersonManager::new(TwoPersonRule::builtin(), sink.clone());
        let now = Utc::now();
        let requester = Uuid::now_v7();

        let req = manager
            .create(
                Capability::DataExport,
                requester,
                "export:region-report",
                serde_json::json!({}),
                now,
            )
            .await
            .unwrap();

        let cancelled = manager.cancel(req.id, requester).await.unwrap();
        assert_eq!(cancelled.status, TwoPersonStatus::Cancelled);
        assert!(sink
            .all()
            .await
            .iter()
            .any(|e| e.event_type == AuditEventType::TwoPersonCancelled));
    }

    #[tokio::test]
    async fn test_manager_marks_satisfied_atomically() {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = TwoPersonManager::new(TwoPersonRule::builtin(), sink.clone());
        let now = Utc::now();
        let requester = Uuid::now_v7();

        let req = manager
            .create(
                Capability::VolunteerSuspend,
                requester,
                "assignment:42",
                serde_json::json!({}),
                now,
            )
            .await
            .unwrap();

        let after_one = manager
            .approve(req.id, Uuid::now_v7(), RoleId::SeniorModerator, now)
            .await
            .unwrap();
        assert_eq!(after_one.status, TwoPersonStatus::Pending);

        let after_two = manager
            .approve(req.id, Uuid::now_v7(), RoleId::Coordinator, now)
            .await
            .unwrap();
        assert_eq!(after_two.status, TwoPersonStatus::Satisfied);

        let events: Vec<AuditEventType> =
            sink.all().await.into_iter().map(|e| e.event_type).collect();
        assert!(events.contains(&AuditEventType::TwoPersonSatisfied));
    }

    #[tokio::test]
    async fn test_manager_sweep() {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = TwoPersonManager::new(TwoPersonRule::builtin(), sink);
        let now = Utc::now();
        manager
            .create(
                Capability::DataExport,
                Uuid::now_v7(),
                "export:all",
                serde_json::json!({}),
                now,
            )
            .await
            .unwrap();

        let swept = manager.sweep_expired(now + Duration::hours(5)).await.unwrap();
        assert_eq!(swept, 1);
        assert_eq!(manager.sweep_expired(now + Duration::hours(6)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_manager_rejects_unknown_action() {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = TwoPersonManager::new(TwoPersonRule::builtin(), sink);
        let err = manager
            .create(
                Capability::CaseView,
                Uuid::now_v7(),
                "case:1",
                serde_json::json!({}),
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TwoPersonError::NoRuleForAction(_)));
    }
}
