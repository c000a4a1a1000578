//! SLA policy and deadline tracking
//!
//! Deadlines come from a static policy table keyed by case type and
//! priority. An unmatched key falls back to the default policy, so a
//! case is never created without deadlines. Overdue status is derived,
//! never stored: a milestone being set permanently clears its overdue
//! flag.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::case::{Case, CaseActor, CasePriority, CaseType};

/// Deadline targets for one (case type, priority) combination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlaPolicy {
    pub triage_minutes: i64,
    pub first_response_minutes: i64,
    pub resolution_days: i64,
}

/// Fallback applied when no table entry matches:
/// triage 120 min, first response 240 min, resolution 30 days.
pub const DEFAULT_SLA_POLICY: SlaPolicy = SlaPolicy {
    triage_minutes: 120,
    first_response_minutes: 240,
    resolution_days: 30,
};

/// Static SLA policy table.
#[derive(Debug, Clone)]
pub struct SlaPolicyTable {
    entries: Vec<((CaseType, CasePriority), SlaPolicy)>,
    default: SlaPolicy,
}

impl SlaPolicyTable {
    /// The built-in production table.
    pub fn builtin() -> Self {
        let entries = vec![
            (
                (CaseType::LostPet, CasePriority::Urgent),
                SlaPolicy {
                    triage_minutes: 30,
                    first_response_minutes: 60,
                    resolution_days: 7,
                },
            ),
            (
                (CaseType::LostPet, CasePriority::High),
                SlaPolicy {
                    triage_minutes: 60,
                    first_response_minutes: 120,
                    resolution_days: 14,
                },
            ),
            (
                (CaseType::InjuredStray, CasePriority::Urgent),
                SlaPolicy {
                    triage_minutes: 15,
                    first_response_minutes: 45,
                    resolution_days: 3,
                },
            ),
            (
                (CaseType::InjuredStray, CasePriority::High),
                SlaPolicy {
                    triage_minutes: 30,
                    first_response_minutes: 90,
                    resolution_days: 7,
                },
            ),
            (
                (CaseType::TrappedRescue, CasePriority::Urgent),
                SlaPolicy {
                    triage_minutes: 15,
                    first_response_minutes: 30,
                    resolution_days: 2,
                },
            ),
            (
                (CaseType::WelfareCheck, CasePriority::Urgent),
                SlaPolicy {
                    triage_minutes: 30,
                    first_response_minutes: 120,
                    resolution_days: 5,
                },
            ),
        ];
        Self {
            entries,
            default: DEFAULT_SLA_POLICY,
        }
    }

    /// Look up the policy for a combination, falling back to the
    /// default when no entry matches.
    pub fn policy_for(&self, case_type: CaseType, priority: CasePriority) -> SlaPolicy {
        self.entries
            .iter()
            .find(|(key, _)| *key == (case_type, priority))
            .map(|(_, policy)| *policy)
            .unwrap_or(self.default)
    }
}

impl Default for SlaPolicyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A caller-defined deadline beyond the three standard ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomDeadline {
    pub label: String,
    pub due_at: DateTime<Utc>,
    pub created_by: CaseActor,
    pub created_at: DateTime<Utc>,
}

/// Which standard deadline an extension moved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineKind {
    Triage,
    FirstResponse,
    Resolution,
}

/// One granted deadline extension. The log is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaExtension {
    pub deadline: DeadlineKind,
    pub previous_due_at: DateTime<Utc>,
    pub new_due_at: DateTime<Utc>,
    pub extended_by: CaseActor,
    pub reason: String,
    pub extended_at: DateTime<Utc>,
}

/// The SLA block embedded in a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaBlock {
    pub triage_due_at: Option<DateTime<Utc>>,
    pub first_response_due_at: Option<DateTime<Utc>>,
    pub resolution_due_at: Option<DateTime<Utc>>,
    pub custom_deadlines: Vec<CustomDeadline>,
    pub extensions: Vec<SlaExtension>,
}

impl SlaBlock {
    /// A block with no deadlines, used only as a construction seed.
    pub fn empty() -> Self {
        Self {
            triage_due_at: None,
            first_response_due_at: None,
            resolution_due_at: None,
            custom_deadlines: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Compute the three standard deadlines from a policy at creation.
    pub fn from_policy(policy: SlaPolicy, created_at: DateTime<Utc>) -> Self {
        Self {
            triage_due_at: Some(created_at + Duration::minutes(policy.triage_minutes)),
            first_response_due_at: Some(
                created_at + Duration::minutes(policy.first_response_minutes),
            ),
            resolution_due_at: Some(created_at + Duration::days(policy.resolution_days)),
            custom_deadlines: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

/// Derived SLA standing for a case at an instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaStatus {
    pub triage_overdue: bool,
    pub first_response_overdue: bool,
    pub resolution_overdue: bool,
    /// The single nearest deadline whose milestone is still unset
    pub nearest_deadline: Option<(DeadlineKind, DateTime<Utc>)>,
}

/// Derive overdue flags and the nearest open deadline.
///
/// A deadline is overdue only while its milestone is unset; setting
/// the milestone flips the flag to false permanently.
pub fn check_sla_status(case: &Case, now: DateTime<Utc>) -> SlaStatus {
    let overdue = |due: Option<DateTime<Utc>>, milestone: Option<DateTime<Utc>>| {
        milestone.is_none() && due.map_or(false, |d| now > d)
    };

    let mut open: Vec<(DeadlineKind, DateTime<Utc>)> = Vec::new();
    if case.triaged_at.is_none() {
        if let Some(due) = case.sla.triage_due_at {
            open.push((DeadlineKind::Triage, due));
        }
    }
    if case.first_response_at.is_none() {
        if let Some(due) = case.sla.first_response_due_at {
            open.push((DeadlineKind::FirstResponse, due));
        }
    }
    if case.resolved_at.is_none() {
        if let Some(due) = case.sla.resolution_due_at {
            open.push((DeadlineKind::Resolution, due));
        }
    }

    SlaStatus {
        triage_overdue: overdue(case.sla.triage_due_at, case.triaged_at),
        first_response_overdue: overdue(case.sla.first_response_due_at, case.first_response_at),
        resolution_overdue: overdue(case.sla.resolution_due_at, case.resolved_at),
        nearest_deadline: open.into_iter().min_by_key(|(_, due)| *due),
    }
}
