//! Assignment eligibility validation
//!
//! This module checks a candidate against a role's requirements. Every
//! check runs independently and every failure is accumulated, so the
//! caller can present the complete remediation list in one pass rather
//! than one failure at a time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::assignment::{AssignmentStatus, UserRoleAssignment};
use crate::catalog::{RoleCatalog, RoleId};
use crate::eligibility::{BackgroundCheckStatus, EligibilityProfile, IdentityAssuranceLevel, WaiverKind};

/// How a pair of conflicting roles is resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// The higher-level role implicitly supersedes; no block
    Redundant,
    /// A human must decide; warn only
    RequiresApproval,
    /// The pair may never be held together; block
    Incompatible,
}

/// Static role-conflict table.
///
/// Symmetric: `(a, b)` and `(b, a)` resolve identically.
const ROLE_CONFLICTS: &[(RoleId, RoleId, ConflictResolution)] = &[
    (RoleId::Moderator, RoleId::JuniorModerator, ConflictResolution::Redundant),
    (RoleId::SeniorModerator, RoleId::Moderator, ConflictResolution::Redundant),
    (RoleId::Moderator, RoleId::FieldVolunteer, ConflictResolution::RequiresApproval),
    (RoleId::Dispatcher, RoleId::TransportVolunteer, ConflictResolution::RequiresApproval),
    (RoleId::SeniorModerator, RoleId::TeamLead, ConflictResolution::Incompatible),
];

/// Look up the conflict resolution for a role pair, order-insensitive.
pub fn conflict_between(a: RoleId, b: RoleId) -> Option<ConflictResolution> {
    ROLE_CONFLICTS
        .iter()
        .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, _, resolution)| *resolution)
}

/// Machine-readable validation failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ValidationIssue {
    /// None of the granter's roles may approve into the target role
    GranterNotAuthorized,
    /// Candidate is below the role's minimum age
    BelowMinimumAge {
        /// Required minimum age
        required: u32,
        /// Candidate age
        actual: u32,
    },
    /// Candidate identity assurance is below the minimum
    InsufficientIdentityAssurance {
        /// Required level
        required: IdentityAssuranceLevel,
        /// Candidate level
        actual: IdentityAssuranceLevel,
    },
    /// Two-factor authentication is required but not enabled
    TwoFactorRequired,
    /// Background check is required but not started
    BackgroundCheckMissing,
    /// Background check is required and still pending
    BackgroundCheckPending,
    /// Background check failed
    BackgroundCheckFailed,
    /// Onboarding interview is required but incomplete
    InterviewRequired,
    /// Required waivers are unsigned
    MissingWaivers {
        /// The unsigned waivers
        waivers: Vec<WaiverKind>,
    },
    /// Required trainings are incomplete
    MissingTrainings {
        /// The incomplete training module ids
        trainings: Vec<String>,
    },
    /// Prerequisite role is not actively held
    PrerequisiteMissing {
        /// The missing prerequisite
        role: RoleId,
    },
    /// Prerequisite role held for too short a time
    PrerequisiteTenureShort {
        /// The prerequisite role
        role: RoleId,
        /// Required tenure in days
        required_days: i64,
        /// Actual tenure in days
        actual_days: i64,
    },
    /// Candidate actively holds an incompatible role
    IncompatibleRole {
        /// The conflicting role
        role: RoleId,
    },
    /// Reapplication cooldown after revocation/expiry still running
    CooldownActive {
        /// When the cooldown ends
        until: DateTime<Utc>,
    },
}

/// Validation outcome.
///
/// `valid` is true only when `blockers` is empty; `warnings` never
/// block but should be surfaced to the approving human.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentValidation {
    /// Whether the assignment may proceed
    pub valid: bool,
    /// Structured blocking failures
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking findings the approver should see
    pub warnings: Vec<String>,
    /// Human-readable remediation list (one line per blocking failure)
    pub blockers: Vec<String>,
}

impl AssignmentValidation {
    fn block(&mut self, issue: ValidationIssue, message: impl Into<String>) {
        self.errors.push(issue);
        self.blockers.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Validate a candidate assignment, accumulating every failure.
///
/// The checks run in a fixed order (granter authority, age, identity
/// assurance, 2FA, background check, interview, waivers, trainings,
/// prerequisite, conflicts, cooldown) and none short-circuits.
///
/// # Arguments
///
/// * `catalog` - The validated role catalog
/// * `profile` - Candidate eligibility snapshot
/// * `role_id` - Role being applied for
/// * `existing` - All of the candidate's assignment records (any status)
/// * `granter_roles` - Roles held by whoever is granting
/// * `now` - Decision time
///
/// # Errors
///
/// Only configuration errors (unknown role id) are `Err`; eligibility
/// failures are reported inside the returned value.
pub fn validate_assignment(
    catalog: &RoleCatalog,
    profile: &EligibilityProfile,
    role_id: RoleId,
    existing: &[UserRoleAssignment],
    granter_roles: &[RoleId],
    now: DateTime<Utc>,
) -> Result<AssignmentValidation, crate::catalog::CatalogError> {
    let role = catalog.get(role_id)?;
    let mut result = AssignmentValidation {
        valid: false,
        errors: Vec::new(),
        warnings: Vec::new(),
        blockers: Vec::new(),
    };

    // Granter authority
    let mut authorized = false;
    for granter in granter_roles {
        if catalog.can_approve(*granter, role_id)? {
            authorized = true;
            break;
        }
    }
    if !authorized {
        result.block(
            ValidationIssue::GranterNotAuthorized,
            format!("granter is not authorized to approve into {role_id}"),
        );
    }

    // Age
    if profile.age < role.requirements.min_age {
        result.block(
            ValidationIssue::BelowMinimumAge {
                required: role.requirements.min_age,
                actual: profile.age,
            },
            format!(
                "minimum age is {} (candidate is {})",
                role.requirements.min_age, profile.age
            ),
        );
    }

    // Identity assurance (ordinal comparison)
    if let Some(required) = role.requirements.min_identity_assurance {
        if profile.identity_assurance < required {
            result.block(
                ValidationIssue::InsufficientIdentityAssurance {
                    required,
                    actual: profile.identity_assurance,
                },
                format!(
                    "identity assurance {:?} is below required {:?}",
                    profile.identity_assurance, required
                ),
            );
        }
    }

    // Two-factor
    if role.requirements.requires_two_factor && !profile.two_factor_enabled {
        result.block(
            ValidationIssue::TwoFactorRequired,
            "two-factor authentication must be enabled",
        );
    }

    // Background check: absent/pending/failed block; expired warns.
    if role.requirements.requires_background_check {
        match profile.background_check {
            BackgroundCheckStatus::Passed => {}
            BackgroundCheckStatus::NotStarted => result.block(
                ValidationIssue::BackgroundCheckMissing,
                "a background check is required and has not been started",
            ),
            BackgroundCheckStatus::Pending => result.block(
                ValidationIssue::BackgroundCheckPending,
                "the background check is still pending",
            ),
            BackgroundCheckStatus::Failed => result.block(
                ValidationIssue::BackgroundCheckFailed,
                "the background check failed",
            ),
            BackgroundCheckStatus::Expired => {
                result.warn("background check has expired and should be re-run")
            }
        }
    }

    // Interview
    if role.requirements.requires_interview && !profile.interview_completed {
        result.block(
            ValidationIssue::InterviewRequired,
            "the onboarding interview has not been completed",
        );
    }

    // Waivers
    let missing_waivers: Vec<WaiverKind> = role
        .requirements
        .required_waivers
        .iter()
        .filter(|w| !profile.signed_waivers.contains(w))
        .copied()
        .collect();
    if !missing_waivers.is_empty() {
        result.block(
            ValidationIssue::MissingWaivers {
                waivers: missing_waivers.clone(),
            },
            format!("unsigned waivers: {missing_waivers:?}"),
        );
    }

    // Trainings
    let missing_trainings: Vec<String> = role
        .requirements
        .required_trainings
        .iter()
        .filter(|t| !profile.completed_trainings.contains(*t))
        .cloned()
        .collect();
    if !missing_trainings.is_empty() {
        result.block(
            ValidationIssue::MissingTrainings {
                trainings: missing_trainings.clone(),
            },
            format!("incomplete trainings: {}", missing_trainings.join(", ")),
        );
    }

    // Prerequisite role presence and tenure
    if let Some(prereq) = &role.prerequisite {
        let held = existing.iter().find(|a| {
            a.role_id == prereq.role && a.status == AssignmentStatus::Active
        });
        match held {
            None => result.block(
                ValidationIssue::PrerequisiteMissing { role: prereq.role },
                format!("requires an active {} assignment", prereq.role),
            ),
            Some(assignment) => {
                let tenure_days = (now - assignment.granted_at).num_days();
                if tenure_days < prereq.min_tenure_days {
                    result.block(
                        ValidationIssue::PrerequisiteTenureShort {
                            role: prereq.role,
                            required_days: prereq.min_tenure_days,
                            actual_days: tenure_days,
                        },
                        format!(
                            "requires {} days as {} (has {})",
                            prereq.min_tenure_days, prereq.role, tenure_days
                        ),
                    );
                }
            }
        }
    }

    // Conflicts against actively held roles
    for held in existing
        .iter()
        .filter(|a| a.status == AssignmentStatus::Active)
    {
        match conflict_between(role_id, held.role_id) {
            Some(ConflictResolution::Incompatible) => result.block(
                ValidationIssue::IncompatibleRole { role: held.role_id },
                format!("{} is incompatible with held role {}", role_id, held.role_id),
            ),
            Some(ConflictResolution::RequiresApproval) => result.warn(format!(
                "{} alongside {} requires explicit human approval",
                role_id, held.role_id
            )),
            Some(ConflictResolution::Redundant) | None => {}
        }
    }

    // Reapplication cooldown from the most recent revoked/expired
    // record of the same role.
    if let Some(cooldown_days) = role.lifecycle.reapplication_cooldown_days {
        let last_ended = existing
            .iter()
            .filter(|a| a.role_id == role_id)
            .filter_map(|a| match a.status {
                AssignmentStatus::Revoked => {
                    a.revocation.as_ref().map(|r| r.revoked_at)
                }
                AssignmentStatus::Expired => a.expires_at,
                _ => None,
            })
            .max();
        if let Some(ended_at) = last_ended {
            let until = ended_at + Duration::days(cooldown_days);
            if now < until {
                result.block(
                    ValidationIssue::CooldownActive { until },
                    format!("reapplication cooldown runs until {until}"),
                );
            }
        }
    }

    result.valid = result.blockers.is_empty();
    Ok(result)
}
