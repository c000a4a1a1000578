//! Role catalog
//!
//! This module defines the static registry of role definitions: the
//! hierarchy of authority, per-role permission sets, eligibility
//! requirements, approval rights, and lifecycle policy.
//!
//! The catalog is configuration loaded once at process start. Every
//! structural problem (unknown references, reporting cycles, duplicate
//! levels) is a fatal load error, never a runtime condition.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::capability::Capability;
use crate::eligibility::{IdentityAssuranceLevel, WaiverKind};

/// Role identifiers.
///
/// The catalog is finite; every role the platform knows about is a
/// variant here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
    /// Registered member of the public
    Member,
    /// Foster home volunteer
    FosterVolunteer,
    /// Animal transport volunteer
    TransportVolunteer,
    /// Field rescue volunteer
    FieldVolunteer,
    /// Dispatch coordinator for field work
    Dispatcher,
    /// Volunteer team lead
    TeamLead,
    /// Moderator in training
    JuniorModerator,
    /// Claim and content moderator
    Moderator,
    /// Senior moderator with suspension authority
    SeniorModerator,
    /// Regional operations coordinator
    Coordinator,
    /// Platform administrator
    Admin,
}

impl RoleId {
    /// Get the string representation of the role id.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::FosterVolunteer => "foster_volunteer",
            Self::TransportVolunteer => "transport_volunteer",
            Self::FieldVolunteer => "field_volunteer",
            Self::Dispatcher => "dispatcher",
            Self::TeamLead => "team_lead",
            Self::JuniorModerator => "junior_moderator",
            Self::Moderator => "moderator",
            Self::SeniorModerator => "senior_moderator",
            Self::Coordinator => "coordinator",
            Self::Admin => "admin",
        }
    }

    /// Parse a role id from its string form (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "member" => Some(Self::Member),
            "foster_volunteer" => Some(Self::FosterVolunteer),
            "transport_volunteer" => Some(Self::TransportVolunteer),
            "field_volunteer" => Some(Self::FieldVolunteer),
            "dispatcher" => Some(Self::Dispatcher),
            "team_lead" => Some(Self::TeamLead),
            "junior_moderator" => Some(Self::JuniorModerator),
            "moderator" => Some(Self::Moderator),
            "senior_moderator" => Some(Self::SeniorModerator),
            "coordinator" => Some(Self::Coordinator),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// All role ids.
    pub fn all() -> &'static [RoleId] {
        &[
            Self::Member,
            Self::FosterVolunteer,
            Self::TransportVolunteer,
            Self::FieldVolunteer,
            Self::Dispatcher,
            Self::TeamLead,
            Self::JuniorModerator,
            Self::Moderator,
            Self::SeniorModerator,
            Self::Coordinator,
            Self::Admin,
        ]
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad role categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    /// Paid/appointed staff
    Staff,
    /// Claim and content moderation
    Moderator,
    /// Operational volunteers
    Volunteer,
    /// General public users
    User,
}

/// Eligibility requirements a candidate must satisfy before the role
/// can be granted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleRequirements {
    /// Minimum age in years
    pub min_age: u32,

    /// Minimum identity assurance level
    pub min_identity_assurance: Option<IdentityAssuranceLevel>,

    /// Whether two-factor authentication is required
    pub requires_two_factor: bool,

    /// Whether a passed background check is required
    pub requires_background_check: bool,

    /// Whether the onboarding interview is required
    pub requires_interview: bool,

    /// Waivers that must be signed
    #[serde(default)]
    pub required_waivers: Vec<WaiverKind>,

    /// Training modules that must be completed
    #[serde(default)]
    pub required_trainings: Vec<String>,
}

/// Assignment lifecycle policy for a role.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    /// Days after grant at which the assignment auto-expires
    pub auto_expire_days: Option<i64>,

    /// Days between required recertifications
    pub recertification_days: Option<i64>,

    /// Days a user must wait after revocation/expiry before reapplying
    pub reapplication_cooldown_days: Option<i64>,
}

/// Prerequisite role with minimum tenure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Prerequisite {
    /// Role the candidate must already hold (active)
    pub role: RoleId,

    /// Minimum days the prerequisite must have been held
    pub min_tenure_days: i64,
}

/// Operational load limits for a role.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OperationalLimits {
    /// Maximum cases a holder may own at once
    pub max_concurrent_cases: Option<u32>,

    /// Maximum simultaneous active dispatches
    pub max_active_dispatches: Option<u32>,

    /// Maximum shift hours per week
    pub max_weekly_shift_hours: Option<u32>,
}

/// One entry of the role catalog.
///
/// Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Role identifier
    pub id: RoleId,

    /// Human-readable name
    pub display_name: String,

    /// Authority level; levels are a strict total order across the
    /// catalog (no two roles share a level)
    pub level: u32,

    /// Broad category
    pub category: RoleCategory,

    /// Capabilities this role grants
    pub permissions: HashSet<Capability>,

    /// Roles a holder of this role may approve candidates into
    #[serde(default)]
    pub can_approve: Vec<RoleId>,

    /// Parent in the reporting forest, if any
    pub reports_to: Option<RoleId>,

    /// Eligibility requirements
    pub requirements: RoleRequirements,

    /// Assignment lifecycle policy
    pub lifecycle: LifecyclePolicy,

    /// Prerequisite role with minimum tenure, if any
    pub prerequisite: Option<Prerequisite>,

    /// Operational load limits
    pub limits: OperationalLimits,
}

/// Fatal catalog configuration errors.
///
/// All of these are detected at load; none can occur at decision time
/// against a validated catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A role id appears twice in the table
    #[error("Duplicate role definition: {0}")]
    DuplicateRole(RoleId),

    /// Lookup for a role the catalog does not define
    #[error("Unknown role: {0}")]
    UnknownRole(RoleId),

    /// `reports_to`, `can_approve`, or a prerequisite names an
    /// undefined role
    #[error("Role {role} references undefined role {referenced} in {field}")]
    DanglingReference {
        /// The role holding the bad reference
        role: RoleId,
        /// The undefined role referenced
        referenced: RoleId,
        /// Which field held the reference
        field: &'static str,
    },

    /// Two roles share an authority level
    #[error("Roles {0} and {1} share level {2}; levels must be a strict total order")]
    DuplicateLevel(RoleId, RoleId, u32),

    /// The reporting graph contains a cycle
    #[error("Reporting cycle detected at role {0}")]
    ReportingCycle(RoleId),
}

/// The validated role catalog.
///
/// Constructed once at process start via [`RoleCatalog::builtin`] (or
/// [`RoleCatalog::from_definitions`] for injected configuration) and
/// shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    roles: BTreeMap<RoleId, RoleDefinition>,
}

impl RoleCatalog {
    /// Build a catalog from explicit definitions, validating structure.
    ///
    /// # Errors
    ///
    /// Any duplicate id, dangling reference, duplicate level, or
    /// reporting cycle is a [`CatalogError`]; the process should treat
    /// this as fatal.
    pub fn from_definitions(definitions: Vec<RoleDefinition>) -> Result<Self, CatalogError> {
        let mut roles = BTreeMap::new();
        for def in definitions {
            if roles.insert(def.id, def.clone()).is_some() {
                return Err(CatalogError::DuplicateRole(def.id));
            }
        }
        let catalog = Self { roles };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The built-in production role table.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_definitions(builtin_definitions())
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for def in self.roles.values() {
            if let Some(parent) = def.reports_to {
                if !self.roles.contains_key(&parent) {
                    return Err(CatalogError::DanglingReference {
                        role: def.id,
                        referenced: parent,
                        field: "reports_to",
                    });
                }
            }
            for target in &def.can_approve {
                if !self.roles.contains_key(target) {
                    return Err(CatalogError::DanglingReference {
                        role: def.id,
                        referenced: *target,
                        field: "can_approve",
                    });
                }
            }
            if let Some(prereq) = &def.prerequisite {
                if !self.roles.contains_key(&prereq.role) {
                    return Err(CatalogError::DanglingReference {
                        role: def.id,
                        referenced: prereq.role,
                        field: "prerequisite",
                    });
                }
            }
        }

        // Levels must be a strict total order.
        let mut by_level: BTreeMap<u32, RoleId> = BTreeMap::new();
        for def in self.roles.values() {
            if let Some(existing) = by_level.insert(def.level, def.id) {
                return Err(CatalogError::DuplicateLevel(existing, def.id, def.level));
            }
        }

        // The reporting graph must be a forest.
        for start in self.roles.keys() {
            let mut seen = HashSet::new();
            let mut current = Some(*start);
            while let Some(role) = current {
                if !seen.insert(role) {
                    return Err(CatalogError::ReportingCycle(role));
                }
                current = self.roles.get(&role).and_then(|d| d.reports_to);
            }
        }

        Ok(())
    }

    /// Look up a role definition.
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownRole`] for ids the catalog does not
    /// define (a configuration error in the caller).
    pub fn get(&self, role_id: RoleId) -> Result<&RoleDefinition, CatalogError> {
        self.roles
            .get(&role_id)
            .ok_or(CatalogError::UnknownRole(role_id))
    }

    /// Authority level of a role.
    pub fn level_of(&self, role_id: RoleId) -> Result<u32, CatalogError> {
        Ok(self.get(role_id)?.level)
    }

    /// Whether role `a` outranks role `b` (strictly higher level).
    pub fn outranks(&self, a: RoleId, b: RoleId) -> Result<bool, CatalogError> {
        Ok(self.level_of(a)? > self.level_of(b)?)
    }

    /// The reporting chain from a role up to its root, starting with
    /// the role's direct parent.
    ///
    /// Termination is guaranteed: cycles are rejected at load.
    pub fn reporting_chain(&self, role_id: RoleId) -> Result<Vec<RoleId>, CatalogError> {
        let mut chain = Vec::new();
        let mut current = self.get(role_id)?.reports_to;
        while let Some(role) = current {
            chain.push(role);
            current = self.get(role)?.reports_to;
        }
        Ok(chain)
    }

    /// Whether `approver` may approve candidates into `target`.
    pub fn can_approve(&self, approver: RoleId, target: RoleId) -> Result<bool, CatalogError> {
        // Validate both sides exist before consulting the list.
        self.get(target)?;
        Ok(self.get(approver)?.can_approve.contains(&target))
    }

    /// Iterate all definitions.
    pub fn roles(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.roles.values()
    }

    /// Roles whose permission set includes `capability`.
    pub fn roles_granting(&self, capability: Capability) -> Vec<RoleId> {
        self.roles
            .values()
            .filter(|d| d.permissions.contains(&capability))
            .map(|d| d.id)
            .collect()
    }
}

fn perms(caps: &[Capability]) -> HashSet<Capability> {
    caps.iter().copied().collect()
}

/// The built-in role table.
fn builtin_definitions() -> Vec<RoleDefinition> {
    use Capability as C;

    vec![
        RoleDefinition {
            id: RoleId::Member,
            display_name: "Member".to_string(),
            level: 10,
            category: RoleCategory::User,
            permissions: perms(&[C::CaseView, C::CaseCreate, C::CaseNoteAdd]),
            can_approve: vec![],
            reports_to: None,
            requirements: RoleRequirements {
                min_age: 13,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial0),
                ..Default::default()
            },
            lifecycle: LifecyclePolicy::default(),
            prerequisite: None,
            limits: OperationalLimits::default(),
        },
        RoleDefinition {
            id: RoleId::FosterVolunteer,
            display_name: "Foster Volunteer".to_string(),
            level: 16,
            category: RoleCategory::Volunteer,
            permissions: perms(&[C::CaseView, C::CaseNoteAdd, C::CaseUpdate]),
            can_approve: vec![],
            reports_to: Some(RoleId::TeamLead),
            requirements: RoleRequirements {
                min_age: 18,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial1),
                requires_background_check: true,
                required_waivers: vec![WaiverKind::Liability],
                required_trainings: vec!["foster_basics".to_string()],
                ..Default::default()
            },
            lifecycle: LifecyclePolicy {
                auto_expire_days: Some(365),
                recertification_days: Some(180),
                reapplication_cooldown_days: Some(30),
            },
            prerequisite: None,
            limits: OperationalLimits {
                max_concurrent_cases: Some(2),
                ..Default::default()
            },
        },
        RoleDefinition {
            id: RoleId::TransportVolunteer,
            display_name: "Transport Volunteer".to_string(),
            level: 18,
            category: RoleCategory::Volunteer,
            permissions: perms(&[C::CaseView, C::CaseNoteAdd, C::TransportRun, C::CaseTransition]),
            can_approve: vec![],
            reports_to: Some(RoleId::TeamLead),
            requirements: RoleRequirements {
                min_age: 18,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial1),
                requires_background_check: true,
                required_waivers: vec![WaiverKind::Liability, WaiverKind::Transport],
                required_trainings: vec!["transport_safety".to_string()],
                ..Default::default()
            },
            lifecycle: LifecyclePolicy {
                auto_expire_days: Some(365),
                recertification_days: Some(180),
                reapplication_cooldown_days: Some(30),
            },
            prerequisite: None,
            limits: OperationalLimits {
                max_active_dispatches: Some(1),
                max_weekly_shift_hours: Some(20),
                ..Default::default()
            },
        },
        RoleDefinition {
            id: RoleId::FieldVolunteer,
            display_name: "Field Volunteer".to_string(),
            level: 20,
            category: RoleCategory::Volunteer,
            permissions: perms(&[
                C::CaseView,
                C::CaseNoteAdd,
                C::CaseUpdate,
                C::CaseTransition,
                C::DispatchAccept,
            ]),
            can_approve: vec![],
            reports_to: Some(RoleId::TeamLead),
            requirements: RoleRequirements {
                min_age: 18,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial1),
                requires_background_check: true,
                requires_interview: true,
                required_waivers: vec![WaiverKind::Liability, WaiverKind::Handling],
                required_trainings: vec![
                    "field_rescue_basics".to_string(),
                    "animal_handling".to_string(),
                ],
                ..Default::default()
            },
            lifecycle: LifecyclePolicy {
                auto_expire_days: Some(365),
                recertification_days: Some(180),
                reapplication_cooldown_days: Some(30),
            },
            prerequisite: None,
            limits: OperationalLimits {
                max_concurrent_cases: Some(3),
                max_active_dispatches: Some(1),
                max_weekly_shift_hours: Some(20),
            },
        },
        RoleDefinition {
            id: RoleId::Dispatcher,
            display_name: "Dispatcher".to_string(),
            level: 30,
            category: RoleCategory::Volunteer,
            permissions: perms(&[
                C::CaseView,
                C::CaseCreate,
                C::CaseUpdate,
                C::CaseAssign,
                C::CaseTransition,
                C::CaseFlag,
                C::CaseNoteAdd,
            ]),
            can_approve: vec![],
            reports_to: Some(RoleId::Coordinator),
            requirements: RoleRequirements {
                min_age: 18,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial2),
                requires_two_factor: true,
                requires_interview: true,
                required_trainings: vec!["dispatch_protocols".to_string()],
                ..Default::default()
            },
            lifecycle: LifecyclePolicy {
                auto_expire_days: Some(365),
                recertification_days: Some(180),
                reapplication_cooldown_days: Some(30),
            },
            prerequisite: Some(Prerequisite {
                role: RoleId::FieldVolunteer,
                min_tenure_days: 90,
            }),
            limits: OperationalLimits {
                max_weekly_shift_hours: Some(30),
                ..Default::default()
            },
        },
        RoleDefinition {
            id: RoleId::TeamLead,
            display_name: "Team Lead".to_string(),
            level: 35,
            category: RoleCategory::Volunteer,
            permissions: perms(&[
                C::CaseView,
                C::CaseNoteAdd,
                C::CaseUpdate,
                C::CaseTransition,
                C::DispatchAccept,
                C::CaseAssign,
                C::CaseNoteInternal,
                C::VerificationReview,
            ]),
            can_approve: vec![
                RoleId::FieldVolunteer,
                RoleId::TransportVolunteer,
                RoleId::FosterVolunteer,
            ],
            reports_to: Some(RoleId::Coordinator),
            requirements: RoleRequirements {
                min_age: 21,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial2),
                requires_two_factor: true,
                requires_background_check: true,
                requires_interview: true,
                required_waivers: vec![WaiverKind::Liability, WaiverKind::Handling],
                required_trainings: vec!["team_leadership".to_string()],
            },
            lifecycle: LifecyclePolicy {
                auto_expire_days: Some(365),
                recertification_days: Some(180),
                reapplication_cooldown_days: Some(60),
            },
            prerequisite: Some(Prerequisite {
                role: RoleId::FieldVolunteer,
                min_tenure_days: 180,
            }),
            limits: OperationalLimits {
                max_concurrent_cases: Some(6),
                max_active_dispatches: Some(2),
                max_weekly_shift_hours: Some(30),
            },
        },
        RoleDefinition {
            id: RoleId::JuniorModerator,
            display_name: "Junior Moderator".to_string(),
            level: 40,
            category: RoleCategory::Moderator,
            permissions: perms(&[
                C::CaseView,
                C::CaseTriage,
                C::CaseFlag,
                C::CaseNoteAdd,
                C::CaseNoteInternal,
                C::VerificationReview,
            ]),
            can_approve: vec![],
            reports_to: Some(RoleId::Moderator),
            requirements: RoleRequirements {
                min_age: 18,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial2),
                requires_two_factor: true,
                requires_interview: true,
                required_trainings: vec!["moderation_basics".to_string()],
                ..Default::default()
            },
            lifecycle: LifecyclePolicy {
                auto_expire_days: Some(365),
                recertification_days: Some(90),
                reapplication_cooldown_days: Some(60),
            },
            prerequisite: None,
            limits: OperationalLimits::default(),
        },
        RoleDefinition {
            id: RoleId::Moderator,
            display_name: "Moderator".to_string(),
            level: 50,
            category: RoleCategory::Moderator,
            permissions: perms(&[
                C::CaseView,
                C::CaseTriage,
                C::CaseFlag,
                C::CaseNoteAdd,
                C::CaseNoteInternal,
                C::VerificationReview,
                C::VerificationApprove,
                C::CaseUpdate,
                C::CaseTransition,
                C::VolunteerApprove,
            ]),
            can_approve: vec![],
            reports_to: Some(RoleId::SeniorModerator),
            requirements: RoleRequirements {
                min_age: 18,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial2),
                requires_two_factor: true,
                requires_background_check: true,
                requires_interview: true,
                required_trainings: vec![
                    "moderation_basics".to_string(),
                    "claim_verification".to_string(),
                ],
                ..Default::default()
            },
            lifecycle: LifecyclePolicy {
                auto_expire_days: Some(365),
                recertification_days: Some(90),
                reapplication_cooldown_days: Some(60),
            },
            prerequisite: Some(Prerequisite {
                role: RoleId::JuniorModerator,
                min_tenure_days: 60,
            }),
            limits: OperationalLimits::default(),
        },
        RoleDefinition {
            id: RoleId::SeniorModerator,
            display_name: "Senior Moderator".to_string(),
            level: 60,
            category: RoleCategory::Moderator,
            permissions: perms(&[
                C::CaseView,
                C::CaseTriage,
                C::CaseFlag,
                C::CaseNoteAdd,
                C::CaseNoteInternal,
                C::VerificationReview,
                C::VerificationApprove,
                C::CaseUpdate,
                C::CaseTransition,
                C::VolunteerApprove,
                C::VolunteerSuspend,
                C::CaseResolve,
                C::CaseReleaseApprove,
                C::DataContactView,
            ]),
            can_approve: vec![RoleId::JuniorModerator, RoleId::Moderator],
            reports_to: Some(RoleId::Coordinator),
            requirements: RoleRequirements {
                min_age: 21,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial3),
                requires_two_factor: true,
                requires_background_check: true,
                requires_interview: true,
                ..Default::default()
            },
            lifecycle: LifecyclePolicy {
                auto_expire_days: Some(365),
                recertification_days: Some(90),
                reapplication_cooldown_days: Some(90),
            },
            prerequisite: Some(Prerequisite {
                role: RoleId::Moderator,
                min_tenure_days: 180,
            }),
            limits: OperationalLimits::default(),
        },
        RoleDefinition {
            id: RoleId::Coordinator,
            display_name: "Coordinator".to_string(),
            level: 80,
            category: RoleCategory::Staff,
            permissions: perms(&[
                C::CaseView,
                C::CaseCreate,
                C::CaseTriage,
                C::CaseFlag,
                C::CaseNoteAdd,
                C::CaseNoteInternal,
                C::VerificationReview,
                C::VerificationApprove,
                C::CaseUpdate,
                C::CaseTransition,
                C::CaseAssign,
                C::VolunteerApprove,
                C::VolunteerSuspend,
                C::VolunteerRevoke,
                C::CaseResolve,
                C::CaseClose,
                C::CaseArchive,
                C::CaseReleaseApprove,
                C::DataContactView,
                C::DataAddressView,
                C::DataPiiView,
                C::DataExport,
                C::BreakGlassGrant,
                C::AuditView,
            ]),
            can_approve: vec![
                RoleId::FosterVolunteer,
                RoleId::TransportVolunteer,
                RoleId::FieldVolunteer,
                RoleId::Dispatcher,
                RoleId::TeamLead,
                RoleId::JuniorModerator,
                RoleId::Moderator,
                RoleId::SeniorModerator,
            ],
            reports_to: Some(RoleId::Admin),
            requirements: RoleRequirements {
                min_age: 21,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial3),
                requires_two_factor: true,
                requires_background_check: true,
                requires_interview: true,
                ..Default::default()
            },
            lifecycle: LifecyclePolicy {
                recertification_days: Some(365),
                ..Default::default()
            },
            prerequisite: None,
            limits: OperationalLimits::default(),
        },
        RoleDefinition {
            id: RoleId::Admin,
            display_name: "Administrator".to_string(),
            level: 100,
            category: RoleCategory::Staff,
            permissions: Capability::all().iter().copied().collect(),
            can_approve: RoleId::all().to_vec(),
            reports_to: None,
            requirements: RoleRequirements {
                min_age: 21,
                min_identity_assurance: Some(IdentityAssuranceLevel::Ial3),
                requires_two_factor: true,
                requires_background_check: true,
                requires_interview: true,
                ..Default::default()
            },
            lifecycle: LifecyclePolicy::default(),
            prerequisite: None,
            limits: OperationalLimits::default(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = RoleCatalog::builtin().unwrap();
        assert_eq!(catalog.roles().count(), RoleId::all().len());
    }

    #[test]
    fn test_levels_are_strict_total_order() {
        let catalog = RoleCatalog::builtin().unwrap();
        let mut levels: Vec<u32> = catalog.roles().map(|d| d.level).collect();
        levels.sort_unstable();
        levels.dedup();
        assert_eq!(levels.len(), RoleId::all().len());
    }

    #[test]
    fn test_outranks() {
        let catalog = RoleCatalog::builtin().unwrap();
        assert!(catalog.outranks(RoleId::Moderator, RoleId::JuniorModerator).unwrap());
        assert!(!catalog.outranks(RoleId::JuniorModerator, RoleId::Moderator).unwrap());
        assert!(catalog.outranks(RoleId::Admin, RoleId::Coordinator).unwrap());
    }

    #[test]
    fn test_reporting_chain() {
        let catalog = RoleCatalog::builtin().unwrap();
        let chain = catalog.reporting_chain(RoleId::JuniorModerator).unwrap();
        assert_eq!(
            chain,
            vec![
                RoleId::Moderator,
                RoleId::SeniorModerator,
                RoleId::Coordinator,
                RoleId::Admin,
            ]
        );
        assert!(catalog.reporting_chain(RoleId::Admin).unwrap().is_empty());
    }

    #[test]
    fn test_can_approve() {
        let catalog = RoleCatalog::builtin().unwrap();
        assert!(catalog.can_approve(RoleId::TeamLead, RoleId::FieldVolunteer).unwrap());
        assert!(!catalog.can_approve(RoleId::FieldVolunteer, RoleId::TeamLead).unwrap());
        assert!(catalog.can_approve(RoleId::Admin, RoleId::Coordinator).unwrap());
    }

    #[test]
    fn test_reporting_cycle_is_fatal() {
        let mut defs = builtin_definitions();
        // Point admin back down the chain to create a cycle.
        for def in &mut defs {
            if def.id == RoleId::Admin {
                def.reports_to = Some(RoleId::Coordinator);
            }
        }
        let err = RoleCatalog::from_definitions(defs).unwrap_err();
        assert!(matches!(err, CatalogError::ReportingCycle(_)));
    }

    #[test]
    fn test_dangling_reference_is_fatal() {
        let defs: Vec<RoleDefinition> = builtin_definitions()
            .into_iter()
            .filter(|d| d.id != RoleId::FieldVolunteer)
            .collect();
        // Dispatcher's prerequisite now references a missing role.
        let err = RoleCatalog::from_definitions(defs).unwrap_err();
        assert!(matches!(err, CatalogError::DanglingReference { .. }));
    }

    #[test]
    fn test_duplicate_level_is_fatal() {
        let mut defs = builtin_definitions();
        for def in &mut defs {
            if def.id == RoleId::Moderator {
                def.level = 40; // same as junior_moderator
            }
        }
        let err = RoleCatalog::from_definitions(defs).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateLevel(..)));
    }

    #[test]
    fn test_roles_granting() {
        let catalog = RoleCatalog::builtin().unwrap();
        let granting = catalog.roles_granting(Capability::VerificationApprove);
        assert!(granting.contains(&RoleId::Moderator));
        assert!(granting.contains(&RoleId::SeniorModerator));
        assert!(!granting.contains(&RoleId::JuniorModerator));
    }

    #[test]
    fn test_role_id_parse() {
        assert_eq!(RoleId::parse("moderator"), Some(RoleId::Moderator));
        assert_eq!(RoleId::parse("TEAM_LEAD"), Some(RoleId::TeamLead));
        assert_eq!(RoleId::parse("invalid"), None);
    }
}
