//! Eligibility inputs
//!
//! This module defines the candidate profile supplied by the identity/
//! training collaborator at the engine boundary. The engine never
//! fetches this data itself; callers pass an already-resolved snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Identity Assurance Level (IAL).
///
/// Ordinal tier describing how strongly a user's identity has been
/// verified. Comparison is by ordinal: `Ial2 >= Ial1`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IdentityAssuranceLevel {
    /// Self-asserted identity, no verification
    Ial0 = 0,
    /// Email/phone verified
    Ial1 = 1,
    /// Government ID verified
    Ial2 = 2,
    /// In-person or notarized verification
    Ial3 = 3,
}

/// Background check status reported by the screening collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundCheckStatus {
    /// No check has been started
    NotStarted,
    /// A check is in flight
    Pending,
    /// The most recent check passed
    Passed,
    /// The most recent check failed
    Failed,
    /// A previously passed check has lapsed
    Expired,
}

/// Waiver types a candidate can sign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WaiverKind {
    /// General liability waiver
    Liability,
    /// Photo/media release
    MediaRelease,
    /// Animal transport waiver
    Transport,
    /// Animal handling waiver
    Handling,
}

/// Candidate eligibility snapshot.
///
/// Inbound boundary contract from the identity/training collaborator
/// (already resolved; the engine performs no I/O to obtain it).
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use reunite_roles::{EligibilityProfile, IdentityAssuranceLevel};
///
/// let profile = EligibilityProfile::new(Uuid::now_v7(), 24, IdentityAssuranceLevel::Ial2);
/// assert!(!profile.two_factor_enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityProfile {
    /// User ID
    pub user_id: Uuid,

    /// Age in years
    pub age: u32,

    /// How strongly the user's identity has been verified
    pub identity_assurance: IdentityAssuranceLevel,

    /// Whether two-factor authentication is enabled
    pub two_factor_enabled: bool,

    /// Waivers the user has signed
    #[serde(default)]
    pub signed_waivers: HashSet<WaiverKind>,

    /// Training modules the user has completed
    #[serde(default)]
    pub completed_trainings: HashSet<String>,

    /// Background check status
    pub background_check: BackgroundCheckStatus,

    /// Whether the onboarding interview is complete
    pub interview_completed: bool,
}

impl EligibilityProfile {
    /// Create a minimal profile with nothing signed or completed.
    pub fn new(user_id: Uuid, age: u32, identity_assurance: IdentityAssuranceLevel) -> Self {
        Self {
            user_id,
            age,
            identity_assurance,
            two_factor_enabled: false,
            signed_waivers: HashSet::new(),
            completed_trainings: HashSet::new(),
            background_check: BackgroundCheckStatus::NotStarted,
            interview_completed: false,
        }
    }

    /// Enable two-factor authentication.
    pub fn with_two_factor(mut self) -> Self {
        self.two_factor_enabled = true;
        self
    }

    /// Record a signed waiver.
    pub fn with_waiver(mut self, waiver: WaiverKind) -> Self {
        self.signed_waivers.insert(waiver);
        self
    }

    /// Record a completed training module.
    pub fn with_training(mut self, module: impl Into<String>) -> Self {
        self.completed_trainings.insert(module.into());
        self
    }

    /// Set the background check status.
    pub fn with_background_check(mut self, status: BackgroundCheckStatus) -> Self {
        self.background_check = status;
        self
    }

    /// Mark the onboarding interview complete.
    pub fn with_interview_completed(mut self) -> Self {
        self.interview_completed = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ial_ordering() {
        assert!(IdentityAssuranceLevel::Ial3 > IdentityAssuranceLevel::Ial2);
        assert!(IdentityAssuranceLevel::Ial2 > IdentityAssuranceLevel::Ial1);
        assert!(IdentityAssuranceLevel::Ial1 > IdentityAssuranceLevel::Ial0);
    }

    #[test]
    fn test_profile_builders() {
        let profile = EligibilityProfile::new(Uuid::now_v7(), 30, IdentityAssuranceLevel::Ial2)
            .with_two_factor()
            .with_waiver(WaiverKind::Liability)
            .with_training("field_rescue_basics")
            .with_background_check(BackgroundCheckStatus::Passed)
            .with_interview_completed();

        assert!(profile.two_factor_enabled);
        assert!(profile.signed_waivers.contains(&WaiverKind::Liability));
        assert!(profile.completed_trainings.contains("field_rescue_basics"));
        assert_eq!(profile.background_check, BackgroundCheckStatus::Passed);
        assert!(profile.interview_completed);
    }
}
