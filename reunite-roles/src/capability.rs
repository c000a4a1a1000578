//! # Capabilities
//!
//! Defines the closed set of operational permission tokens.
//! A capability names one operation a role may perform, in
//! `resource.action` form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational permission tokens.
///
/// The set is closed: decision tables (break-glass protection,
/// two-person rules) key off these variants, so new operations get a
/// new variant rather than a free-form string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// View case details
    CaseView,
    /// Open a new case
    CaseCreate,
    /// Edit case fields
    CaseUpdate,
    /// Triage a new case
    CaseTriage,
    /// Set the case owner / build the team
    CaseAssign,
    /// Move a case between statuses
    CaseTransition,
    /// Resolve a case
    CaseResolve,
    /// Close a resolved case
    CaseClose,
    /// Archive a closed case
    CaseArchive,
    /// Set or clear case flags
    CaseFlag,
    /// Add a public or team-visible note
    CaseNoteAdd,
    /// Add an internal-only note
    CaseNoteInternal,
    /// Approve releasing an animal to a claimant
    CaseReleaseApprove,

    /// Accept a field dispatch
    DispatchAccept,
    /// Run a transport leg
    TransportRun,

    /// Review an ownership-verification claim
    VerificationReview,
    /// Approve an ownership-verification claim
    VerificationApprove,

    /// Approve a volunteer role application
    VolunteerApprove,
    /// Suspend a volunteer role assignment
    VolunteerSuspend,
    /// Revoke a volunteer role assignment
    VolunteerRevoke,

    /// View personally identifying fields
    DataPiiView,
    /// View address fields
    DataAddressView,
    /// View contact fields
    DataContactView,
    /// Export record data in bulk
    DataExport,

    /// Grant a pending break-glass request
    BreakGlassGrant,
    /// Read the audit log
    AuditView,
}

impl Capability {
    /// Get the string representation of the capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CaseView => "case.view",
            Self::CaseCreate => "case.create",
            Self::CaseUpdate => "case.update",
            Self::CaseTriage => "case.triage",
            Self::CaseAssign => "case.assign",
            Self::CaseTransition => "case.transition",
            Self::CaseResolve => "case.resolve",
            Self::CaseClose => "case.close",
            Self::CaseArchive => "case.archive",
            Self::CaseFlag => "case.flag",
            Self::CaseNoteAdd => "case.note_add",
            Self::CaseNoteInternal => "case.note_internal",
            Self::CaseReleaseApprove => "case.release_approve",
            Self::DispatchAccept => "dispatch.accept",
            Self::TransportRun => "transport.run",
            Self::VerificationReview => "verification.review",
            Self::VerificationApprove => "verification.approve",
            Self::VolunteerApprove => "volunteer.approve",
            Self::VolunteerSuspend => "volunteer.suspend",
            Self::VolunteerRevoke => "volunteer.revoke",
            Self::DataPiiView => "data.pii_view",
            Self::DataAddressView => "data.address_view",
            Self::DataContactView => "data.contact_view",
            Self::DataExport => "data.export",
            Self::BreakGlassGrant => "access.break_glass_grant",
            Self::AuditView => "audit.view",
        }
    }

    /// Parse a capability from its string form.
    ///
    /// # Returns
    ///
    /// `Some(Capability)` if valid, `None` otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use reunite_roles::Capability;
    ///
    /// assert_eq!(Capability::parse("case.view"), Some(Capability::CaseView));
    /// assert_eq!(Capability::parse("data.pii_view"), Some(Capability::DataPiiView));
    /// assert_eq!(Capability::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.as_str() == s)
    }

    /// All capabilities.
    pub fn all() -> &'static [Capability] {
        &[
            Self::CaseView,
            Self::CaseCreate,
            Self::CaseUpdate,
            Self::CaseTriage,
            Self::CaseAssign,
            Self::CaseTransition,
            Self::CaseResolve,
            Self::CaseClose,
            Self::CaseArchive,
            Self::CaseFlag,
            Self::CaseNoteAdd,
            Self::CaseNoteInternal,
            Self::CaseReleaseApprove,
            Self::DispatchAccept,
            Self::TransportRun,
            Self::VerificationReview,
            Self::VerificationApprove,
            Self::VolunteerApprove,
            Self::VolunteerSuspend,
            Self::VolunteerRevoke,
            Self::DataPiiView,
            Self::DataAddressView,
            Self::DataContactView,
            Self::DataExport,
            Self::BreakGlassGrant,
            Self::AuditView,
        ]
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
