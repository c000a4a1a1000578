//! Decision context
//!
//! The explicit, versioned context a permission check may inspect.
//! Every field a rule can read is enumerated here; rules cannot depend
//! on undocumented fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::break_glass::BreakGlassRequest;
use crate::two_person::TwoPersonApprovalRequest;

/// Schema version of [`AccessContext`].
///
/// Bumped whenever a field is added, so recorded context snapshots can
/// be interpreted after the fact.
pub const SCHEMA_VERSION: u32 = 1;

/// Alert tiers the platform can be operating under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertTier {
    /// Normal operations
    Standard,
    /// Heightened scrutiny (e.g. active scam wave)
    Elevated,
    /// Incident response
    Critical,
}

/// Context for one permission decision.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use reunite_access::AccessContext;
///
/// let ctx = AccessContext::new(Utc::now())
///     .with_region("pnw")
///     .with_claim_score(85);
/// assert_eq!(ctx.region_id.as_deref(), Some("pnw"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessContext {
    /// Context schema version
    pub version: u32,

    /// Decision time
    pub now: DateTime<Utc>,

    /// Region the operation targets, if regional
    pub region_id: Option<String>,

    /// Ownership-claim confidence score (0-100), when relevant
    pub claim_score: Option<u32>,

    /// Whether the targeted claim is disputed
    pub has_dispute: bool,

    /// Current platform alert tier
    pub alert_tier: Option<AlertTier>,

    /// Break-glass grant supplied as evidence, if any
    pub break_glass: Option<BreakGlassRequest>,

    /// Two-person approval request supplied as evidence, if any
    pub two_person: Option<TwoPersonApprovalRequest>,
}

impl AccessContext {
    /// Create an empty context at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            now,
            region_id: None,
            claim_score: None,
            has_dispute: false,
            alert_tier: None,
            break_glass: None,
            two_person: None,
        }
    }

    /// Set the target region.
    pub fn with_region(mut self, region_id: impl Into<String>) -> Self {
        self.region_id = Some(region_id.into());
        self
    }

    /// Set the claim score.
    pub fn with_claim_score(mut self, score: u32) -> Self {
        self.claim_score = Some(score);
        self
    }

    /// Mark the claim disputed.
    pub fn with_dispute(mut self) -> Self {
        self.has_dispute = true;
        self
    }

    /// Set the alert tier.
    pub fn with_alert_tier(mut self, tier: AlertTier) -> Self {
        self.alert_tier = Some(tier);
        self
    }

    /// Attach break-glass evidence.
    pub fn with_break_glass(mut self, request: BreakGlassRequest) -> Self {
        self.break_glass = Some(request);
        self
    }

    /// Attach two-person approval evidence.
    pub fn with_two_person(mut self, request: TwoPersonApprovalRequest) -> Self {
        self.two_person = Some(request);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_defaults() {
        let ctx = AccessContext::new(Utc::now());
        assert_eq!(ctx.version, SCHEMA_VERSION);
        assert!(ctx.region_id.is_none());
        assert!(!ctx.has_dispute);
        assert!(ctx.break_glass.is_none());
        assert!(ctx.two_person.is_none());
    }

    #[test]
    fn test_context_builders() {
        let ctx = AccessContext::new(Utc::now())
            .with_region("southeast")
            .with_claim_score(42)
            .with_dispute()
            .with_alert_tier(AlertTier::Elevated);
        assert_eq!(ctx.region_id.as_deref(), Some("southeast"));
        assert_eq!(ctx.claim_score, Some(42));
        assert!(ctx.has_dispute);
        assert_eq!(ctx.alert_tier, Some(AlertTier::Elevated));
    }
}
