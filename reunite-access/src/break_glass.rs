//! Break-glass access
//!
//! Time-boxed, scope-limited, heavily logged grants that override the
//! normal restriction on sensitive fields. A grant past its TTL is
//! treated identically to one that was never granted: the decision
//! reverts to requiring break-glass, it is not merely logged as a
//! violation after the fact.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use reunite_audit::{AuditEntry, AuditEventType, AuditSink, Versioned};
use reunite_roles::Capability;

/// Sensitive-data scopes a grant can cover.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BreakGlassScope {
    /// Personally identifying fields
    Pii,
    /// Address fields
    Address,
    /// Contact fields (phone, email)
    Contact,
}

impl BreakGlassScope {
    /// Get the string representation of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pii => "pii",
            Self::Address => "address",
            Self::Contact => "contact",
        }
    }
}

impl fmt::Display for BreakGlassScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason codes for a break-glass request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BreakGlassReason {
    /// A person or animal is in immediate danger
    ImmediateSafety,
    /// A veterinary emergency needs owner contact now
    VeterinaryEmergency,
    /// Responding to a law-enforcement request
    LawEnforcement,
    /// Correcting bad data on a record
    DataCorrection,
    /// Anything else; requires a written justification
    Other,
}

impl BreakGlassReason {
    /// Whether requests with this reason are granted at creation time.
    ///
    /// Everything else starts `Pending` and needs a separate grant by
    /// an authorized party.
    pub fn auto_grants(&self) -> bool {
        matches!(self, Self::ImmediateSafety | Self::VeterinaryEmergency)
    }
}

/// Break-glass request lifecycle states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BreakGlassStatus {
    /// Awaiting a grant decision
    Pending,
    /// Granted and usable until expiry
    Granted,
    /// Denied by an authorized party
    Denied,
    /// Lapsed past its TTL
    Expired,
    /// Revoked before expiry
    Revoked,
}

/// Read or write access under a grant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    /// Data was read
    Read,
    /// Data was written
    Write,
}

/// One resource touch under an active grant.
///
/// The accessed-resources log is the primary compliance artifact: it
/// is append-only and never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAccess {
    /// Read or write
    pub kind: AccessKind,
    /// Resource type touched (e.g. "user_profile")
    pub resource_type: String,
    /// Resource id touched
    pub resource_id: String,
    /// When the access happened
    pub accessed_at: DateTime<Utc>,
}

/// Break-glass configuration.
///
/// Static data loaded at process start; no runtime API mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakGlassPolicy {
    /// Hard ceiling on grant TTL in minutes; requested TTLs are clamped
    pub max_ttl_minutes: i64,

    /// TTL applied when the requester does not ask for one
    pub default_ttl_minutes: i64,

    /// Hours after grant by which the post-hoc review is due
    pub review_deadline_hours: i64,

    /// Capabilities that require break-glass, and the scopes each needs
    pub protected: Vec<(Capability, Vec<BreakGlassScope>)>,
}

impl BreakGlassPolicy {
    /// The built-in production policy.
    pub fn builtin() -> Self {
        Self {
            max_ttl_minutes: 60,
            default_ttl_minutes: 30,
            review_deadline_hours: 72,
            protected: vec![
                (Capability::DataPiiView, vec![BreakGlassScope::Pii]),
                (Capability::DataAddressView, vec![BreakGlassScope::Address]),
                (Capability::DataContactView, vec![BreakGlassScope::Contact]),
            ],
        }
    }

    /// Scopes a capability requires, or `None` when it is unprotected.
    pub fn protected_scopes(&self, capability: Capability) -> Option<&[BreakGlassScope]> {
        self.protected
            .iter()
            .find(|(c, _)| *c == capability)
            .map(|(_, scopes)| scopes.as_slice())
    }

    /// Clamp a requested TTL to the configured maximum.
    pub fn clamp_ttl(&self, requested_minutes: Option<i64>) -> i64 {
        requested_minutes
            .unwrap_or(self.default_ttl_minutes)
            .clamp(1, self.max_ttl_minutes)
    }
}

impl Default for BreakGlassPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Break-glass errors.
#[derive(Debug, Error)]
pub enum BreakGlassError {
    /// A request must cover at least one scope
    #[error("Break-glass request must name at least one scope")]
    EmptyScopes,

    /// The operation is not valid from the request's current status
    #[error("Cannot {operation} a break-glass request in status {status:?}")]
    InvalidStatus {
        /// Current status
        status: BreakGlassStatus,
        /// Operation attempted
        operation: &'static str,
    },

    /// The manager holds no request with this id
    #[error("Unknown break-glass request: {0}")]
    UnknownRequest(Uuid),

    /// The audit sink rejected the entry
    #[error("Audit sink error: {0}")]
    Sink(#[from] reunite_audit::AuditSinkError),
}

/// A break-glass request/grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakGlassRequest {
    /// Unique request ID
    pub id: Uuid,

    /// Who is asking for access
    pub requester_id: Uuid,

    /// Scopes requested
    pub scopes: Vec<BreakGlassScope>,

    /// Reason code
    pub reason: BreakGlassReason,

    /// Free-text justification
    pub justification: String,

    /// Lifecycle status
    pub status: BreakGlassStatus,

    /// TTL in minutes, already clamped to policy
    pub ttl_minutes: i64,

    /// Who granted the request (the requester for auto-grants)
    pub granted_by: Option<Uuid>,

    /// When the request was granted
    pub granted_at: Option<DateTime<Utc>>,

    /// When the grant lapses; set at grant time
    pub expires_at: Option<DateTime<Utc>>,

    /// When the request was created
    pub created_at: DateTime<Utc>,

    /// Append-only log of resources touched under the grant
    #[serde(default)]
    pub accessed_resources: Vec<ResourceAccess>,

    /// When the mandatory post-hoc review is due; set at grant time
    pub review_due_at: Option<DateTime<Utc>>,

    /// Outcome of the post-hoc review
    pub review_outcome: Option<String>,

    /// Monotonically incrementing audit version
    pub audit_version: u64,
}

impl BreakGlassRequest {
    /// Create a request.
    ///
    /// The TTL is clamped to the policy maximum. Reasons that
    /// auto-grant ([`BreakGlassReason::auto_grants`]) come back already
    /// `Granted` with expiry and review deadline set; everything else
    /// starts `Pending`.
    ///
    /// # Errors
    ///
    /// [`BreakGlassError::EmptyScopes`] when no scope is requested.
    pub fn create(
        requester_id: Uuid,
        scopes: Vec<BreakGlassScope>,
        reason: BreakGlassReason,
        justification: impl Into<String>,
        ttl_minutes: Option<i64>,
        policy: &BreakGlassPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, BreakGlassError> {
        if scopes.is_empty() {
            return Err(BreakGlassError::EmptyScopes);
        }
        let ttl = policy.clamp_ttl(ttl_minutes);
        let mut request = Self {
            id: Uuid::now_v7(),
            requester_id,
            scopes,
            reason,
            justification: justification.into(),
            status: BreakGlassStatus::Pending,
            ttl_minutes: ttl,
            granted_by: None,
            granted_at: None,
            expires_at: None,
            created_at: now,
            accessed_resources: Vec::new(),
            review_due_at: None,
            review_outcome: None,
            audit_version: 1,
        };
        if reason.auto_grants() {
            request.apply_grant(requester_id, policy, now);
        }
        Ok(request)
    }

    fn apply_grant(&mut self, granted_by: Uuid, policy: &BreakGlassPolicy, now: DateTime<Utc>) {
        self.status = BreakGlassStatus::Granted;
        self.granted_by = Some(granted_by);
        self.granted_at = Some(now);
        self.expires_at = Some(now + Duration::minutes(self.ttl_minutes));
        self.review_due_at = Some(now + Duration::hours(policy.review_deadline_hours));
    }

    /// Grant a pending request.
    ///
    /// # Errors
    ///
    /// [`BreakGlassError::InvalidStatus`] unless the request is
    /// `Pending`.
    pub fn grant(
        &self,
        granted_by: Uuid,
        policy: &BreakGlassPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, BreakGlassError> {
        if self.status != BreakGlassStatus::Pending {
            return Err(BreakGlassError::InvalidStatus {
                status: self.status,
                operation: "grant",
            });
        }
        let mut next = self.clone();
        next.apply_grant(granted_by, policy, now);
        next.audit_version += 1;
        Ok(next)
    }

    /// Deny a pending request.
    pub fn deny(&self) -> Result<Self, BreakGlassError> {
        if self.status != BreakGlassStatus::Pending {
            return Err(BreakGlassError::InvalidStatus {
                status: self.status,
                operation: "deny",
            });
        }
        let mut next = self.clone();
        next.status = BreakGlassStatus::Denied;
        next.audit_version += 1;
        Ok(next)
    }

    /// Revoke a granted request before expiry.
    pub fn revoke(&self) -> Result<Self, BreakGlassError> {
        if self.status != BreakGlassStatus::Granted {
            return Err(BreakGlassError::InvalidStatus {
                status: self.status,
                operation: "revoke",
            });
        }
        let mut next = self.clone();
        next.status = BreakGlassStatus::Revoked;
        next.audit_version += 1;
        Ok(next)
    }

    /// Whether the grant covers `scope` and is usable at `now`.
    ///
    /// Pure function: `Granted`, unexpired, and scope-inclusive. An
    /// expired grant is indistinguishable from one never granted.
    pub fn is_valid(&self, scope: BreakGlassScope, now: DateTime<Utc>) -> bool {
        self.status == BreakGlassStatus::Granted
            && self.expires_at.map_or(false, |exp| now < exp)
            && self.scopes.contains(&scope)
    }

    /// Append a resource access to the compliance log.
    ///
    /// # Errors
    ///
    /// [`BreakGlassError::InvalidStatus`] when the grant is not
    /// currently usable.
    pub fn record_access(
        &self,
        kind: AccessKind,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, BreakGlassError> {
        let usable = self.status == BreakGlassStatus::Granted
            && self.expires_at.map_or(false, |exp| now < exp);
        if !usable {
            return Err(BreakGlassError::InvalidStatus {
                status: self.status,
                operation: "record access under",
            });
        }
        let mut next = self.clone();
        next.accessed_resources.push(ResourceAccess {
            kind,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            accessed_at: now,
        });
        next.audit_version += 1;
        Ok(next)
    }

    /// Record the post-hoc review outcome.
    pub fn complete_review(&self, outcome: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.review_outcome = Some(outcome.into());
        next.audit_version += 1;
        next
    }

    /// Transition a granted request past its TTL to `Expired`.
    ///
    /// Idempotent; unexpired or terminal requests come back unchanged.
    pub fn check_expiration(&self, now: DateTime<Utc>) -> Self {
        if self.status == BreakGlassStatus::Granted {
            if let Some(expires_at) = self.expires_at {
                if now >= expires_at {
                    let mut next = self.clone();
                    next.status = BreakGlassStatus::Expired;
                    next.audit_version += 1;
                    return next;
                }
            }
        }
        self.clone()
    }
}

impl Versioned for BreakGlassRequest {
    fn audit_version(&self) -> u64 {
        self.audit_version
    }
}

/// In-memory break-glass store with atomic grant + audit append.
///
/// All state changes happen under one write lock, with the audit entry
/// recorded before the lock is released: a grant is never observable
/// without its log entry, and duplicate opens of the same request id
/// cannot produce two grants.
pub struct BreakGlassManager {
    store: RwLock<HashMap<Uuid, BreakGlassRequest>>,
    policy: BreakGlassPolicy,
    sink: Arc<dyn AuditSink>,
}

impl BreakGlassManager {
    /// Create a manager over the given policy and audit sink.
    pub fn new(policy: BreakGlassPolicy, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            policy,
            sink,
        }
    }

    /// The policy this manager applies.
    pub fn policy(&self) -> &BreakGlassPolicy {
        &self.policy
    }

    /// Create and store a request, auto-granting where the reason code
    /// allows.
    ///
    /// Auto-grant and the audit append happen under the same write
    /// lock. Re-opening an id already in the store returns the stored
    /// request unchanged, with no second grant and no second entry.
    pub async fn open(
        &self,
        request: BreakGlassRequest,
    ) -> Result<BreakGlassRequest, BreakGlassError> {
        let mut store = self.store.write().await;
        if let Some(existing) = store.get(&request.id) {
            return Ok(existing.clone());
        }
        let entry_type = if request.status == BreakGlassStatus::Granted {
            AuditEventType::BreakGlassGranted
        } else {
            AuditEventType::BreakGlassRequested
        };
        self.sink
            .record(
                AuditEntry::new(
                    entry_type,
                    format!("break-glass request opened ({:?})", request.reason),
                )
                .with_user(request.requester_id)
                .with_reason(request.justification.clone())
                .with_metadata("request_id", serde_json::json!(request.id))
                .with_metadata("scopes", serde_json::json!(request.scopes)),
            )
            .await?;
        store.insert(request.id, request.clone());
        tracing::info!(request_id = %request.id, status = ?request.status, "break-glass request opened");
        Ok(request)
    }

    /// Convenience: build via [`BreakGlassRequest::create`] then
    /// [`BreakGlassManager::open`].
    pub async fn create(
        &self,
        requester_id: Uuid,
        scopes: Vec<BreakGlassScope>,
        reason: BreakGlassReason,
        justification: impl Into<String>,
        ttl_minutes: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<BreakGlassRequest, BreakGlassError> {
        let request = BreakGlassRequest::create(
            requester_id,
            scopes,
            reason,
            justification,
            ttl_minutes,
            &self.policy,
            now,
        )?;
        self.open(request).await
    }

    /// Grant a pending request. Idempotent: granting an
    /// already-granted request returns it unchanged without a second
    /// audit entry.
    pub async fn grant(
        &self,
        request_id: Uuid,
        granted_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<BreakGlassRequest, BreakGlassError> {
        let mut store = self.store.write().await;
        let current = store
            .get(&request_id)
            .ok_or(BreakGlassError::UnknownRequest(request_id))?;
        if current.status == BreakGlassStatus::Granted {
            return Ok(current.clone());
        }
        let granted = current.grant(granted_by, &self.policy, now)?;
        self.sink
            .record(
                AuditEntry::new(AuditEventType::BreakGlassGranted, "break-glass grant issued")
                    .with_user(granted_by)
                    .with_metadata("request_id", serde_json::json!(request_id)),
            )
            .await?;
        store.insert(request_id, granted.clone());
        Ok(granted)
    }

    /// Deny a pending request, recording the denial before the lock
    /// is released.
    pub async fn deny(
        &self,
        request_id: Uuid,
        denied_by: Uuid,
    ) -> Result<BreakGlassRequest, BreakGlassError> {
        let mut store = self.store.write().await;
        let current = store
            .get(&request_id)
            .ok_or(BreakGlassError::UnknownRequest(request_id))?;
        let denied = current.deny()?;
        self.sink
            .record(
                AuditEntry::new(AuditEventType::BreakGlassDenied, "break-glass request denied")
                    .with_user(denied_by)
                    .with_metadata("request_id", serde_json::json!(request_id))
                    .with_metadata("requester_id", serde_json::json!(denied.requester_id)),
            )
            .await?;
        store.insert(request_id, denied.clone());
        tracing::info!(request_id = %request_id, "break-glass request denied");
        Ok(denied)
    }

    /// Revoke an active grant before its TTL elapses, recording the
    /// revocation before the lock is released.
    pub async fn revoke(
        &self,
        request_id: Uuid,
        revoked_by: Uuid,
        reason: impl Into<String>,
    ) -> Result<BreakGlassRequest, BreakGlassError> {
        let mut store = self.store.write().await;
        let current = store
            .get(&request_id)
            .ok_or(BreakGlassError::UnknownRequest(request_id))?;
        let revoked = current.revoke()?;
        self.sink
            .record(
                AuditEntry::new(AuditEventType::BreakGlassRevoked, "break-glass grant revoked")
                    .with_user(revoked_by)
                    .with_reason(reason)
                    .with_metadata("request_id", serde_json::json!(request_id))
                    .with_metadata("requester_id", serde_json::json!(revoked.requester_id)),
            )
            .await?;
        store.insert(request_id, revoked.clone());
        tracing::info!(request_id = %request_id, "break-glass grant revoked");
        Ok(revoked)
    }

    /// Record a resource access under an active grant.
    pub async fn record_access(
        &self,
        request_id: Uuid,
        kind: AccessKind,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<BreakGlassRequest, BreakGlassError> {
        let resource_type = resource_type.into();
        let resource_id = resource_id.into();
        let mut store = self.store.write().await;
        let current = store
            .get(&request_id)
            .ok_or(BreakGlassError::UnknownRequest(request_id))?;
        let updated = current.record_access(kind, resource_type.clone(), resource_id.clone(), now)?;
        self.sink
            .record(
                AuditEntry::new(AuditEventType::BreakGlassAccess, "resource accessed under break-glass")
                    .with_user(updated.requester_id)
                    .with_metadata("request_id", serde_json::json!(request_id))
                    .with_metadata("resource_type", serde_json::json!(resource_type))
                    .with_metadata("resource_id", serde_json::json!(resource_id)),
            )
            .await?;
        store.insert(request_id, updated.clone());
        Ok(updated)
    }

    /// Fetch a request snapshot.
    pub async fn get(&self, request_id: Uuid) -> Option<BreakGlassRequest> {
        self.store.read().await.get(&request_id).cloned()
    }

    /// Transition every granted request past its TTL to `Expired`.
    ///
    /// # Returns
    ///
    /// The number of requests expired.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, BreakGlassError> {
        let mut store = self.store.write().await;
        let expiring: Vec<Uuid> = store
            .values()
            .filter(|r| r.status == BreakGlassStatus::Granted)
            .filter(|r| r.expires_at.map_or(false, |exp| now >= exp))
            .map(|r| r.id)
            .collect();
        for id in &expiring {
            if let Some(current) = store.get(id) {
                let expired = current.check_expiration(now);
                self.sink
                    .record(
                        AuditEntry::new(AuditEventType::BreakGlassExpired, "break-glass grant expired")
                            .with_user(expired.requester_id)
                            .with_metadata("request_id", serde_json::json!(id)),
                    )
                    .await?;
                store.insert(*id, expired);
            }
        }
        if !expiring.is_empty() {
            tracing::info!(count = expiring.len(), "expired break-glass grants");
        }
        Ok(expiring.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reunite_audit::MemoryAuditSink;

    fn policy() -> BreakGlassPolicy {
        BreakGlassPolicy::builtin()
    }

    #[test]
    fn test_ttl_is_clamped() {
        let p = policy();
        assert_eq!(p.clamp_ttl(Some(500)), 60);
        assert_eq!(p.clamp_ttl(Some(15)), 15);
        assert_eq!(p.clamp_ttl(None), 30);
    }

    #[test]
    fn test_auto_grant_reasons() {
        let now = Utc::now();
        let auto = BreakGlassRequest::create(
            Uuid::now_v7(),
            vec![BreakGlassScope::Contact],
            BreakGlassReason::VeterinaryEmergency,
            "vet needs owner",
            None,
            &policy(),
            now,
        )
        .unwrap();
        assert_eq!(auto.status, BreakGlassStatus::Granted);
        assert!(auto.expires_at.is_some());
        assert!(auto.review_due_at.is_some());

        let manual = BreakGlassRequest::create(
            Uuid::now_v7(),
            vec![BreakGlassScope::Pii],
            BreakGlassReason::DataCorrection,
            "fix a typo",
            None,
            &policy(),
            now,
        )
        .unwrap();
        assert_eq!(manual.status, BreakGlassStatus::Pending);
        assert!(manual.expires_at.is_none());
    }

    #[test]
    fn test_empty_scopes_rejected() {
        let err = BreakGlassRequest::create(
            Uuid::now_v7(),
            vec![],
            BreakGlassReason::Other,
            "none",
            None,
            &policy(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, BreakGlassError::EmptyScopes));
    }

    #[test]
    fn test_is_valid_scope_and_expiry() {
        let now = Utc::now();
        let request = BreakGlassRequest::create(
            Uuid::now_v7(),
            vec![BreakGlassScope::Pii],
            BreakGlassReason::ImmediateSafety,
            "urgent",
            Some(30),
            &policy(),
            now,
        )
        .unwrap();

        assert!(request.is_valid(BreakGlassScope::Pii, now));
        assert!(!request.is_valid(BreakGlassScope::Address, now));
        // Past TTL the grant behaves as never granted.
        assert!(!request.is_valid(BreakGlassScope::Pii, now + Duration::minutes(31)));
    }

    #[test]
    fn test_record_access_requires_usable_grant() {
        let now = Utc::now();
        let request = BreakGlassRequest::create(
            Uuid::now_v7(),
            vec![BreakGlassScope::Pii],
            BreakGlassReason::ImmediateSafety,
            "urgent",
            Some(10),
            &policy(),
            now,
        )
        .unwrap();

        let touched = request
            .record_access(AccessKind::Read, "user_profile", "u-1", now)
            .unwrap();
        assert_eq!(touched.accessed_resources.len(), 1);

        let late = touched.record_access(
            AccessKind::Read,
            "user_profile",
            "u-1",
            now + Duration::minutes(11),
        );
        assert!(late.is_err());
    }

    #[test]
    fn test_check_expiration_idempotent() {
        let now = Utc::now();
        let request = BreakGlassRequest::create(
            Uuid::now_v7(),
            vec![BreakGlassScope::Pii],
            BreakGlassReason::ImmediateSafety,
            "urgent",
            Some(10),
            &policy(),
            now,
        )
        .unwrap();

        let expired = request.check_expiration(now + Duration::minutes(15));
        assert_eq!(expired.status, BreakGlassStatus::Expired);
        let again = expired.check_expiration(now + Duration::minutes(20));
        assert_eq!(again.audit_version, expired.audit_version);
    }

    #[tokio::test]
    async fn test_manager_auto_grant_is_logged() {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = BreakGlassManager::new(policy(), sink.clone());
        let request = manager
            .create(
                Uuid::now_v7(),
                vec![BreakGlassScope::Contact],
                BreakGlassReason::ImmediateSafety,
                "dog loose on highway",
                None,
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(request.status, BreakGlassStatus::Granted);
        let entries = sink.all().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, AuditEventType::BreakGlassGranted);
    }

    #[tokio::test]
    async fn test_duplicate_open_yields_single_grant() {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = BreakGlassManager::new(policy(), sink.clone());
        let request = BreakGlassRequest::create(
            Uuid::now_v7(),
            vec![BreakGlassScope::Pii],
            BreakGlassReason::ImmediateSafety,
            "urgent",
            None,
            &policy(),
            Utc::now(),
        )
        .unwrap();

        let first = manager.open(request.clone()).await.unwrap();
        let second = manager.open(request).await.unwrap();
        assert_eq!(first.audit_version, second.audit_version);
        // One grant, one audit entry.
        assert_eq!(sink.len().await, 1);
    }

    #[tokio::test]
    async fn test_manager_grant_flow_and_idempotence() {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = BreakGlassManager::new(policy(), sink.clone());
        let now = Utc::now();
        let request = manager
            .create(
                Uuid::now_v7(),
                vec![BreakGlassScope::Address],
                BreakGlassReason::DataCorrection,
                "address typo",
                Some(20),
                now,
            )
            .await
            .unwrap();
        assert_eq!(request.status, BreakGlassStatus::Pending);

        let granter = Uuid::now_v7();
        let granted = manager.grant(request.id, granter, now).await.unwrap();
        assert_eq!(granted.status, BreakGlassStatus::Granted);

        // Second grant call does not issue a second grant or entry.
        let again = manager.grant(request.id, granter, now).await.unwrap();
        assert_eq!(again.audit_version, granted.audit_version);
        assert_eq!(sink.len().await, 2); // requested + granted
    }

    #[tokio::test]
    async fn test_manager_deny_records_entry() {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = BreakGlassManager::new(policy(), sink.clone());
        let now = Utc::now();
        let request = manager
            .create(
                Uuid::now_v7(),
                vec![BreakGlassScope::Pii],
                BreakGlassReason::Other,
                "curiosity",
                None,
                now,
            )
            .await
            .unwrap();
        assert_eq!(request.status, BreakGlassStatus::Pending);

        let denied = manager.deny(request.id, Uuid::now_v7()).await.unwrap();
        assert_eq!(denied.status, BreakGlassStatus::Denied);
        let entries = sink.all().await;
        assert!(entries
            .iter()
            .any(|e| e.event_type == AuditEventType::BreakGlassDenied));

        // A denied request cannot later be granted.
        let granted = manager.grant(request.id, Uuid::now_v7(), now).await;
        assert!(granted.is_err());
    }

    #[tokio::test]
    async fn test_manager_revoke_cuts_grant_short() {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = BreakGlassManager::new(policy(), sink.clone());
        let now = Utc::now();
        let request = manager
            .create(
                Uuid::now_v7(),
                vec![BreakGlassScope::Contact],
                BreakGlassReason::ImmediateSafety,
                "dog loose on highway",
                None,
                now,
            )
            .await
            .unwrap();
        assert_eq!(request.status, BreakGlassStatus::Granted);

        let revoked = manager
            .revoke(request.id, Uuid::now_v7(), "situation resolved")
            .await
            .unwrap();
        assert_eq!(revoked.status, BreakGlassStatus::Revoked);
        assert!(!revoked.is_valid(BreakGlassScope::Contact, now));
        let entries = sink.all().await;
        assert!(entries
            .iter()
            .any(|e| e.event_type == AuditEventType::BreakGlassRevoked));

        // Revoking a non-granted request is an invalid-status error.
        let again = manager.revoke(request.id, Uuid::now_v7(), "twice").await;
        assert!(matches!(again, Err(BreakGlassError::InvalidStatus { .. })));
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let sink = Arc::new(MemoryAuditSink::new());
        let manager = BreakGlassManager::new(policy(), sink.clone());
        let now = Utc::now();
        manager
            .create(
                Uuid::now_v7(),
                vec![BreakGlassScope::Pii],
                BreakGlassReason::ImmediateSafety,
                "urgent",
                Some(5),
                now,
            )
            .await
            .unwrap();

        let swept = manager.sweep_expired(now + Duration::minutes(10)).await.unwrap();
        assert_eq!(swept, 1);
        // Idempotent.
        let swept = manager.sweep_expired(now + Duration::minutes(20)).await.unwrap();
        assert_eq!(swept, 0);
    }
}
