//! Derived user role sets
//!
//! A `UserRoleSet` is a snapshot computed from a user's current
//! assignments. It is never the source of truth: callers recompute it
//! from assignments on every decision. A cached, stale permission set
//! is a correctness bug, not an optimization.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::assignment::{AssignmentStatus, UserRoleAssignment};
use crate::capability::Capability;
use crate::catalog::{CatalogError, RoleCatalog, RoleId};

/// Days before expiry at which an assignment counts as pending renewal.
const RENEWAL_WINDOW_DAYS: i64 = 30;

/// Scope limiters of one contributing assignment.
///
/// Carried on the role set so the decision engine can run its region
/// scope check without re-reading assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentScope {
    /// Role of the contributing assignment
    pub role_id: RoleId,
    /// Regions the assignment is limited to (empty = unrestricted)
    pub region_ids: Vec<String>,
    /// Partner organizations the assignment is limited to
    pub partner_org_ids: Vec<Uuid>,
}

/// An assignment pending renewal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRenewal {
    /// Role expiring soon
    pub role_id: RoleId,
    /// When it expires
    pub expires_at: DateTime<Utc>,
}

/// Derived per-user permission snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleSet {
    /// User this snapshot describes
    pub user_id: Option<Uuid>,

    /// Union of capabilities from all effective assignments
    pub effective_permissions: HashSet<Capability>,

    /// Highest effective role by catalog level
    pub highest_role: Option<RoleId>,

    /// The user's primary role, when one effective assignment is
    /// marked primary
    pub primary_role: Option<RoleId>,

    /// Whether any assignment is currently effective
    pub has_active_roles: bool,

    /// Whether any assignment is suspended
    pub has_suspended_roles: bool,

    /// Whether any assignment is expired
    pub has_expired_roles: bool,

    /// Effective assignments expiring within 30 days
    pub pending_renewal: Vec<PendingRenewal>,

    /// Scope limiters of each effective assignment
    pub scopes: Vec<AssignmentScope>,
}

impl UserRoleSet {
    /// Compute the snapshot from current assignments.
    ///
    /// Only assignments that are `Active` *and* unexpired at `now`
    /// contribute to `effective_permissions`. Suspended, revoked, and
    /// expired assignments contribute nothing.
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownRole`] if an assignment references a role
    /// the catalog does not define (configuration error).
    pub fn compute(
        catalog: &RoleCatalog,
        assignments: &[UserRoleAssignment],
        now: DateTime<Utc>,
    ) -> Result<Self, CatalogError> {
        let mut set = Self {
            user_id: assignments.first().map(|a| a.user_id),
            effective_permissions: HashSet::new(),
            highest_role: None,
            primary_role: None,
            has_active_roles: false,
            has_suspended_roles: false,
            has_expired_roles: false,
            pending_renewal: Vec::new(),
            scopes: Vec::new(),
        };

        let mut highest_level = 0u32;
        for assignment in assignments {
            match assignment.status {
                AssignmentStatus::Suspended => set.has_suspended_roles = true,
                AssignmentStatus::Expired => set.has_expired_roles = true,
                _ => {}
            }
            if !assignment.is_effective(now) {
                continue;
            }

            let role = catalog.get(assignment.role_id)?;
            set.has_active_roles = true;
            set.effective_permissions.extend(role.permissions.iter().copied());

            if role.level > highest_level {
                highest_level = role.level;
                set.highest_role = Some(role.id);
            }
            if assignment.is_primary {
                set.primary_role = Some(role.id);
            }
            if let Some(expires_at) = assignment.expires_at {
                if expires_at - now <= Duration::days(RENEWAL_WINDOW_DAYS) {
                    set.pending_renewal.push(PendingRenewal {
                        role_id: role.id,
                        expires_at,
                    });
                }
            }
            set.scopes.push(AssignmentScope {
                role_id: role.id,
                region_ids: assignment.region_ids.clone(),
                partner_org_ids: assignment.partner_org_ids.clone(),
            });
        }

        Ok(set)
    }

    /// Whether the set grants a capability.
    pub fn has(&self, capability: Capability) -> bool {
        self.effective_permissions.contains(&capability)
    }

    /// Whether the set grants every capability in `capabilities`.
    pub fn has_all(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().all(|c| self.has(*c))
    }

    /// Whether the set grants at least one capability in `capabilities`.
    pub fn has_any(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().any(|c| self.has(*c))
    }
}
