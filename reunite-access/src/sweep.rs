//! Background expiry sweeper
//!
//! Lazy read-time expiry is authoritative; this sweeper only settles
//! stored records so listings and audits reflect expiry promptly. It
//! is disabled by default and opt-in per deployment.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::break_glass::BreakGlassManager;
use crate::two_person::TwoPersonManager;

/// Configuration for the background sweep.
#[derive(Debug, Clone)]
pub struct SweepPolicy {
    /// Whether the sweeper runs at all
    pub enabled: bool,
    /// Interval between sweep passes
    pub interval: Duration,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(60),
        }
    }
}

/// Settles expired break-glass grants and timed-out approval requests.
pub struct ExpirySweeper {
    policy: SweepPolicy,
    break_glass: Arc<BreakGlassManager>,
    two_person: Arc<TwoPersonManager>,
}

impl ExpirySweeper {
    /// Create a sweeper over the two managers.
    pub fn new(
        policy: SweepPolicy,
        break_glass: Arc<BreakGlassManager>,
        two_person: Arc<TwoPersonManager>,
    ) -> Self {
        Self {
            policy,
            break_glass,
            two_person,
        }
    }

    /// Run one sweep pass, returning the number of records settled.
    pub async fn sweep_once(&self) -> usize {
        let now = Utc::now();
        let mut settled = 0;

        match self.break_glass.sweep_expired(now).await {
            Ok(count) => settled += count,
            Err(error) => warn!(%error, "break-glass sweep failed"),
        }
        match self.two_person.sweep_expired(now).await {
            Ok(count) => settled += count,
            Err(error) => warn!(%error, "two-person sweep failed"),
        }

        if settled > 0 {
            debug!(settled, "expiry sweep settled records");
        }
        settled
    }

    /// Spawn the periodic sweep loop. Returns `None` when the policy
    /// disables sweeping.
    pub fn spawn(self) -> Option<tokio::task::JoinHandle<()>> {
        if !self.policy.enabled {
            debug!("expiry sweeper disabled");
            return None;
        }
        let interval = self.policy.interval;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately; skip it so a fresh start
            // does not double-sweep with lazy expiry.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.sweep_once().await;
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::break_glass::{BreakGlassPolicy, BreakGlassReason, BreakGlassScope};
    use crate::two_person::TwoPersonRule;
    use chrono::Duration as ChronoDuration;
    use reunite_audit::MemoryAuditSink;
    use uuid::Uuid;

    fn managers() -> (Arc<BreakGlassManager>, Arc<TwoPersonManager>) {
        let sink = Arc::new(MemoryAuditSink::new());
        (
            Arc::new(BreakGlassManager::new(
                BreakGlassPolicy::builtin(),
                sink.clone(),
            )),
            Arc::new(TwoPersonManager::new(TwoPersonRule::builtin(), sink)),
        )
    }

    #[tokio::test]
    async fn test_sweep_once_settles_expired_grants() {
        let (break_glass, two_person) = managers();
        let now = Utc::now();

        let request = break_glass
            .create(
                Uuid::now_v7(),
                vec![BreakGlassScope::Pii],
                BreakGlassReason::ImmediateSafety,
                "dog loose near highway",
                None,
                now,
            )
            .await
            .unwrap();
        assert!(request.expires_at.is_some());

        let sweeper = ExpirySweeper::new(SweepPolicy::default(), break_glass.clone(), two_person);

        // Nothing expired yet.
        assert_eq!(sweeper.sweep_once().await, 0);

        // Advance past the grant TTL by sweeping at a future instant.
        let later = now + ChronoDuration::minutes(31);
        assert_eq!(break_glass.sweep_expired(later).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_disabled_policy_does_not_spawn() {
        let (break_glass, two_person) = managers();
        let sweeper = ExpirySweeper::new(SweepPolicy::default(), break_glass, two_person);
        assert!(sweeper.spawn().is_none());
    }
}
