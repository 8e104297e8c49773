use std::{
    collections::{HashSet, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use {
    dashmap::DashMap,
    reelsmith_common::Identity,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use reelsmith_metrics::{counter, labels, quota as quota_metrics};

const CLEANUP_EVERY_REQUESTS: u64 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    /// Requests still available in the current window after this one.
    pub remaining: u32,
}

/// Sliding-window admission control per identity.
///
/// Each identity owns a queue of admitted request instants. Records for
/// different identities never interact.
#[derive(Clone)]
pub struct QuotaGuard {
    policy: QuotaPolicy,
    privileged: Arc<HashSet<Identity>>,
    records: Arc<DashMap<Identity, VecDeque<Instant>>>,
    requests_seen: Arc<AtomicU64>,
}

impl QuotaGuard {
    pub fn new(policy: QuotaPolicy, privileged: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            policy,
            privileged: Arc::new(privileged.into_iter().collect()),
            records: Arc::new(DashMap::new()),
            requests_seen: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn policy(&self) -> QuotaPolicy {
        self.policy
    }

    #[must_use]
    pub fn is_privileged(&self, identity: Identity) -> bool {
        self.privileged.contains(&identity)
    }

    pub fn admit(&self, identity: Identity) -> Admission {
        self.admit_at(identity, Instant::now())
    }

    pub fn admit_at(&self, identity: Identity, now: Instant) -> Admission {
        if self.is_privileged(identity) {
            return self.record_decision(Admission {
                allowed: true,
                remaining: self.policy.max_requests,
            });
        }

        let admission = {
            let mut record = self.records.entry(identity).or_default();
            prune(&mut record, now, self.policy.window);
            let used = u32::try_from(record.len()).unwrap_or(u32::MAX);
            if used < self.policy.max_requests {
                record.push_back(now);
                Admission {
                    allowed: true,
                    remaining: self.policy.max_requests - used - 1,
                }
            } else {
                Admission {
                    allowed: false,
                    remaining: 0,
                }
            }
        };

        if admission.allowed {
            debug!(%identity, remaining = admission.remaining, "request admitted");
        } else {
            warn!(%identity, "quota exceeded");
        }
        self.cleanup_if_needed(now);
        self.record_decision(admission)
    }

    /// Requests admitted for `identity` inside the window ending at `now`.
    #[must_use]
    pub fn in_window(&self, identity: Identity, now: Instant) -> usize {
        self.records
            .get_mut(&identity)
            .map(|mut record| {
                prune(&mut record, now, self.policy.window);
                record.len()
            })
            .unwrap_or(0)
    }

    fn cleanup_if_needed(&self, now: Instant) {
        let seen = self.requests_seen.fetch_add(1, Ordering::Relaxed) + 1;
        if !seen.is_multiple_of(CLEANUP_EVERY_REQUESTS) {
            return;
        }
        let window = self.policy.window;
        self.records.retain(|_, record| {
            prune(record, now, window);
            !record.is_empty()
        });
    }

    #[cfg(feature = "metrics")]
    fn record_decision(&self, admission: Admission) -> Admission {
        let outcome = if admission.allowed {
            "allowed"
        } else {
            "denied"
        };
        counter!(quota_metrics::DECISIONS_TOTAL, labels::OUTCOME => outcome).increment(1);
        if !admission.allowed {
            counter!(quota_metrics::REJECTED_TOTAL).increment(1);
        }
        admission
    }

    #[cfg(not(feature = "metrics"))]
    fn record_decision(&self, admission: Admission) -> Admission {
        admission
    }
}

/// Keep only instants strictly inside `(now - window, now]`.
fn prune(record: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = record.front() {
        if now.saturating_duration_since(oldest) >= window {
            record.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(privileged: &[i64]) -> QuotaGuard {
        QuotaGuard::new(
            QuotaPolicy::default(),
            privileged.iter().copied().map(Identity),
        )
    }

    #[test]
    fn sixth_request_denied_seventh_after_window_allowed() {
        let quota = guard(&[]);
        let id = Identity(7);
        let t0 = Instant::now();

        for i in 0..5u32 {
            let admission = quota.admit_at(id, t0 + Duration::from_secs(u64::from(i)));
            assert!(admission.allowed);
            assert_eq!(admission.remaining, 4 - i);
        }

        let sixth = quota.admit_at(id, t0 + Duration::from_secs(10));
        assert_eq!(sixth, Admission {
            allowed: false,
            remaining: 0
        });

        let seventh = quota.admit_at(id, t0 + Duration::from_secs(65));
        assert!(seventh.allowed);
    }

    #[test]
    fn window_slides_per_request() {
        let quota = guard(&[]);
        let id = Identity(1);
        let t0 = Instant::now();
        for i in 0..5 {
            quota.admit_at(id, t0 + Duration::from_secs(i * 10));
        }
        // The first request (t0) falls out at exactly t0 + 60.
        assert!(!quota.admit_at(id, t0 + Duration::from_secs(59)).allowed);
        assert!(quota.admit_at(id, t0 + Duration::from_secs(60)).allowed);
        assert!(!quota.admit_at(id, t0 + Duration::from_secs(61)).allowed);
    }

    #[test]
    fn denials_are_not_recorded() {
        let quota = guard(&[]);
        let id = Identity(2);
        let t0 = Instant::now();
        for _ in 0..20 {
            quota.admit_at(id, t0);
        }
        assert_eq!(quota.in_window(id, t0), 5);
    }

    #[test]
    fn privileged_identity_is_always_allowed() {
        let quota = guard(&[42]);
        let t0 = Instant::now();
        for _ in 0..50 {
            let admission = quota.admit_at(Identity(42), t0);
            assert!(admission.allowed);
            assert_eq!(admission.remaining, 5);
        }
        assert_eq!(quota.in_window(Identity(42), t0), 0);
    }

    #[test]
    fn identities_are_independent() {
        let quota = guard(&[]);
        let t0 = Instant::now();
        for _ in 0..5 {
            quota.admit_at(Identity(1), t0);
        }
        assert!(!quota.admit_at(Identity(1), t0).allowed);
        assert!(quota.admit_at(Identity(2), t0).allowed);
    }

    #[test]
    fn never_exceeds_ceiling_in_any_window() {
        let quota = guard(&[]);
        let id = Identity(9);
        let t0 = Instant::now();
        let mut admitted = Vec::new();
        // One attempt every 7 seconds for ten minutes.
        for step in 0..86u64 {
            let now = t0 + Duration::from_secs(step * 7);
            if quota.admit_at(id, now).allowed {
                admitted.push(now);
            }
        }
        for (i, start) in admitted.iter().enumerate() {
            let in_window = admitted[i..]
                .iter()
                .take_while(|t| t.duration_since(*start) < Duration::from_secs(60))
                .count();
            assert!(in_window <= 5);
        }
    }
}
