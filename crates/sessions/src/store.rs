use std::{path::PathBuf, sync::Arc, time::Instant};

use {
    dashmap::{DashMap, mapref::entry::Entry},
    reelsmith_common::{Identity, ReplyTarget},
    tracing::{debug, info},
};

#[cfg(feature = "metrics")]
use reelsmith_metrics::{counter, gauge, sessions as session_metrics};

use crate::{
    phase::{Parameters, Phase},
    transition::{Effect, Event, transition},
};

/// Live conversation state for one identity.
#[derive(Debug, Clone)]
pub struct Session {
    pub phase: Phase,
    pub params: Parameters,
    /// Fetched source artifact, set once acquisition completes.
    pub source: Option<PathBuf>,
    /// The event that opened the session.
    pub reply_to: ReplyTarget,
    pub opened_at: Instant,
}

/// Result of feeding one event to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub effect: Effect,
    pub phase: Phase,
    /// Source artifact of the session. When `phase` is [`Phase::Idle`] the
    /// session is gone and the caller owns the file.
    pub source: Option<PathBuf>,
    pub reply_to: Option<ReplyTarget>,
}

impl Applied {
    fn idle(effect: Effect) -> Self {
        Self {
            effect,
            phase: Phase::Idle,
            source: None,
            reply_to: None,
        }
    }
}

/// In-memory session table keyed by identity. At most one session per key.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<Identity, Session>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session in [`Phase::Acquiring`]. Returns `false` when the
    /// identity already has one.
    pub fn claim(&self, identity: Identity, reply_to: ReplyTarget) -> bool {
        let claimed = match self.sessions.entry(identity) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Session {
                    phase: Phase::Acquiring,
                    params: Parameters::default(),
                    source: None,
                    reply_to,
                    opened_at: Instant::now(),
                });
                true
            },
        };
        if claimed {
            info!(%identity, "session opened");
            #[cfg(feature = "metrics")]
            counter!(session_metrics::STARTED_TOTAL).increment(1);
        } else {
            debug!(%identity, "session already open");
            #[cfg(feature = "metrics")]
            counter!(session_metrics::BUSY_TOTAL).increment(1);
        }
        self.record_active();
        claimed
    }

    /// Attach the fetched source and move to the operation prompt.
    ///
    /// Returns `None` when the session was cancelled during the fetch; the
    /// caller then owns `path` and must release it.
    pub fn source_ready(&self, identity: Identity, path: PathBuf) -> Option<Applied> {
        let mut session = self.sessions.get_mut(&identity)?;
        if session.phase != Phase::Acquiring {
            return None;
        }
        session.source = Some(path);
        let next = transition(session.phase, Event::SourceReady, &session.params);
        session.phase = next.phase;
        session.params = next.params;
        debug!(%identity, phase = %session.phase, "source attached");
        Some(Applied {
            effect: next.effect,
            phase: session.phase,
            source: session.source.clone(),
            reply_to: Some(session.reply_to.clone()),
        })
    }

    /// Drop the session without a transition, e.g. when acquisition failed.
    pub fn abandon(&self, identity: Identity) -> Option<Session> {
        let removed = self.sessions.remove(&identity).map(|(_, session)| session);
        if removed.is_some() {
            info!(%identity, "session abandoned");
        }
        self.record_active();
        removed
    }

    /// Feed `event` to the identity's session.
    ///
    /// Transitions to [`Phase::Idle`] remove the session in the same step, so
    /// no other event can observe it half-closed.
    pub fn apply(&self, identity: Identity, event: Event) -> Applied {
        let applied = match self.sessions.entry(identity) {
            Entry::Vacant(_) => {
                let next = transition(Phase::Idle, event, &Parameters::default());
                Applied::idle(next.effect)
            },
            Entry::Occupied(mut occupied) => {
                let session = occupied.get_mut();
                let from = session.phase;
                let next = transition(from, event, &session.params);
                debug!(%identity, from = %from, to = %next.phase, "session transition");
                if next.phase == Phase::Idle {
                    let session = occupied.remove();
                    info!(
                        %identity,
                        elapsed_ms = session.opened_at.elapsed().as_millis() as u64,
                        "session closed"
                    );
                    Applied {
                        effect: next.effect,
                        phase: Phase::Idle,
                        source: session.source,
                        reply_to: Some(session.reply_to),
                    }
                } else {
                    session.phase = next.phase;
                    session.params = next.params;
                    Applied {
                        effect: next.effect,
                        phase: session.phase,
                        source: session.source.clone(),
                        reply_to: Some(session.reply_to.clone()),
                    }
                }
            },
        };

        record_effect(&applied.effect);
        self.record_active();
        applied
    }

    /// Close an executing session once its job has finished, successfully or not.
    pub fn finish(&self, identity: Identity) -> Option<Session> {
        let removed = self
            .sessions
            .remove_if(&identity, |_, session| session.phase == Phase::Executing)
            .map(|(_, session)| session);
        if let Some(session) = &removed {
            info!(
                %identity,
                elapsed_ms = session.opened_at.elapsed().as_millis() as u64,
                "session finished"
            );
        }
        self.record_active();
        removed
    }

    #[must_use]
    pub fn phase(&self, identity: Identity) -> Phase {
        self.sessions
            .get(&identity)
            .map_or(Phase::Idle, |session| session.phase)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(feature = "metrics")]
    fn record_active(&self) {
        gauge!(session_metrics::ACTIVE).set(self.sessions.len() as f64);
    }

    #[cfg(not(feature = "metrics"))]
    fn record_active(&self) {}
}

#[cfg(feature = "metrics")]
fn record_effect(effect: &Effect) {
    match effect {
        Effect::Cancelled => counter!(session_metrics::CANCELLED_TOTAL).increment(1),
        Effect::Busy => counter!(session_metrics::BUSY_TOTAL).increment(1),
        _ => {},
    }
}

#[cfg(not(feature = "metrics"))]
fn record_effect(_: &Effect) {}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{phase::OperationKind, transition::Prompt},
        reelsmith_media::{Operation, Quality},
    };

    fn target() -> ReplyTarget {
        ReplyTarget::new(100, Some(1))
    }

    #[test]
    fn one_session_per_identity() {
        let store = SessionStore::new();
        assert!(store.claim(Identity(1), target()));
        assert!(!store.claim(Identity(1), target()));
        assert!(store.claim(Identity(2), target()));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn source_ready_prompts_for_operation() {
        let store = SessionStore::new();
        store.claim(Identity(1), target());
        let applied = store
            .source_ready(Identity(1), PathBuf::from("/tmp/a.mp4"))
            .unwrap();
        assert_eq!(applied.effect, Effect::Prompt(Prompt::Operation));
        assert_eq!(applied.source, Some(PathBuf::from("/tmp/a.mp4")));
        assert_eq!(store.phase(Identity(1)), Phase::AwaitingOperation);
    }

    #[test]
    fn cancelled_during_acquisition_hands_file_back() {
        let store = SessionStore::new();
        store.claim(Identity(1), target());
        let applied = store.apply(Identity(1), Event::Cancel);
        assert_eq!(applied.effect, Effect::Cancelled);
        assert!(store.is_empty());
        assert!(
            store
                .source_ready(Identity(1), PathBuf::from("/tmp/late.mp4"))
                .is_none()
        );
    }

    #[test]
    fn cancel_returns_source_for_release() {
        let store = SessionStore::new();
        store.claim(Identity(3), target());
        store.source_ready(Identity(3), PathBuf::from("/tmp/src.mp4"));
        let applied = store.apply(Identity(3), Event::Cancel);
        assert_eq!(applied.phase, Phase::Idle);
        assert_eq!(applied.source, Some(PathBuf::from("/tmp/src.mp4")));
        assert_eq!(applied.reply_to, Some(target()));
        assert_eq!(store.phase(Identity(3)), Phase::Idle);
    }

    #[test]
    fn no_session_means_nothing_to_cancel() {
        let store = SessionStore::new();
        assert_eq!(
            store.apply(Identity(5), Event::Cancel).effect,
            Effect::NothingToCancel
        );
        assert_eq!(
            store.apply(Identity(5), Event::Back).effect,
            Effect::Ignored
        );
    }

    #[test]
    fn executing_session_closes_only_through_finish() {
        let store = SessionStore::new();
        store.claim(Identity(4), target());
        store.source_ready(Identity(4), PathBuf::from("/tmp/s.mp4"));
        store.apply(
            Identity(4),
            Event::SelectOperation(OperationKind::Compress),
        );
        let applied = store.apply(Identity(4), Event::SelectQuality(Quality::Medium));
        assert_eq!(
            applied.effect,
            Effect::Execute(Operation::Compress {
                quality: Quality::Medium
            })
        );
        assert_eq!(applied.source, Some(PathBuf::from("/tmp/s.mp4")));

        assert_eq!(store.apply(Identity(4), Event::Cancel).effect, Effect::Busy);
        assert!(!store.claim(Identity(4), target()));

        let session = store.finish(Identity(4)).unwrap();
        assert_eq!(session.source, Some(PathBuf::from("/tmp/s.mp4")));
        assert!(store.is_empty());
    }

    #[test]
    fn finish_ignores_sessions_not_executing() {
        let store = SessionStore::new();
        store.claim(Identity(6), target());
        assert!(store.finish(Identity(6)).is_none());
        assert_eq!(store.phase(Identity(6)), Phase::Acquiring);
    }
}
