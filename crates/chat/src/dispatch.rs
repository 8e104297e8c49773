//! Per-identity ordering of inbound events.
//!
//! Every identity with pending input gets its own queue and worker task, so
//! one user's events reach the [`ConversationService`] strictly in arrival
//! order while different users proceed in parallel. A worker exits after
//! sitting idle; the next event for that identity starts a fresh one.

use std::{sync::Arc, time::Duration};

use {
    dashmap::{DashMap, mapref::entry::Entry},
    reelsmith_common::Identity,
    tokio::sync::mpsc,
    tracing::{debug, error},
};

use crate::{event::InboundEvent, service::ConversationService};

const DEFAULT_IDLE: Duration = Duration::from_secs(60);

type Queue = mpsc::UnboundedSender<InboundEvent>;

#[derive(Clone)]
pub struct EventDispatcher {
    service: Arc<ConversationService>,
    queues: Arc<DashMap<Identity, Queue>>,
    idle: Duration,
}

impl EventDispatcher {
    #[must_use]
    pub fn new(service: Arc<ConversationService>) -> Self {
        Self::with_idle(service, DEFAULT_IDLE)
    }

    /// Dispatcher whose workers exit after `idle` without events.
    #[must_use]
    pub fn with_idle(service: Arc<ConversationService>, idle: Duration) -> Self {
        Self {
            service,
            queues: Arc::new(DashMap::new()),
            idle,
        }
    }

    /// Number of identities with a live worker.
    #[must_use]
    pub fn active_queues(&self) -> usize {
        self.queues.len()
    }

    /// Queue `event` behind earlier events from the same identity.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, event: InboundEvent) {
        let identity = event.identity;
        // Sends happen under the entry lock, which a retiring worker also
        // takes before removing its queue, so no event lands in a dead queue.
        match self.queues.entry(identity) {
            Entry::Occupied(mut slot) => {
                if let Err(mpsc::error::SendError(event)) = slot.get().send(event) {
                    debug!(%identity, "event worker gone, starting a new one");
                    slot.insert(self.start_worker(identity, event));
                }
            },
            Entry::Vacant(slot) => {
                slot.insert(self.start_worker(identity, event));
            },
        }
    }

    fn start_worker(&self, identity: Identity, first: InboundEvent) -> Queue {
        let (tx, mut rx) = mpsc::unbounded_channel();
        if tx.send(first).is_err() {
            error!(%identity, "event queue closed before its worker started");
        }

        let service = Arc::clone(&self.service);
        let queues = Arc::clone(&self.queues);
        let idle = self.idle;
        tokio::spawn(async move {
            loop {
                match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(Some(event)) => {
                        if let Err(e) = service.handle(event).await {
                            error!(%identity, error = %e, "error handling event");
                        }
                    },
                    Ok(None) => break,
                    Err(_) => {
                        if queues.remove_if(&identity, |_, _| rx.is_empty()).is_some() {
                            break;
                        }
                    },
                }
            }
            debug!(%identity, "event worker stopped");
        });
        tx
    }
}
