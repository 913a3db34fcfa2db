//! Run notifications.
//!
//! Listeners are called synchronously on the thread running the validation.
//! A listener that panics is logged and skipped; it never aborts the run or
//! prevents later listeners from being called.

use crate::engine::phase::{Phase, PhaseResult};
use crate::engine::result::ValidationResult;
use crate::Platform;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Debug, Clone)]
pub enum ValidationEvent {
    Start {
        validation_id: String,
        url: String,
        platform: Platform,
    },
    Progress {
        validation_id: String,
        phase: Phase,
        result: PhaseResult,
        completed: usize,
        total: usize,
    },
    Complete {
        validation_id: String,
        result: Arc<ValidationResult>,
    },
    Error {
        validation_id: String,
        error: String,
    },
}

impl ValidationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ValidationEvent::Start { .. } => "validation:start",
            ValidationEvent::Progress { .. } => "validation:progress",
            ValidationEvent::Complete { .. } => "validation:complete",
            ValidationEvent::Error { .. } => "validation:error",
        }
    }

    pub fn validation_id(&self) -> &str {
        match self {
            ValidationEvent::Start { validation_id, .. }
            | ValidationEvent::Progress { validation_id, .. }
            | ValidationEvent::Complete { validation_id, .. }
            | ValidationEvent::Error { validation_id, .. } => validation_id,
        }
    }
}

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&ValidationEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ValidationEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
        listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .map(|l| l.len())
            .unwrap_or_else(|p| p.into_inner().len())
    }

    /// Deliver an event to every listener.
    pub fn emit(&self, event: &ValidationEvent) {
        // Snapshot so listeners may subscribe/unsubscribe without deadlocking
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
            listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| (*listener)(event))).is_err() {
                warn!(
                    event = event.name(),
                    validation_id = event.validation_id(),
                    "event listener panicked"
                );
            }
        }
    }
}
