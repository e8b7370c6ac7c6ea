//! Notifications for external subscribers.

use runoff_types::{CandidateId, ElectionId, Identity};
use serde::Serialize;

/// Committed ledger changes, in the order they were applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ElectionEvent {
    ElectionCreated {
        election: ElectionId,
        title: String,
        is_runoff: bool,
    },
    CandidateAdded {
        election: ElectionId,
        candidate: CandidateId,
        name: String,
    },
    VoterRegistered {
        identity: Identity,
    },
    VoteCast {
        election: ElectionId,
        candidate: CandidateId,
        voter: Identity,
    },
    ElectionFinalized {
        election: ElectionId,
        requires_runoff: bool,
    },
    RunoffRequired {
        parent: ElectionId,
        child: ElectionId,
    },
}

/// Synchronous fan-out to subscribed listeners.
///
/// Listeners run inline on the thread that committed the change.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&ElectionEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ElectionEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &ElectionEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn emit_all(&self, events: &[ElectionEvent]) {
        for event in events {
            self.emit(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
