//! Diagnostics channel
//!
//! Advisory conditions (listener-count threshold crossed, listener panicked)
//! are logged through `tracing` and also published on a broadcast channel so
//! the host application can observe or redirect them. Publishing never
//! blocks registration or emission; with no subscribers the entry is dropped.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::listener::ListenerId;

/// An advisory condition raised by the emitter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Diagnostic {
    /// A registration brought an event's listener count to the threshold or above
    MaxListenersExceeded {
        event: String,
        count: usize,
        max_listeners: i64,
    },
    /// A listener panicked while handling an emission
    ListenerPanicked {
        event: String,
        listener: ListenerId,
        message: String,
    },
}

impl Diagnostic {
    /// Event name the diagnostic concerns
    pub fn event(&self) -> &str {
        match self {
            Diagnostic::MaxListenersExceeded { event, .. } => event,
            Diagnostic::ListenerPanicked { event, .. } => event,
        }
    }

    /// Get the diagnostic type as a string (for logging/filtering)
    pub fn diagnostic_type(&self) -> &'static str {
        match self {
            Diagnostic::MaxListenersExceeded { .. } => "MaxListenersExceeded",
            Diagnostic::ListenerPanicked { .. } => "ListenerPanicked",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MaxListenersExceeded {
                event, max_listeners, ..
            } => write!(
                f,
                "event \"{event}\" has exceeded the maximum number of listeners of {max_listeners}"
            ),
            Diagnostic::ListenerPanicked {
                event,
                listener,
                message,
            } => write!(f, "listener {listener} of event \"{event}\" panicked: {message}"),
        }
    }
}

/// A diagnostic stamped with the time it was raised
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    pub diagnostic: Diagnostic,
}

impl DiagnosticEntry {
    /// Create a new entry with current timestamp
    pub fn new(diagnostic: Diagnostic) -> Self {
        Self {
            timestamp: Utc::now(),
            diagnostic,
        }
    }
}

/// Sending half of the diagnostics channel
pub(crate) struct Diagnostics {
    tx: broadcast::Sender<DiagnosticEntry>,
}

impl Diagnostics {
    pub(crate) fn new(capacity: usize) -> Self {
        // broadcast::channel panics on zero capacity
        let capacity = capacity.max(1);
        debug!(capacity, "Diagnostics::new: creating channel");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub(crate) fn publish(&self, diagnostic: Diagnostic) {
        debug!(
            diagnostic_type = diagnostic.diagnostic_type(),
            event = diagnostic.event(),
            "Diagnostics::publish"
        );
        // Ignore send errors (no subscribers is OK)
        let _ = self.tx.send(DiagnosticEntry::new(diagnostic));
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<DiagnosticEntry> {
        self.tx.subscribe()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
