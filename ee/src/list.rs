//! Per-event listener list
//!
//! Holds the ordered entries registered under one event name and the
//! signature locked by the first of them. Entries are stored type-erased;
//! the locked signature guarantees every entry downcasts to the same
//! `Handler<A>`.

use std::any::Any;

use tracing::debug;

use crate::error::EmitterError;
use crate::listener::{Handler, ListenerId};
use crate::signature::{Args, Signature};

struct Entry {
    id: ListenerId,
    handler: Box<dyn Any + Send + Sync>,
}

impl Entry {
    fn new<A: Args>(handler: Handler<A>) -> Self {
        Self {
            id: handler.id(),
            handler: Box::new(handler),
        }
    }
}

/// Ordered listeners of a single event
pub struct ListenerList {
    event: String,
    signature: Option<Signature>,
    entries: Vec<Entry>,
}

impl ListenerList {
    /// Create an empty, unlocked list for `event`
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            signature: None,
            entries: Vec::new(),
        }
    }

    /// Locked signature, `None` until the first listener is added
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Append a listener, returning the new count
    pub fn add<A: Args>(&mut self, handler: Handler<A>) -> Result<usize, EmitterError> {
        self.lock_signature::<A>()?;
        debug!(event = %self.event, listener = handler.id(), "ListenerList::add");
        self.entries.push(Entry::new(handler));
        Ok(self.entries.len())
    }

    /// Append a self-detaching wrapper around `handler`, returning the new count
    ///
    /// `detach` receives the wrapper's id once it has fired.
    pub fn once<A: Args>(
        &mut self,
        handler: Handler<A>,
        detach: impl Fn(ListenerId) + Send + Sync + 'static,
    ) -> Result<usize, EmitterError> {
        self.lock_signature::<A>()?;
        let wrapper = handler.once(detach);
        debug!(event = %self.event, listener = wrapper.id(), "ListenerList::once");
        self.entries.push(Entry::new(wrapper));
        Ok(self.entries.len())
    }

    /// Remove every entry with identity `id`, returning how many were removed
    pub fn remove(&mut self, id: ListenerId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        let removed = before - self.entries.len();
        debug!(event = %self.event, listener = id, removed, "ListenerList::remove");
        removed
    }

    /// Drop all entries; the signature stays locked
    pub fn clear(&mut self) {
        debug!(event = %self.event, "ListenerList::clear");
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone out the handlers for a dispatch of `A`
    ///
    /// Fails if `A` is not the locked signature. An unlocked list yields
    /// nothing.
    pub fn snapshot<A: Args>(&self) -> Result<Vec<Handler<A>>, EmitterError> {
        let Some(locked) = &self.signature else {
            return Ok(Vec::new());
        };
        locked.check(&self.event, &Signature::of::<A>())?;
        Ok(self
            .entries
            .iter()
            .filter_map(|entry| entry.handler.downcast_ref::<Handler<A>>())
            .cloned()
            .collect())
    }

    fn lock_signature<A: Args>(&mut self) -> Result<(), EmitterError> {
        let incoming = Signature::of::<A>();
        if let Some(locked) = &self.signature {
            return locked.check(&self.event, &incoming);
        }
        debug!(event = %self.event, signature = %incoming, "ListenerList: locking signature");
        self.signature = Some(incoming);
        Ok(())
    }
}
