//! Typed event keys

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use crate::signature::{Args, Signature};

/// An event name bound to its argument tuple `A`
///
/// Usable anywhere an event name is accepted. Emitting through the key
/// (`EventEmitter::emit_event`) allows [`Nil`](crate::Nil) at any position.
///
/// ```
/// use eventemitter::{EmitterError, Event, EventEmitter, Nil};
///
/// const READY: Event<(Option<String>, u32)> = Event::new("ready");
///
/// # fn main() -> Result<(), EmitterError> {
/// let emitter = EventEmitter::new();
/// emitter.on(&READY, |err: Option<String>, attempts: u32| {
///     assert!(err.is_none());
///     assert_eq!(attempts, 3);
/// })?;
/// emitter.emit_event(&READY, (Nil, 3_u32))?;
/// # Ok(())
/// # }
/// ```
pub struct Event<A> {
    name: Cow<'static, str>,
    _args: PhantomData<fn(A)>,
}

impl<A: Args> Event<A> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _args: PhantomData,
        }
    }

    /// Key with a name built at runtime
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _args: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signature every listener of this event must have
    pub fn signature(&self) -> Signature {
        Signature::of::<A>()
    }
}

impl<A> AsRef<str> for Event<A> {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl<A> Clone for Event<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _args: PhantomData,
        }
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Event").field(&self.name).finish()
    }
}
