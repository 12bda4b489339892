//! Listeners and handler handles
//!
//! Any `Fn` closure (or fn item) taking up to eight owned arguments is a
//! [`Listener`]. Registering one wraps it in a [`Handler`], which carries a
//! [`ListenerId`]. The id is the listener's identity: keep a clone of the
//! handler to remove it later with `off`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::debug;

use crate::signature::Args;

/// Unique identity of a registered handler
pub type ListenerId = u64;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

fn next_listener_id() -> ListenerId {
    NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed)
}

/// A callable taking the positional arguments `A`
pub trait Listener<A>: Send + Sync + 'static {
    fn call(&self, args: A);
}

macro_rules! impl_listener {
    ($($param:ident),*) => {
        impl<Func, $($param),*> Listener<($($param,)*)> for Func
        where
            Func: Fn($($param),*) + Send + Sync + 'static,
            $($param: Clone + Send + Sync + 'static),*
        {
            #[allow(non_snake_case)]
            fn call(&self, ($($param,)*): ($($param,)*)) {
                (self)($($param),*)
            }
        }
    };
}

impl_listener!();
impl_listener!(A1);
impl_listener!(A1, A2);
impl_listener!(A1, A2, A3);
impl_listener!(A1, A2, A3, A4);
impl_listener!(A1, A2, A3, A4, A5);
impl_listener!(A1, A2, A3, A4, A5, A6);
impl_listener!(A1, A2, A3, A4, A5, A6, A7);
impl_listener!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Cheap-to-clone handle for a registered listener
///
/// Clones share the same [`ListenerId`], so a clone passed to `off` removes
/// the registration made with the original.
pub struct Handler<A> {
    id: ListenerId,
    listener: Arc<dyn Listener<A>>,
}

impl<A: Args> Handler<A> {
    /// Wrap a listener in a new handler with a fresh id
    pub fn new(listener: impl Listener<A>) -> Self {
        Self {
            id: next_listener_id(),
            listener: Arc::new(listener),
        }
    }

    /// Identity used for removal
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Invoke the listener on the current thread
    pub fn call(&self, args: A) {
        self.listener.call(args);
    }

    /// Wrap this handler so it fires at most once
    ///
    /// The wrapper gets its own id. After the wrapped listener returns (or
    /// panics), `detach` is called with the wrapper's id.
    pub(crate) fn once(self, detach: impl Fn(ListenerId) + Send + Sync + 'static) -> Self {
        let id = next_listener_id();
        debug!(wrapped = self.id, once = id, "Handler::once: wrapping listener");
        Self {
            id,
            listener: Arc::new(Once {
                id,
                inner: self,
                fired: AtomicBool::new(false),
                detach: Box::new(detach),
            }),
        }
    }
}

impl<A> Clone for Handler<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Arc::clone(&self.listener),
        }
    }
}

impl<A> fmt::Debug for Handler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Self-detaching wrapper stored for `once` registrations
struct Once<A> {
    id: ListenerId,
    inner: Handler<A>,
    fired: AtomicBool,
    detach: Box<dyn Fn(ListenerId) + Send + Sync>,
}

impl<A: Args> Listener<A> for Once<A> {
    fn call(&self, args: A) {
        // Concurrent emissions may both snapshot this wrapper; only one fires.
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        let _detach = DetachOnDrop {
            id: self.id,
            detach: &*self.detach,
        };
        self.inner.call(args);
    }
}

/// Detaches on scope exit, including unwinding out of a panicking listener
struct DetachOnDrop<'a> {
    id: ListenerId,
    detach: &'a (dyn Fn(ListenerId) + Send + Sync),
}

impl Drop for DetachOnDrop<'_> {
    fn drop(&mut self) {
        (self.detach)(self.id);
    }
}

/// Anything `on`/`once` accept: a closure or an existing [`Handler`]
///
/// `M` only keeps the two impls apart and is always inferred.
pub trait IntoHandler<A: Args, M> {
    fn into_handler(self) -> Handler<A>;
}

impl<A: Args> IntoHandler<A, ()> for Handler<A> {
    fn into_handler(self) -> Handler<A> {
        self
    }
}

impl<A: Args, L: Listener<A>> IntoHandler<A, fn(A)> for L {
    fn into_handler(self) -> Handler<A> {
        Handler::new(self)
    }
}
