//! EventEmitter - in-process publish/subscribe
//!
//! Named events fan out to registered listeners with positional arguments.
//! The first listener registered for an event locks its argument signature;
//! emission invokes every listener in parallel and returns once all of them
//! have completed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      EventEmitter                        │
//! │        Mutex<HashMap<event name, ListenerList>>          │
//! └──────────────────────────────────────────────────────────┘
//!        │ on / once / off              │ emit (snapshot, unlock)
//!        ↓                              ↓
//! ┌────────────────────┐      ┌───────────────────────────────┐
//! │   ListenerList     │      │        dispatch::fan_out       │
//! │ signature lock     │      │ one scoped thread per listener │
//! │ ordered handlers   │      │ catch_unwind, join all         │
//! └────────────────────┘      └───────────────────────────────┘
//!                                       │ panics, threshold
//!                                       ↓
//!                             ┌───────────────────────────────┐
//!                             │ tracing + diagnostics channel │
//!                             └───────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use eventemitter::{EmitterError, EventEmitter, Handler};
//!
//! # fn main() -> Result<(), EmitterError> {
//! let emitter = EventEmitter::new();
//! let on_data = Handler::new(|n: i32, name: String| println!("{name}{n}"));
//!
//! emitter.on("data", on_data.clone())?.emit("data", (10, "fun".to_string()))?;
//! emitter.off("data", &on_data);
//! assert_eq!(emitter.listener_count("data"), 0);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diagnostics;
mod dispatch;
mod emitter;
pub mod error;
mod event;
mod list;
mod listener;
mod signature;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticEntry};
pub use emitter::EventEmitter;
pub use error::EmitterError;
pub use event::Event;
pub use listener::{Handler, IntoHandler, Listener, ListenerId};
pub use signature::{Args, Bind, BindArgs, Nil, Signature};

/// Default listener count per event at which a warning is raised
pub const DEFAULT_MAX_LISTENERS: i64 = 10;

/// `max_listeners` value disabling the warning
pub const UNLIMITED_LISTENERS: i64 = -1;

/// Default diagnostics buffered per subscriber
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 1024;
