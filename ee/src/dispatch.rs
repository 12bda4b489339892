//! Parallel fan-out
//!
//! One scoped thread per listener, each with its own clone of the arguments.
//! A panicking listener is caught inside its thread and reported as a
//! [`ListenerFailure`]; the scope joins every thread before returning.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use tracing::{debug, warn};

use crate::listener::{Handler, ListenerId};
use crate::signature::Args;

/// A listener that panicked during dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    pub listener: ListenerId,
    pub message: String,
}

/// Invoke every handler with `args` in parallel and wait for all of them
pub fn fan_out<A: Args>(event: &str, handlers: &[Handler<A>], args: &A) -> Vec<ListenerFailure> {
    if handlers.is_empty() {
        return Vec::new();
    }
    debug!(event, listeners = handlers.len(), "dispatch::fan_out");

    thread::scope(|scope| {
        let mut pending = Vec::with_capacity(handlers.len());
        let mut failures = Vec::new();

        for handler in handlers {
            let task_args = args.clone();
            let spawned = thread::Builder::new()
                .name(format!("emit:{event}"))
                .spawn_scoped(scope, move || invoke(handler, task_args));
            match spawned {
                Ok(task) => pending.push((handler.id(), task)),
                Err(e) => {
                    warn!(
                        event,
                        listener = handler.id(),
                        error = %e,
                        "dispatch::fan_out: spawn failed, running inline"
                    );
                    if let Err(message) = invoke(handler, args.clone()) {
                        failures.push(ListenerFailure {
                            listener: handler.id(),
                            message,
                        });
                    }
                }
            }
        }

        for (listener, task) in pending {
            let outcome = task
                .join()
                .unwrap_or_else(|payload| Err(panic_message(payload.as_ref())));
            if let Err(message) = outcome {
                failures.push(ListenerFailure { listener, message });
            }
        }
        failures
    })
}

fn invoke<A: Args>(handler: &Handler<A>, args: A) -> Result<(), String> {
    panic::catch_unwind(AssertUnwindSafe(|| handler.call(args)))
        .map_err(|payload| panic_message(payload.as_ref()))
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "listener panicked".to_string()
    }
}
