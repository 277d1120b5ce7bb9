//! Lifecycle event hubs.
//!
//! Sessions announce connect, close, execute, and write-data activity
//! through two hubs: one owned by the session instance, and one shared
//! process-wide. Callbacks run synchronously on the emitting task, in
//! registration order, instance hub first. A panicking callback unwinds
//! through the emitting call; no isolation between callbacks is provided,
//! so callbacks must stay side-effect-safe and must not block.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::response::Response;

/// Lifecycle points a session announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Establishing the transport connection.
    Connect,
    /// Closing the session.
    Close,
    /// Running a command.
    Execute,
    /// Uploading data to a remote path.
    WriteData,
}

/// Whether a callback observes the start or the completion of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Fired before the action is attempted.
    Before,
    /// Fired after the action completed successfully.
    After,
}

/// Payload handed to lifecycle callbacks.
#[derive(Debug, Clone, Copy)]
pub enum EventArgs<'a> {
    /// No payload (connect and close).
    None,
    /// The composed command line (before-execute).
    Command(&'a str),
    /// The completed response (after-execute).
    Response(&'a Response),
    /// Remote path and byte count (write-data).
    Write {
        /// Destination path on the remote host.
        path: &'a str,
        /// Number of bytes involved.
        len: usize,
    },
}

type Callback = Box<dyn Fn(&EventArgs<'_>) + Send + Sync>;

/// Ordered registry of lifecycle callbacks.
///
/// Registration appends, never replaces; emission for an action/phase with
/// no callbacks is a no-op.
#[derive(Default)]
pub struct EventHub {
    callbacks: HashMap<(Action, Phase), Vec<Callback>>,
}

impl EventHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback fired before `action`.
    pub fn before<F>(&mut self, action: Action, callback: F)
    where
        F: Fn(&EventArgs<'_>) + Send + Sync + 'static,
    {
        self.register(action, Phase::Before, callback);
    }

    /// Register a callback fired after `action` completes successfully.
    pub fn after<F>(&mut self, action: Action, callback: F)
    where
        F: Fn(&EventArgs<'_>) + Send + Sync + 'static,
    {
        self.register(action, Phase::After, callback);
    }

    fn register<F>(&mut self, action: Action, phase: Phase, callback: F)
    where
        F: Fn(&EventArgs<'_>) + Send + Sync + 'static,
    {
        self.callbacks
            .entry((action, phase))
            .or_default()
            .push(Box::new(callback));
    }

    /// Invoke every callback for the action/phase, in registration order,
    /// passing the same payload to each.
    pub fn emit(&self, phase: Phase, action: Action, args: &EventArgs<'_>) {
        if let Some(callbacks) = self.callbacks.get(&(action, phase)) {
            for callback in callbacks {
                callback(args);
            }
        }
    }

    /// Remove every registered callback.
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// Whether any callback is registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.values().all(Vec::is_empty)
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self
            .callbacks
            .iter()
            .map(|(key, callbacks)| (key, callbacks.len()))
            .collect();
        f.debug_struct("EventHub").field("callbacks", &counts).finish()
    }
}

/// The process-wide shared hub, observing every session.
static SHARED: OnceLock<Mutex<EventHub>> = OnceLock::new();

fn shared() -> &'static Mutex<EventHub> {
    SHARED.get_or_init(|| Mutex::new(EventHub::new()))
}

/// Register a callback on the shared hub, fired before `action` on every
/// session in the process.
pub fn shared_before<F>(action: Action, callback: F)
where
    F: Fn(&EventArgs<'_>) + Send + Sync + 'static,
{
    shared()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .before(action, callback);
}

/// Register a callback on the shared hub, fired after `action` on every
/// session in the process.
pub fn shared_after<F>(action: Action, callback: F)
where
    F: Fn(&EventArgs<'_>) + Send + Sync + 'static,
{
    shared()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .after(action, callback);
}

/// Emit on the shared hub.
///
/// The hub's lock is held while callbacks run, so shared callbacks must not
/// register or emit shared events themselves.
pub fn emit_shared(phase: Phase, action: Action, args: &EventArgs<'_>) {
    shared()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .emit(phase, action, args);
}

/// Clear the shared hub.
///
/// The shared hub lives for the whole process; test suites reset it
/// between runs with this.
pub fn reset_shared() {
    shared()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}
