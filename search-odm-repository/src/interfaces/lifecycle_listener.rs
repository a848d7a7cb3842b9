//! Lifecycle notifications emitted by the persister around inserts.

use std::fmt;

/// Events dispatched while flushing queued inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Dispatched with a working copy of the entity before it is extracted.
    /// Changes made by the listener are what gets written.
    BeforeInsert,
    /// Dispatched with the caller's entity after it was hydrated from the
    /// engine response.
    PostInsert,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::BeforeInsert => "beforeInsert",
            LifecycleEvent::PostInsert => "postInsert",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host hook notified around each insert.
pub trait LifecycleListener<E>: Send + Sync {
    fn notify(&self, event: LifecycleEvent, entity: &mut E);
}
