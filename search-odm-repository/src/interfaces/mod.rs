//! Interface definitions for the search connection and lifecycle hooks.
//!
//! This module defines the abstract `SearchConnection` trait that allows for
//! dependency injection and swappable engine transports, and the listener
//! trait through which the host is notified around inserts.

mod lifecycle_listener;
mod search_connection;

pub use lifecycle_listener::{LifecycleEvent, LifecycleListener};
pub use search_connection::SearchConnection;
