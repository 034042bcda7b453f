//! Ambient context for the assistant.
//!
//! Tracks environment facts that hold independently of any event stream:
//! time, timezone, host, focused application, today's calendar and mood.

pub mod manager;

// Re-export commonly used types
pub use manager::{
    create_shared_manager, resolve_hostname, resolve_timezone, CalendarEntry, ContextError,
    ContextManager, ContextState, Mood, SharedContextManager,
};
