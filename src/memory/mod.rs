//! Session memory
//!
//! Remembers what visitors told the agent about themselves (keyed by email)
//! for the lifetime of the process, and renders it back into every turn.

pub mod store;

pub use store::{format_user_details, InMemorySessionStore, SessionMemory};
