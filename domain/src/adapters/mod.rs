//! Adapters that live inside the domain crate for convenience.
//!
//! The in-memory store backs unit tests and the `memory` storage provider of
//! the api-server. The SQLite adapter lives in its own crate.

pub mod memory_repo;
