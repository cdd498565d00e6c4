//! Append-only event store boundary.
//!
//! Defines the storage abstraction for per-aggregate event streams without
//! making storage assumptions. The stream for a product **is** its movement
//! ledger: entries are assigned a server-side identifier, a sequence number,
//! and a commit timestamp, and are never mutated or deleted.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
