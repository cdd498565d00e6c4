//! Infrastructure layer: event store, command dispatch, idempotency,
//! read-model stores, and projections.
//!
//! Nothing here contains business rules; it composes the domain crates with
//! storage and distribution mechanics. The only storage shipped is in-memory
//! (a durable backend is a deployment concern behind the same traits).

pub mod command_dispatcher;
pub mod event_store;
pub mod idempotency;
pub mod projections;
pub mod read_model;
