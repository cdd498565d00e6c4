//! Read-model storage abstraction.
//!
//! Read models are disposable: they can be cleared and rebuilt from the
//! event streams at any time.

pub mod store;

pub use store::{InMemoryReadModelStore, ReadModelStore};
