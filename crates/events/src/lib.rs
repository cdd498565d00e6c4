//! Domain events: the `Event` trait, the persisted/published envelope, and
//! a transport-agnostic pub/sub bus abstraction.

pub mod bus;
pub mod envelope;
pub mod event;

pub use bus::{EventBus, InMemoryBusError, InMemoryEventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
