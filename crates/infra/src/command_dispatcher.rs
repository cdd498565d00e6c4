//! Command execution pipeline (application-level orchestration).
//!
//! Every state change goes through the same pipeline:
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the aggregate's event stream
//!   ↓
//! 2. Rehydrate state (apply historical events)
//!   ↓
//! 3. Handle the command (pure decision, produces events)
//!   ↓
//! 4. Append with an exact expected version (optimistic concurrency)
//!   ↓
//! 5. Publish committed events to the bus
//! ```
//!
//! The append is the atomic unit of work: the decision in step 3 ran against
//! the exact stream version expected in step 4, so a concurrent writer makes
//! the append fail with a concurrency conflict instead of overdrawing stock.
//! Conflicts are retriable by re-dispatching, which re-validates against
//! fresh state. Publication happens only after a successful append; a
//! publish failure leaves the events durable and is surfaced separately.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use depot_core::{Aggregate, AggregateId, DomainError, ExpectedVersion};
use depot_events::{Event, EventBus, EventEnvelope};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug)]
pub enum DispatchError {
    /// Deterministic domain rejection (validation, sufficiency, conflicts).
    /// No state was changed; fix the input.
    Rejected(DomainError),
    /// Another writer advanced the stream between load and append. No state
    /// was changed by this dispatch; safe to retry against fresh state.
    Concurrency(String),
    /// Failed to deserialize historical payloads into the aggregate's events.
    Deserialize(String),
    /// Persisting to the event store failed.
    Store(EventStoreError),
    /// Publication failed after a successful append (at-least-once; the
    /// events are already durable).
    Publish(String),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match &value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg.clone()),
            _ => DispatchError::Store(value),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        DispatchError::Rejected(value)
    }
}

/// Reusable command execution engine for event-sourced aggregates.
///
/// Generic over the store and bus so tests run against in-memory
/// implementations and deployments can swap in durable ones without touching
/// domain code.
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Dispatch a command through the full pipeline.
    ///
    /// `make_aggregate` builds the empty rehydration target (e.g.
    /// `Product::empty`), keeping the dispatcher ignorant of aggregate
    /// construction. Returns the committed ledger entries on success.
    pub fn dispatch<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        command: A::Command,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: Event + Serialize + DeserializeOwned,
    {
        // 1) Load history
        let history = self.store.load_stream(aggregate_id)?;
        validate_loaded_stream(aggregate_id, &history)?;
        let expected = ExpectedVersion::Exact(stream_version(&history));

        // 2) Rehydrate aggregate
        let aggregate = rehydrate(aggregate_id, &history, make_aggregate)?;

        // 3) Decide events (no mutation)
        let decided = aggregate.handle(&command).map_err(DispatchError::from)?;
        if decided.is_empty() {
            return Ok(vec![]);
        }

        // 4) Append (atomic, optimistic)
        let aggregate_type = aggregate_type.into();
        let uncommitted = decided
            .iter()
            .map(|ev| {
                UncommittedEvent::from_typed(
                    aggregate_id,
                    aggregate_type.clone(),
                    Uuid::now_v7(),
                    ev,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, expected)?;

        // 5) Publish committed events (after append)
        committed.iter().try_for_each(|stored| {
            self.bus
                .publish(stored.to_envelope())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))
        })?;

        Ok(committed)
    }
}

/// Rebuild an aggregate from its stored stream.
///
/// Shared by the dispatch pipeline and read paths that need committed state
/// (validation snapshots, post-commit receipts). The returned aggregate
/// reports `version() == 0` and "does not exist" semantics when the stream
/// is empty.
pub fn rehydrate<A>(
    aggregate_id: AggregateId,
    history: &[StoredEvent],
    make_aggregate: impl FnOnce(AggregateId) -> A,
) -> Result<A, DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    let mut aggregate = make_aggregate(aggregate_id);
    apply_history::<A>(&mut aggregate, history)?;
    Ok(aggregate)
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    // Defense in depth: even a buggy backend must not feed us another
    // stream's events or a non-monotonic ordering.
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::Store(EventStoreError::StreamIsolation(
                format!("loaded stream contains wrong aggregate_id at index {idx}"),
            )));
        }
        let seq = e.sequence_number;
        if seq == 0 || seq <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(
                format!("non-monotonic sequence_number in loaded stream (last={last}, found={seq})"),
            )));
        }
        last = seq;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    // Ensure deterministic ordering.
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|e| e.sequence_number);

    for stored in sorted {
        let ev: A::Event = serde_json::from_value(stored.payload)
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}
