//! Idempotency registry for movement submissions.
//!
//! Applying a movement is not blindly retryable: a network-level retry of a
//! committed stock-out would decrement twice. Callers that may retry attach
//! a deduplication key (UUID) to the submission; the registry remembers the
//! ledger entries committed under each key and replays them on resubmission
//! instead of dispatching again.
//!
//! Only accepted submissions are recorded. Rejected ones mutate nothing, so
//! resubmitting them (with or without a key) is always safe.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::event_store::StoredEvent;

#[derive(Debug, Default)]
pub struct IdempotencyRegistry {
    committed: RwLock<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl IdempotencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the ledger entries previously committed under `key`.
    pub fn recall(&self, key: Uuid) -> Option<Vec<StoredEvent>> {
        let map = self.committed.read().ok()?;
        map.get(&key).cloned()
    }

    /// Record the ledger entries committed under `key`.
    ///
    /// First write wins: a concurrent duplicate that lost the optimistic
    /// concurrency race never gets here, so the recorded entries are the
    /// ones that actually committed.
    pub fn record(&self, key: Uuid, entries: Vec<StoredEvent>) {
        if let Ok(mut map) = self.committed.write() {
            map.entry(key).or_insert(entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use depot_core::AggregateId;

    fn entry(seq: u64) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::now_v7(),
            aggregate_id: AggregateId::new(),
            aggregate_type: "inventory.product".to_string(),
            sequence_number: seq,
            event_type: "inventory.product.stock_issued".to_string(),
            event_version: 1,
            occurred_at: Utc::now(),
            recorded_at: Utc::now(),
            payload: serde_json::json!({}),
        }
    }

    #[test]
    fn recall_unknown_key_is_none() {
        let registry = IdempotencyRegistry::new();
        assert!(registry.recall(Uuid::now_v7()).is_none());
    }

    #[test]
    fn recorded_entries_are_replayed() {
        let registry = IdempotencyRegistry::new();
        let key = Uuid::now_v7();
        let entries = vec![entry(1)];

        registry.record(key, entries.clone());
        assert_eq!(registry.recall(key), Some(entries));
    }

    #[test]
    fn first_record_wins() {
        let registry = IdempotencyRegistry::new();
        let key = Uuid::now_v7();
        let first = vec![entry(1)];

        registry.record(key, first.clone());
        registry.record(key, vec![entry(2)]);
        assert_eq!(registry.recall(key), Some(first));
    }
}
