//! Projections: disposable read models fed by published event envelopes.
//!
//! Each projection consumes envelopes from the bus (single consumer per
//! projection), tolerates at-least-once delivery, and can be rebuilt from
//! the event streams if thrown away.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use depot_core::AggregateId;

pub mod movement_history;
pub mod stock_levels;
pub mod supplier_directory;

pub use movement_history::{MonthlyCounts, MovementDirection, MovementHistoryProjection, MovementRow};
pub use stock_levels::{ProductRow, StockLevelsProjection};
pub use supplier_directory::{SupplierDirectoryProjection, SupplierRow};

/// Stream type tags, shared between dispatch call sites (which stamp them
/// onto appended events) and projections (which route envelopes by them).
pub const PRODUCT_STREAM: &str = "inventory.product";
pub const SUPPLIER_STREAM: &str = "directory.supplier";

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize event payload: {0}")]
    Deserialize(String),

    #[error("stream isolation violation: {0}")]
    StreamIsolation(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    #[error("projection lock poisoned")]
    Poisoned,
}

/// Per-stream cursors implementing the at-least-once delivery protocol:
/// duplicates and replays at or below the cursor are skipped, gaps beyond
/// the cursor are rejected, and the cursor advances only after a successful
/// apply. The first event of a stream may carry any positive sequence (some
/// stores start streams above 1); after that, increments must be strict.
#[derive(Debug, Default)]
pub struct StreamCursors {
    inner: RwLock<HashMap<AggregateId, u64>>,
}

impl StreamCursors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `apply` under the cursor protocol for one envelope.
    ///
    /// Holding the write lock across check + apply + advance keeps the
    /// projection consistent even if envelopes arrive from more than one
    /// thread.
    pub fn transact<F>(
        &self,
        aggregate_id: AggregateId,
        sequence_number: u64,
        apply: F,
    ) -> Result<(), ProjectionError>
    where
        F: FnOnce() -> Result<(), ProjectionError>,
    {
        let mut cursors = self.inner.write().map_err(|_| ProjectionError::Poisoned)?;
        let last = *cursors.get(&aggregate_id).unwrap_or(&0);

        if sequence_number == 0 {
            return Err(ProjectionError::NonMonotonicSequence {
                last,
                found: sequence_number,
            });
        }

        if sequence_number <= last {
            // Duplicate or replay; safe to ignore.
            return Ok(());
        }

        if last != 0 && sequence_number != last + 1 {
            return Err(ProjectionError::NonMonotonicSequence {
                last,
                found: sequence_number,
            });
        }

        apply()?;

        cursors.insert(aggregate_id, sequence_number);
        Ok(())
    }
}
