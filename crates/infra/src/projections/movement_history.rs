use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use depot_core::{AggregateId, UserId};
use depot_directory::SupplierId;
use depot_events::EventEnvelope;
use depot_inventory::{OutboundKind, ProductEvent, ProductId};

use super::{ProjectionError, StreamCursors, PRODUCT_STREAM};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementDirection {
    Inbound,
    Outbound,
}

/// One committed ledger entry, denormalized for history views.
///
/// `movement_id`, `sequence_number`, and `recorded_at` come from the stored
/// event (server-assigned); everything else is the movement payload plus the
/// product display fields current at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRow {
    pub movement_id: Uuid,
    pub sequence_number: u64,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_brand: String,
    pub direction: MovementDirection,
    /// Outbound movements only.
    pub kind: Option<OutboundKind>,
    pub quantity: i64,
    /// Inbound movements only.
    pub unit_cost_cents: Option<i64>,
    /// Outbound movements only.
    pub unit_price_cents: Option<i64>,
    pub supplier_id: Option<SupplierId>,
    pub destination: Option<String>,
    pub lot_number: Option<String>,
    /// Entry date for inbound, exit date for outbound.
    pub movement_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub received_by: Option<String>,
    pub responsible: Option<UserId>,
    pub notes: Option<String>,
    pub recorded_by: UserId,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthlyCounts {
    pub inbound: u64,
    pub outbound: u64,
}

/// Movement history projection: the ledger as a reverse-chronological list.
///
/// Rows are appended in commit order and never mutated. Product name/brand
/// are captured from `ProductRegistered` events so history rows render
/// without a catalog lookup.
#[derive(Debug, Default)]
pub struct MovementHistoryProjection {
    rows: RwLock<Vec<MovementRow>>,
    product_names: RwLock<HashMap<ProductId, (String, String)>>,
    cursors: StreamCursors,
}

impl MovementHistoryProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent movements, newest first, optionally filtered by direction.
    pub fn recent(
        &self,
        direction: Option<MovementDirection>,
        limit: usize,
    ) -> Vec<MovementRow> {
        let rows = match self.rows.read() {
            Ok(r) => r,
            Err(_) => return vec![],
        };

        rows.iter()
            .rev()
            .filter(|row| direction.is_none_or(|d| row.direction == d))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Movements whose business date falls in the given month.
    pub fn counts_for_month(&self, year: i32, month: u32) -> MonthlyCounts {
        let rows = match self.rows.read() {
            Ok(r) => r,
            Err(_) => return MonthlyCounts::default(),
        };

        let mut counts = MonthlyCounts::default();
        for row in rows.iter() {
            if row.movement_date.year() == year && row.movement_date.month() == month {
                match row.direction {
                    MovementDirection::Inbound => counts.inbound += 1,
                    MovementDirection::Outbound => counts.outbound += 1,
                }
            }
        }
        counts
    }

    /// Apply a published envelope into the projection.
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != PRODUCT_STREAM {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        self.cursors
            .transact(aggregate_id, envelope.sequence_number(), || {
                let event: ProductEvent = serde_json::from_value(envelope.payload().clone())
                    .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;
                self.apply_event(aggregate_id, envelope, &event)
            })
    }

    fn apply_event(
        &self,
        aggregate_id: AggregateId,
        envelope: &EventEnvelope<JsonValue>,
        event: &ProductEvent,
    ) -> Result<(), ProjectionError> {
        let product_id = match event {
            ProductEvent::ProductRegistered(e) => e.product_id,
            ProductEvent::StockReceived(e) => e.product_id,
            ProductEvent::StockIssued(e) => e.product_id,
        };
        if product_id.0 != aggregate_id {
            return Err(ProjectionError::StreamIsolation(
                "event product_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match event {
            ProductEvent::ProductRegistered(e) => {
                if let Ok(mut names) = self.product_names.write() {
                    names.insert(e.product_id, (e.name.clone(), e.brand.clone()));
                }
            }
            ProductEvent::StockReceived(e) => {
                let (name, brand) = self.display_fields(e.product_id);
                self.push_row(MovementRow {
                    movement_id: envelope.event_id(),
                    sequence_number: envelope.sequence_number(),
                    product_id: e.product_id,
                    product_name: name,
                    product_brand: brand,
                    direction: MovementDirection::Inbound,
                    kind: None,
                    quantity: e.quantity,
                    unit_cost_cents: Some(e.unit_cost_cents),
                    unit_price_cents: None,
                    supplier_id: e.supplier_id,
                    destination: None,
                    lot_number: e.lot_number.clone(),
                    movement_date: e.entry_date,
                    expiry_date: e.expiry_date,
                    received_by: e.received_by.clone(),
                    responsible: None,
                    notes: e.notes.clone(),
                    recorded_by: e.recorded_by,
                    recorded_at: envelope.recorded_at(),
                })?;
            }
            ProductEvent::StockIssued(e) => {
                let (name, brand) = self.display_fields(e.product_id);
                self.push_row(MovementRow {
                    movement_id: envelope.event_id(),
                    sequence_number: envelope.sequence_number(),
                    product_id: e.product_id,
                    product_name: name,
                    product_brand: brand,
                    direction: MovementDirection::Outbound,
                    kind: Some(e.kind),
                    quantity: e.quantity,
                    unit_cost_cents: None,
                    unit_price_cents: e.unit_price_cents,
                    supplier_id: None,
                    destination: e.destination.clone(),
                    lot_number: None,
                    movement_date: e.exit_date,
                    expiry_date: None,
                    received_by: None,
                    responsible: e.responsible,
                    notes: e.notes.clone(),
                    recorded_by: e.recorded_by,
                    recorded_at: envelope.recorded_at(),
                })?;
            }
        }

        Ok(())
    }

    fn display_fields(&self, product_id: ProductId) -> (String, String) {
        self.product_names
            .read()
            .ok()
            .and_then(|names| names.get(&product_id).cloned())
            .unwrap_or_default()
    }

    fn push_row(&self, row: MovementRow) -> Result<(), ProjectionError> {
        let mut rows = self.rows.write().map_err(|_| ProjectionError::Poisoned)?;
        rows.push(row);
        Ok(())
    }
}
