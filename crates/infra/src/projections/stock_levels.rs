use serde_json::Value as JsonValue;

use depot_core::AggregateId;
use depot_events::EventEnvelope;
use depot_inventory::{ProductEvent, ProductId, StockStatus};

use crate::read_model::ReadModelStore;

use super::{ProjectionError, StreamCursors, PRODUCT_STREAM};

/// Queryable stock-level read model: one row per product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub product_id: ProductId,
    pub name: String,
    pub brand: String,
    pub stock: i64,
    pub stock_minimum: i64,
    pub sale_price_cents: i64,
}

impl ProductRow {
    pub fn status(&self) -> StockStatus {
        StockStatus::classify(self.stock, self.stock_minimum)
    }
}

/// Stock levels projection.
///
/// Consumes published product envelopes and maintains the per-product rows
/// the catalog and dashboard views read.
#[derive(Debug)]
pub struct StockLevelsProjection<S>
where
    S: ReadModelStore<ProductId, ProductRow>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> StockLevelsProjection<S>
where
    S: ReadModelStore<ProductId, ProductRow>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    /// Query the row for one product.
    pub fn get(&self, product_id: &ProductId) -> Option<ProductRow> {
        self.store.get(product_id)
    }

    /// List all product rows.
    pub fn list(&self) -> Vec<ProductRow> {
        self.store.list()
    }

    /// Apply a published envelope into the projection.
    ///
    /// Envelopes from other streams are ignored; duplicates are skipped.
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
                self.apply_event(aggregate_id, &event)
            })
    }

    fn apply_event(
        &self,
        aggregate_id: AggregateId,
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
                self.store.upsert(
                    e.product_id,
                    ProductRow {
                        product_id: e.product_id,
                        name: e.name.clone(),
                        brand: e.brand.clone(),
                        stock: 0,
                        stock_minimum: e.stock_minimum,
                        sale_price_cents: e.sale_price_cents,
                    },
                );
            }
            ProductEvent::StockReceived(e) => {
                let mut row = self.row_or_default(e.product_id);
                row.stock += e.quantity;
                self.store.upsert(e.product_id, row);
            }
            ProductEvent::StockIssued(e) => {
                let mut row = self.row_or_default(e.product_id);
                row.stock -= e.quantity;
                self.store.upsert(e.product_id, row);
            }
        }

        Ok(())
    }

    fn row_or_default(&self, product_id: ProductId) -> ProductRow {
        self.store.get(&product_id).unwrap_or(ProductRow {
            product_id,
            name: String::new(),
            brand: String::new(),
            stock: 0,
            stock_minimum: 0,
            sale_price_cents: 0,
        })
    }
}
