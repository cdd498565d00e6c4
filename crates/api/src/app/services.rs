//! Infrastructure wiring (in-memory store + bus + projections + dispatcher)
//! and the movement submission pipeline.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use depot_core::AggregateId;
use depot_directory::{Supplier, SupplierCommand, SupplierId};
use depot_events::{EventBus, EventEnvelope, InMemoryEventBus};
use depot_infra::{
    command_dispatcher::{rehydrate, CommandDispatcher, DispatchError},
    event_store::{EventStore, InMemoryEventStore, StoredEvent},
    idempotency::IdempotencyRegistry,
    projections::{
        MonthlyCounts, MovementDirection, MovementHistoryProjection, MovementRow, ProductRow,
        StockLevelsProjection, SupplierDirectoryProjection, SupplierRow, PRODUCT_STREAM,
        SUPPLIER_STREAM,
    },
    read_model::InMemoryReadModelStore,
};
use depot_inventory::{InboundDraft, OutboundDraft, Product, ProductCommand, ProductId};

type ProjectionEnvelope = EventEnvelope<serde_json::Value>;
type InMemoryDispatcher =
    CommandDispatcher<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<ProjectionEnvelope>>>;
type StockProjection = StockLevelsProjection<Arc<InMemoryReadModelStore<ProductId, ProductRow>>>;
type SupplierProjection =
    SupplierDirectoryProjection<Arc<InMemoryReadModelStore<SupplierId, SupplierRow>>>;

/// Result of an accepted (or replayed) movement submission: the committed
/// ledger entries plus the product state after the commit.
#[derive(Debug, Clone)]
pub struct MovementReceipt {
    pub entries: Vec<StoredEvent>,
    pub product: Product,
    /// True when an idempotency key matched a previous submission and the
    /// recorded entries were returned without dispatching again.
    pub replayed: bool,
}

pub struct AppServices {
    dispatcher: InMemoryDispatcher,
    event_store: Arc<InMemoryEventStore>,
    stock_projection: Arc<StockProjection>,
    supplier_projection: Arc<SupplierProjection>,
    history_projection: Arc<MovementHistoryProjection>,
    idempotency: IdempotencyRegistry,
}

pub fn build_services() -> AppServices {
    let store = Arc::new(InMemoryEventStore::new());
    let bus: Arc<InMemoryEventBus<ProjectionEnvelope>> = Arc::new(InMemoryEventBus::new());
    let dispatcher = CommandDispatcher::new(store.clone(), bus.clone());

    let stock_store: Arc<InMemoryReadModelStore<ProductId, ProductRow>> =
        Arc::new(InMemoryReadModelStore::new());
    let stock_projection = Arc::new(StockLevelsProjection::new(stock_store));

    let supplier_store: Arc<InMemoryReadModelStore<SupplierId, SupplierRow>> =
        Arc::new(InMemoryReadModelStore::new());
    let supplier_projection = Arc::new(SupplierDirectoryProjection::new(supplier_store));

    let history_projection = Arc::new(MovementHistoryProjection::new());

    spawn_projection_worker(
        bus.clone(),
        stock_projection.clone(),
        supplier_projection.clone(),
        history_projection.clone(),
    );

    AppServices {
        dispatcher,
        event_store: store,
        stock_projection,
        supplier_projection,
        history_projection,
        idempotency: IdempotencyRegistry::new(),
    }
}

/// Drain the bus into the projections on a dedicated thread.
///
/// Returns only after the subscription is live, so no envelope published
/// later can be missed.
fn spawn_projection_worker(
    bus: Arc<InMemoryEventBus<ProjectionEnvelope>>,
    stock: Arc<StockProjection>,
    suppliers: Arc<SupplierProjection>,
    history: Arc<MovementHistoryProjection>,
) {
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();

    std::thread::spawn(move || {
        let subscription = bus.subscribe();
        let _ = ready_tx.send(());

        while let Ok(envelope) = subscription.recv() {
            if let Err(e) = stock.apply_envelope(&envelope) {
                tracing::warn!(error = ?e, "stock levels projection rejected envelope");
            }
            if let Err(e) = history.apply_envelope(&envelope) {
                tracing::warn!(error = ?e, "movement history projection rejected envelope");
            }
            if let Err(e) = suppliers.apply_envelope(&envelope) {
                tracing::warn!(error = ?e, "supplier directory projection rejected envelope");
            }
        }
    });

    let _ = ready_rx.recv_timeout(std::time::Duration::from_secs(1));
}

impl AppServices {
    pub fn dispatch_product(
        &self,
        aggregate_id: AggregateId,
        command: ProductCommand,
    ) -> Result<Vec<StoredEvent>, DispatchError> {
        self.dispatcher
            .dispatch(aggregate_id, PRODUCT_STREAM, command, |id| {
                Product::empty(ProductId::new(id))
            })
    }

    pub fn dispatch_supplier(
        &self,
        aggregate_id: AggregateId,
        command: SupplierCommand,
    ) -> Result<Vec<StoredEvent>, DispatchError> {
        self.dispatcher
            .dispatch(aggregate_id, SUPPLIER_STREAM, command, |id| {
                Supplier::empty(SupplierId::new(id))
            })
    }

    /// Rehydrate a product directly from its event stream.
    ///
    /// Used for validation snapshots and for post-commit receipts, so both
    /// see committed state rather than projection state (which may lag).
    pub fn load_product(&self, product_id: ProductId) -> Result<Product, DispatchError> {
        let history = self.event_store.load_stream(product_id.0)?;
        rehydrate(product_id.0, &history, |id| Product::empty(ProductId::new(id)))
    }

    /// Register an inbound movement ("entrada").
    pub fn submit_inbound(
        &self,
        draft: InboundDraft,
        idempotency_key: Option<Uuid>,
    ) -> Result<MovementReceipt, DispatchError> {
        if let Some(receipt) = self.recall_receipt(idempotency_key)? {
            return Ok(receipt);
        }

        let snapshot = self.snapshot_for(&draft.product_id)?;
        let command = draft.validate(snapshot.as_ref(), Utc::now())?;
        let product_id = command.product_id;

        let entries =
            self.dispatch_product(product_id.0, ProductCommand::ReceiveStock(command))?;
        self.record_receipt(idempotency_key, &entries);

        Ok(MovementReceipt {
            entries,
            product: self.load_product(product_id)?,
            replayed: false,
        })
    }

    /// Register an outbound movement ("salida").
    ///
    /// Validation runs against a snapshot; the dispatch re-checks sufficiency
    /// against fresh state under the optimistic append, so concurrent
    /// submissions cannot overdraw. A `Concurrency` error is safe to retry.
    pub fn submit_outbound(
        &self,
        draft: OutboundDraft,
        idempotency_key: Option<Uuid>,
    ) -> Result<MovementReceipt, DispatchError> {
        if let Some(receipt) = self.recall_receipt(idempotency_key)? {
            return Ok(receipt);
        }

        let snapshot = self.snapshot_for(&draft.product_id)?;
        let command = draft.validate(snapshot.as_ref(), Utc::now())?;
        let product_id = command.product_id;

        let entries = self.dispatch_product(product_id.0, ProductCommand::IssueStock(command))?;
        self.record_receipt(idempotency_key, &entries);

        Ok(MovementReceipt {
            entries,
            product: self.load_product(product_id)?,
            replayed: false,
        })
    }

    fn snapshot_for(&self, raw_product_id: &str) -> Result<Option<Product>, DispatchError> {
        let Ok(aggregate_id) = raw_product_id.parse::<AggregateId>() else {
            // Malformed references fail validation as "not found".
            return Ok(None);
        };
        let product = self.load_product(ProductId::new(aggregate_id))?;
        Ok(product.exists().then_some(product))
    }

    fn recall_receipt(
        &self,
        idempotency_key: Option<Uuid>,
    ) -> Result<Option<MovementReceipt>, DispatchError> {
        let Some(key) = idempotency_key else {
            return Ok(None);
        };
        let Some(entries) = self.idempotency.recall(key) else {
            return Ok(None);
        };
        let Some(first) = entries.first() else {
            return Ok(None);
        };

        let product = self.load_product(ProductId::new(first.aggregate_id))?;
        Ok(Some(MovementReceipt {
            entries,
            product,
            replayed: true,
        }))
    }

    fn record_receipt(&self, idempotency_key: Option<Uuid>, entries: &[StoredEvent]) {
        if let Some(key) = idempotency_key {
            self.idempotency.record(key, entries.to_vec());
        }
    }

    // ---- read-model queries -------------------------------------------

    pub fn product_row(&self, product_id: &ProductId) -> Option<ProductRow> {
        self.stock_projection.get(product_id)
    }

    /// All product rows, sorted by name for stable listings.
    pub fn product_rows(&self) -> Vec<ProductRow> {
        let mut rows = self.stock_projection.list();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// All supplier rows, sorted by name.
    pub fn supplier_rows(&self) -> Vec<SupplierRow> {
        let mut rows = self.supplier_projection.list();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    pub fn supplier_row(&self, supplier_id: &SupplierId) -> Option<SupplierRow> {
        self.supplier_projection.get(supplier_id)
    }

    pub fn recent_movements(
        &self,
        direction: Option<MovementDirection>,
        limit: usize,
    ) -> Vec<MovementRow> {
        self.history_projection.recent(direction, limit)
    }

    pub fn monthly_counts(&self, year: i32, month: u32) -> MonthlyCounts {
        self.history_projection.counts_for_month(year, month)
    }
}
