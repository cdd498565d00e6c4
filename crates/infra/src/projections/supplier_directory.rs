use serde_json::Value as JsonValue;

use depot_core::AggregateId;
use depot_directory::{SupplierEvent, SupplierId};
use depot_events::EventEnvelope;

use crate::read_model::ReadModelStore;

use super::{ProjectionError, StreamCursors, SUPPLIER_STREAM};

/// Queryable supplier read model for the inbound view's selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierRow {
    pub supplier_id: SupplierId,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Supplier directory projection.
#[derive(Debug)]
pub struct SupplierDirectoryProjection<S>
where
    S: ReadModelStore<SupplierId, SupplierRow>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> SupplierDirectoryProjection<S>
where
    S: ReadModelStore<SupplierId, SupplierRow>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, supplier_id: &SupplierId) -> Option<SupplierRow> {
        self.store.get(supplier_id)
    }

    pub fn list(&self) -> Vec<SupplierRow> {
        self.store.list()
    }

    /// Apply a published envelope into the projection.
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != SUPPLIER_STREAM {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        self.cursors
            .transact(aggregate_id, envelope.sequence_number(), || {
                let event: SupplierEvent = serde_json::from_value(envelope.payload().clone())
                    .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;
                self.apply_event(aggregate_id, &event)
            })
    }

    fn apply_event(
        &self,
        aggregate_id: AggregateId,
        event: &SupplierEvent,
    ) -> Result<(), ProjectionError> {
        let supplier_id = match event {
            SupplierEvent::SupplierRegistered(e) => e.supplier_id,
            SupplierEvent::SupplierUpdated(e) => e.supplier_id,
        };
        if supplier_id.0 != aggregate_id {
            return Err(ProjectionError::StreamIsolation(
                "event supplier_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match event {
            SupplierEvent::SupplierRegistered(e) => {
                self.store.upsert(
                    e.supplier_id,
                    SupplierRow {
                        supplier_id: e.supplier_id,
                        name: e.name.clone(),
                        contact_name: e.contact.contact_name.clone(),
                        email: e.contact.email.clone(),
                        phone: e.contact.phone.clone(),
                    },
                );
            }
            SupplierEvent::SupplierUpdated(e) => {
                let mut row = self.store.get(&e.supplier_id).unwrap_or(SupplierRow {
                    supplier_id: e.supplier_id,
                    name: String::new(),
                    contact_name: None,
                    email: None,
                    phone: None,
                });
                if let Some(name) = &e.name {
                    row.name = name.clone();
                }
                if let Some(contact) = &e.contact {
                    row.contact_name = contact.contact_name.clone();
                    row.email = contact.email.clone();
                    row.phone = contact.phone.clone();
                }
                self.store.upsert(e.supplier_id, row);
            }
        }

        Ok(())
    }
}
