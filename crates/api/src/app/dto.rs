use serde::Deserialize;
use uuid::Uuid;

use depot_directory::ContactInfo;
use depot_infra::event_store::StoredEvent;
use depot_infra::projections::{MovementDirection, MovementRow, ProductRow, SupplierRow};
use depot_inventory::{InboundDraft, OutboundDraft, Product};

use crate::app::services::MovementReceipt;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterProductRequest {
    pub name: String,
    pub brand: String,
    pub stock_minimum: i64,
    pub sale_price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterSupplierRequest {
    pub name: String,
    pub contact: Option<ContactInfo>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSupplierRequest {
    pub name: Option<String>,
    pub contact: Option<ContactInfo>,
}

/// Inbound movement submission ("entrada"), form-shaped.
#[derive(Debug, Deserialize)]
pub struct InboundMovementRequest {
    pub product_id: String,
    pub supplier_id: Option<String>,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub lot_number: Option<String>,
    pub entry_date: String,
    pub expiry_date: Option<String>,
    pub received_by: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: String,
    pub idempotency_key: Option<Uuid>,
}

impl InboundMovementRequest {
    pub fn into_draft(self) -> (InboundDraft, Option<Uuid>) {
        let key = self.idempotency_key;
        (
            InboundDraft {
                product_id: self.product_id,
                supplier_id: self.supplier_id,
                quantity: self.quantity,
                unit_cost_cents: self.unit_cost_cents,
                lot_number: self.lot_number,
                entry_date: self.entry_date,
                expiry_date: self.expiry_date,
                received_by: self.received_by,
                notes: self.notes,
                recorded_by: self.recorded_by,
            },
            key,
        )
    }
}

/// Outbound movement submission ("salida"), form-shaped.
#[derive(Debug, Deserialize)]
pub struct OutboundMovementRequest {
    pub product_id: String,
    pub quantity: i64,
    pub kind: String,
    pub destination: Option<String>,
    pub unit_price_cents: Option<i64>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub exit_date: String,
    pub recorded_by: String,
    pub idempotency_key: Option<Uuid>,
}

impl OutboundMovementRequest {
    pub fn into_draft(self) -> (OutboundDraft, Option<Uuid>) {
        let key = self.idempotency_key;
        (
            OutboundDraft {
                product_id: self.product_id,
                quantity: self.quantity,
                kind: self.kind,
                destination: self.destination,
                unit_price_cents: self.unit_price_cents,
                responsible: self.responsible,
                notes: self.notes,
                exit_date: self.exit_date,
                recorded_by: self.recorded_by,
            },
            key,
        )
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn product_row_to_json(row: &ProductRow) -> serde_json::Value {
    serde_json::json!({
        "id": row.product_id.0.to_string(),
        "name": row.name,
        "brand": row.brand,
        "stock": row.stock,
        "stock_minimum": row.stock_minimum,
        "sale_price_cents": row.sale_price_cents,
        "status": row.status().as_str(),
    })
}

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id_typed().to_string(),
        "name": product.name(),
        "brand": product.brand(),
        "stock": product.stock(),
        "stock_minimum": product.stock_minimum(),
        "sale_price_cents": product.sale_price_cents(),
        "status": product.stock_status().as_str(),
    })
}

pub fn supplier_row_to_json(row: &SupplierRow) -> serde_json::Value {
    serde_json::json!({
        "id": row.supplier_id.0.to_string(),
        "name": row.name,
        "contact_name": row.contact_name,
        "email": row.email,
        "phone": row.phone,
    })
}

pub fn movement_row_to_json(row: &MovementRow) -> serde_json::Value {
    serde_json::json!({
        "id": row.movement_id.to_string(),
        "sequence_number": row.sequence_number,
        "product_id": row.product_id.0.to_string(),
        "product_name": row.product_name,
        "product_brand": row.product_brand,
        "direction": match row.direction {
            MovementDirection::Inbound => "inbound",
            MovementDirection::Outbound => "outbound",
        },
        "kind": row.kind.map(|k| k.as_str()),
        "quantity": row.quantity,
        "unit_cost_cents": row.unit_cost_cents,
        "unit_price_cents": row.unit_price_cents,
        "supplier_id": row.supplier_id.map(|s| s.0.to_string()),
        "destination": row.destination,
        "lot_number": row.lot_number,
        "movement_date": row.movement_date.to_string(),
        "expiry_date": row.expiry_date.map(|d| d.to_string()),
        "received_by": row.received_by,
        "responsible": row.responsible.map(|u| u.to_string()),
        "notes": row.notes,
        "recorded_by": row.recorded_by.to_string(),
        "recorded_at": row.recorded_at.to_rfc3339(),
    })
}

pub fn ledger_entry_to_json(entry: &StoredEvent) -> serde_json::Value {
    serde_json::json!({
        "id": entry.event_id.to_string(),
        "sequence_number": entry.sequence_number,
        "event_type": entry.event_type,
        "occurred_at": entry.occurred_at.to_rfc3339(),
        "recorded_at": entry.recorded_at.to_rfc3339(),
        "data": entry.payload,
    })
}

pub fn receipt_to_json(receipt: &MovementReceipt) -> serde_json::Value {
    serde_json::json!({
        "product": product_to_json(&receipt.product),
        "ledger_entries": receipt
            .entries
            .iter()
            .map(ledger_entry_to_json)
            .collect::<Vec<_>>(),
        "replayed": receipt.replayed,
    })
}
