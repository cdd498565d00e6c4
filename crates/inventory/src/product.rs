use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use depot_core::{Aggregate, AggregateId, AggregateRoot, DomainError, UserId};
use depot_directory::SupplierId;
use depot_events::Event;

use crate::movement::OutboundKind;

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Display-only stock classification.
///
/// `stock_minimum` is a reporting threshold, never an enforcement constraint:
/// movements below the minimum are still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Low,
    Normal,
}

impl StockStatus {
    pub fn classify(stock: i64, stock_minimum: i64) -> Self {
        if stock == 0 {
            StockStatus::OutOfStock
        } else if stock <= stock_minimum {
            StockStatus::Low
        } else {
            StockStatus::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Low => "low",
            StockStatus::Normal => "normal",
        }
    }
}

/// Aggregate root: Product.
///
/// Stock changes only through `StockReceived`/`StockIssued` events; `handle`
/// guarantees that no accepted event sequence can drive stock negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    brand: String,
    stock: i64,
    stock_minimum: i64,
    sale_price_cents: i64,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            name: String::new(),
            brand: String::new(),
            stock: 0,
            stock_minimum: 0,
            sale_price_cents: 0,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn stock_minimum(&self) -> i64 {
        self.stock_minimum
    }

    pub fn sale_price_cents(&self) -> i64 {
        self.sale_price_cents
    }

    /// Whether the product has been registered (an empty rehydration target
    /// with no events applied does not exist yet).
    pub fn exists(&self) -> bool {
        self.created
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.stock, self.stock_minimum)
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterProduct.
///
/// Catalog maintenance, not part of the movement validator. Stock starts at 0;
/// it only changes through movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterProduct {
    pub product_id: ProductId,
    pub name: String,
    pub brand: String,
    pub stock_minimum: i64,
    pub sale_price_cents: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReceiveStock (inbound movement, "entrada").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub product_id: ProductId,
    pub supplier_id: Option<SupplierId>,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub lot_number: Option<String>,
    pub entry_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub received_by: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: IssueStock (outbound movement, "salida").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStock {
    pub product_id: ProductId,
    pub quantity: i64,
    pub kind: OutboundKind,
    pub destination: Option<String>,
    /// Caller-supplied price; presentation layers may pre-fill it from
    /// `suggested_unit_price`, and a differing value is never rejected.
    pub unit_price_cents: Option<i64>,
    pub responsible: Option<UserId>,
    pub notes: Option<String>,
    pub exit_date: NaiveDate,
    pub recorded_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    RegisterProduct(RegisterProduct),
    ReceiveStock(ReceiveStock),
    IssueStock(IssueStock),
}

/// Event: ProductRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRegistered {
    pub product_id: ProductId,
    pub name: String,
    pub brand: String,
    pub stock_minimum: i64,
    pub sale_price_cents: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReceived, the inbound ledger entry payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReceived {
    pub product_id: ProductId,
    pub supplier_id: Option<SupplierId>,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub lot_number: Option<String>,
    pub entry_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub received_by: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockIssued, the outbound ledger entry payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockIssued {
    pub product_id: ProductId,
    pub quantity: i64,
    pub kind: OutboundKind,
    pub destination: Option<String>,
    pub unit_price_cents: Option<i64>,
    pub responsible: Option<UserId>,
    pub notes: Option<String>,
    pub exit_date: NaiveDate,
    pub recorded_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductRegistered(ProductRegistered),
    StockReceived(StockReceived),
    StockIssued(StockIssued),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductRegistered(_) => "inventory.product.registered",
            ProductEvent::StockReceived(_) => "inventory.product.stock_received",
            ProductEvent::StockIssued(_) => "inventory.product.stock_issued",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductRegistered(e) => e.occurred_at,
            ProductEvent::StockReceived(e) => e.occurred_at,
            ProductEvent::StockIssued(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductRegistered(e) => {
                self.id = e.product_id;
                self.name = e.name.clone();
                self.brand = e.brand.clone();
                self.stock = 0;
                self.stock_minimum = e.stock_minimum;
                self.sale_price_cents = e.sale_price_cents;
                self.created = true;
            }
            ProductEvent::StockReceived(e) => {
                self.stock += e.quantity;
            }
            ProductEvent::StockIssued(e) => {
                self.stock -= e.quantity;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::RegisterProduct(cmd) => self.handle_register(cmd),
            ProductCommand::ReceiveStock(cmd) => self.handle_receive(cmd),
            ProductCommand::IssueStock(cmd) => self.handle_issue(cmd),
        }
    }
}

impl Product {
    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::product_not_found());
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already registered"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if cmd.stock_minimum < 0 {
            return Err(DomainError::validation("stock minimum cannot be negative"));
        }
        if cmd.sale_price_cents < 0 {
            return Err(DomainError::invalid_amount("sale price cannot be negative"));
        }

        Ok(vec![ProductEvent::ProductRegistered(ProductRegistered {
            product_id: cmd.product_id,
            name: cmd.name.clone(),
            brand: cmd.brand.clone(),
            stock_minimum: cmd.stock_minimum,
            sale_price_cents: cmd.sale_price_cents,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_receive(&self, cmd: &ReceiveStock) -> Result<Vec<ProductEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::product_not_found());
        }
        self.ensure_product_id(cmd.product_id)?;

        if cmd.quantity <= 0 {
            return Err(DomainError::invalid_quantity(
                "quantity must be greater than zero",
            ));
        }
        if cmd.unit_cost_cents < 0 {
            return Err(DomainError::invalid_amount("unit cost cannot be negative"));
        }

        Ok(vec![ProductEvent::StockReceived(StockReceived {
            product_id: cmd.product_id,
            supplier_id: cmd.supplier_id,
            quantity: cmd.quantity,
            unit_cost_cents: cmd.unit_cost_cents,
            lot_number: cmd.lot_number.clone(),
            entry_date: cmd.entry_date,
            expiry_date: cmd.expiry_date,
            received_by: cmd.received_by.clone(),
            notes: cmd.notes.clone(),
            recorded_by: cmd.recorded_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    /// Commit-time guard for outbound movements.
    ///
    /// This re-checks sufficiency against the rehydrated state, so a request
    /// validated against a stale snapshot cannot overdraw stock.
    fn handle_issue(&self, cmd: &IssueStock) -> Result<Vec<ProductEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::product_not_found());
        }
        self.ensure_product_id(cmd.product_id)?;

        if cmd.quantity <= 0 {
            return Err(DomainError::invalid_quantity(
                "quantity must be greater than zero",
            ));
        }
        if cmd.quantity > self.stock {
            return Err(DomainError::insufficient_stock(self.stock));
        }
        if let Some(price) = cmd.unit_price_cents {
            if price < 0 {
                return Err(DomainError::invalid_amount("unit price cannot be negative"));
            }
        }

        Ok(vec![ProductEvent::StockIssued(StockIssued {
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            kind: cmd.kind,
            destination: cmd.destination.clone(),
            unit_price_cents: cmd.unit_price_cents,
            responsible: cmd.responsible,
            notes: cmd.notes.clone(),
            exit_date: cmd.exit_date,
            recorded_by: cmd.recorded_by,
            occurred_at: cmd.occurred_at,
        })])
    }
}
