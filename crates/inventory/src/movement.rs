//! Movement requests as they arrive from the outside (form-shaped, untyped)
//! and the validation step that turns them into typed commands.
//!
//! Validation here is pure and side-effect free: it checks a draft against a
//! product snapshot and either returns a command ready for dispatch or the
//! first failing constraint. Repeating it any number of times mutates
//! nothing, so rejected submissions are always safe to resubmit.

use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use depot_core::{DomainError, DomainResult, UserId};
use depot_directory::SupplierId;

use crate::product::{IssueStock, Product, ReceiveStock};

/// Outbound movement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundKind {
    Sale,
    InternalConsumption,
    Adjustment,
    Damaged,
}

impl OutboundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundKind::Sale => "sale",
            OutboundKind::InternalConsumption => "internal_consumption",
            OutboundKind::Adjustment => "adjustment",
            OutboundKind::Damaged => "damaged",
        }
    }
}

impl core::fmt::Display for OutboundKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutboundKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(OutboundKind::Sale),
            "internal_consumption" => Ok(OutboundKind::InternalConsumption),
            "adjustment" => Ok(OutboundKind::Adjustment),
            "damaged" => Ok(OutboundKind::Damaged),
            other => Err(DomainError::invalid_transaction_type(format!(
                "unrecognized outbound kind: {other:?}"
            ))),
        }
    }
}

/// Calendar date format used by movement forms.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Suggested outbound unit price: the product's current sale price.
///
/// Suggestion only: the presentation layer pre-fills the price field with
/// this, and validation never rejects a caller-supplied price that differs.
pub fn suggested_unit_price(product: &Product) -> i64 {
    product.sale_price_cents()
}

/// Raw inbound movement request ("entrada"), before validation.
///
/// Fields are carried the way a form or API client submits them: string
/// identifiers and `%Y-%m-%d` dates. Blank optional strings count as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundDraft {
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
}

impl InboundDraft {
    /// Validate this draft against a product snapshot.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// product resolution, quantity, entry date, amounts, then secondary
    /// identifier parsing. `occurred_at` is the submission instant, injected
    /// so validation itself never reads a clock.
    pub fn validate(
        &self,
        product: Option<&Product>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<ReceiveStock> {
        let product_id = resolve_product(&self.product_id, product)?.id_typed();

        if self.quantity <= 0 {
            return Err(DomainError::invalid_quantity(
                "quantity must be greater than zero",
            ));
        }

        let entry_date = parse_date("entry date", &self.entry_date)?;
        let expiry_date = parse_optional_date("expiry date", self.expiry_date.as_deref())?;

        if self.unit_cost_cents < 0 {
            return Err(DomainError::invalid_amount("unit cost cannot be negative"));
        }

        let supplier_id = match non_blank(self.supplier_id.as_deref()) {
            Some(s) => Some(SupplierId::new(s.parse().map_err(|_| {
                DomainError::invalid_id(format!("supplier id: {s:?}"))
            })?)),
            None => None,
        };
        let recorded_by: UserId = self
            .recorded_by
            .parse()
            .map_err(|_| DomainError::invalid_id(format!("recorded_by: {:?}", self.recorded_by)))?;

        Ok(ReceiveStock {
            product_id,
            supplier_id,
            quantity: self.quantity,
            unit_cost_cents: self.unit_cost_cents,
            lot_number: non_blank(self.lot_number.as_deref()).map(str::to_string),
            entry_date,
            expiry_date,
            received_by: non_blank(self.received_by.as_deref()).map(str::to_string),
            notes: non_blank(self.notes.as_deref()).map(str::to_string),
            recorded_by,
            occurred_at,
        })
    }
}

/// Raw outbound movement request ("salida"), before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundDraft {
    pub product_id: String,
    pub quantity: i64,
    pub kind: String,
    pub destination: Option<String>,
    pub unit_price_cents: Option<i64>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub exit_date: String,
    pub recorded_by: String,
}

impl OutboundDraft {
    /// Validate this draft against a product snapshot.
    ///
    /// Checks run in a fixed order and stop at the first failure: product
    /// resolution, quantity, stock sufficiency, exit date, outbound kind,
    /// amounts, then secondary identifier parsing. Sufficiency is re-checked
    /// at commit time against fresh state, so passing here is necessary but
    /// not sufficient under concurrency.
    pub fn validate(
        &self,
        product: Option<&Product>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<IssueStock> {
        let snapshot = resolve_product(&self.product_id, product)?;
        let product_id = snapshot.id_typed();

        if self.quantity <= 0 {
            return Err(DomainError::invalid_quantity(
                "quantity must be greater than zero",
            ));
        }
        if self.quantity > snapshot.stock() {
            return Err(DomainError::insufficient_stock(snapshot.stock()));
        }

        let exit_date = parse_date("exit date", &self.exit_date)?;
        let kind: OutboundKind = self.kind.parse()?;

        if let Some(price) = self.unit_price_cents {
            if price < 0 {
                return Err(DomainError::invalid_amount("unit price cannot be negative"));
            }
        }

        let responsible = match non_blank(self.responsible.as_deref()) {
            Some(s) => Some(s.parse().map_err(|_| {
                DomainError::invalid_id(format!("responsible: {s:?}"))
            })?),
            None => None,
        };
        let recorded_by: UserId = self
            .recorded_by
            .parse()
            .map_err(|_| DomainError::invalid_id(format!("recorded_by: {:?}", self.recorded_by)))?;

        Ok(IssueStock {
            product_id,
            quantity: self.quantity,
            kind,
            destination: non_blank(self.destination.as_deref()).map(str::to_string),
            unit_price_cents: self.unit_price_cents,
            responsible,
            notes: non_blank(self.notes.as_deref()).map(str::to_string),
            exit_date,
            recorded_by,
            occurred_at,
        })
    }
}

/// A product reference resolves only if it parses and matches an existing
/// snapshot. Malformed or mismatched references are indistinguishable from
/// missing ones to the caller.
fn resolve_product<'a>(
    raw_id: &str,
    product: Option<&'a Product>,
) -> DomainResult<&'a Product> {
    let parsed = raw_id
        .parse()
        .map(crate::product::ProductId::new)
        .map_err(|_: DomainError| DomainError::product_not_found())?;

    match product {
        Some(p) if p.exists() && p.id_typed() == parsed => Ok(p),
        _ => Err(DomainError::product_not_found()),
    }
}

fn parse_date(field: &str, raw: &str) -> DomainResult<NaiveDate> {
    if raw.trim().is_empty() {
        return Err(DomainError::invalid_date(format!("{field} is required")));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| DomainError::invalid_date(format!("{field}: {raw:?} is not a valid date")))
}

fn parse_optional_date(field: &str, raw: Option<&str>) -> DomainResult<Option<NaiveDate>> {
    match non_blank(raw) {
        Some(s) => parse_date(field, s).map(Some),
        None => Ok(None),
    }
}

/// Forms submit empty strings for untouched optional fields; treat them as
/// absent.
fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}
