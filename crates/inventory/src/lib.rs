//! Inventory domain module.
//!
//! This crate contains the business rules for stock movements: the `Product`
//! aggregate (register, receive stock, issue stock), the draft-request
//! validation step, and the outbound movement kinds. Everything here is
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod movement;
pub mod product;

pub use movement::{suggested_unit_price, InboundDraft, OutboundDraft, OutboundKind};
pub use product::{
    IssueStock, Product, ProductCommand, ProductEvent, ProductId, ProductRegistered,
    ReceiveStock, RegisterProduct, StockIssued, StockReceived, StockStatus,
};
