//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level rejection.
///
/// Keep this focused on deterministic business failures. Infrastructure
/// faults (storage, publication) are modeled in the infra layer and must
/// stay distinguishable from these, so callers can tell "fix your input"
/// from "try again later".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The referenced product does not resolve to an existing product.
    #[error("product not found")]
    ProductNotFound,

    /// Quantity missing, zero, or negative.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Requested quantity exceeds the stock on hand.
    #[error("insufficient stock: only {available} units available")]
    InsufficientStock { available: i64 },

    /// Movement date missing or not a valid calendar date.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Outbound movement kind is not one of the recognized values.
    #[error("invalid transaction type: {0}")]
    InvalidTransactionType(String),

    /// A monetary amount is out of range (negative cost or price).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A value failed validation (e.g. blank name on registration).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A conflict occurred (duplicate registration, stale version).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn product_not_found() -> Self {
        Self::ProductNotFound
    }

    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn insufficient_stock(available: i64) -> Self {
        Self::InsufficientStock { available }
    }

    pub fn invalid_date(msg: impl Into<String>) -> Self {
        Self::InvalidDate(msg.into())
    }

    pub fn invalid_transaction_type(msg: impl Into<String>) -> Self {
        Self::InvalidTransactionType(msg.into())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
