//! Supplier directory domain module.
//!
//! Suppliers are reference data for inbound stock registration: the stock-in
//! view lists them for selection, and inbound movements may reference one.

pub mod supplier;

pub use supplier::{
    ContactInfo, RegisterSupplier, Supplier, SupplierCommand, SupplierEvent, SupplierId,
    SupplierRegistered, SupplierUpdated, UpdateSupplier,
};
