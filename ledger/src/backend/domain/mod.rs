//! # Domain Module
//!
//! Contains the business logic of the inventory ledger's accounting.
//!
//! ## Module Organization
//!
//! - **period**: calendar boundary math for months and years
//! - **accounting_service**: period filtering, totals, and day grouping
//! - **export_service**: building and writing accounting snapshots
//! - **import_service**: reading snapshots and merging them without duplicates
//! - **entitlement**: premium feature gating for creation flows
//!
//! ## Business Rules
//!
//! - Amounts are non-negative; the operation kind decides revenue or expense
//! - Operation ids are unique; imports never overwrite an existing operation
//! - A malformed import accepts nothing
//! - Exported totals are informational and never trusted on import

pub mod accounting_service;
pub mod entitlement;
pub mod export_service;
pub mod import_service;
pub mod period;

pub use accounting_service::*;
pub use entitlement::*;
pub use export_service::*;
pub use import_service::*;
pub use period::{CalendarZone, PeriodError};
