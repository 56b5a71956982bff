//! # CSV Storage
//!
//! File-based operation storage. All operations live in a single
//! `operations.csv` at the root of the data directory:
//!
//! ```text
//! data/
//! └── operations.csv
//! ```
//!
//! Writes go to a temporary file first and are moved into place, so a failed
//! write never leaves a half-written ledger behind.

pub mod connection;
pub mod operation_repository;

pub use connection::CsvConnection;
pub use operation_repository::CsvOperationStore;
