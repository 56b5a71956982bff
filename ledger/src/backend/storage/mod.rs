//! # Storage Module
//!
//! Persistence of accounting operations behind the `OperationStore` trait.
//!
//! The domain services never hold a store themselves: callers list the
//! operations, hand the snapshot to the services, and persist whatever the
//! services return. Two implementations ship with the crate:
//!
//! - **InMemoryOperationStore**: a locked vector, for embedding and tests
//! - **CsvOperationStore**: a single CSV file in the data directory

pub mod csv;
pub mod memory;
pub mod traits;

pub use self::csv::{CsvConnection, CsvOperationStore};
pub use memory::InMemoryOperationStore;
pub use traits::OperationStore;
