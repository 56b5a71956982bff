//! # Storage Traits
//!
//! This module defines the storage abstraction the accounting services are fed
//! from, so that different storage backends can be used interchangeably.

use anyhow::Result;
use log::{error, warn};
use shared::OperationComptable;

/// Trait defining the interface for operation storage
///
/// Implementations own their concurrency control; the domain layer only ever
/// works on the snapshot returned by `list`.
pub trait OperationStore: Send + Sync {
    /// All stored operations, in storage order
    fn list(&self) -> Result<Vec<OperationComptable>>;

    /// Store a new operation
    /// Fails if an operation with the same id is already stored
    fn add(&self, operation: OperationComptable) -> Result<()>;

    /// Delete an operation by id
    /// Returns true if the operation was found and deleted, false otherwise
    fn remove(&self, operation_id: &str) -> Result<bool>;

    /// Store several new operations; either all of them are stored or none.
    ///
    /// The default adds them one by one and removes the ones already added
    /// when a later add fails. Stores that can write a batch at once override it.
    fn add_all(&self, operations: &[OperationComptable]) -> Result<()> {
        for (index, operation) in operations.iter().enumerate() {
            if let Err(e) = self.add(operation.clone()) {
                for added in operations[..index].iter().rev() {
                    if let Err(rollback_error) = self.remove(&added.id) {
                        error!("❌ Could not roll back operation {}: {}", added.id, rollback_error);
                    }
                }
                if index > 0 {
                    warn!("⚠️ Rolled back {} operations after a store failure", index);
                }
                return Err(e);
            }
        }
        Ok(())
    }
}
