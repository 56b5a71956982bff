//! In-memory operation store, used by callers that persist elsewhere and by tests.

use anyhow::{anyhow, Result};
use log::debug;
use shared::OperationComptable;
use std::collections::HashSet;
use std::sync::RwLock;

use super::traits::OperationStore;

#[derive(Debug, Default)]
pub struct InMemoryOperationStore {
    operations: RwLock<Vec<OperationComptable>>,
}

impl InMemoryOperationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with operations; ids must be unique
    pub fn with_operations(operations: Vec<OperationComptable>) -> Result<Self> {
        let store = Self::new();
        for operation in operations {
            store.add(operation)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> Result<usize> {
        let operations = self
            .operations
            .read()
            .map_err(|_| anyhow!("Operation store lock poisoned"))?;
        Ok(operations.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl OperationStore for InMemoryOperationStore {
    fn list(&self) -> Result<Vec<OperationComptable>> {
        let operations = self
            .operations
            .read()
            .map_err(|_| anyhow!("Operation store lock poisoned"))?;
        Ok(operations.clone())
    }

    fn add(&self, operation: OperationComptable) -> Result<()> {
        let mut operations = self
            .operations
            .write()
            .map_err(|_| anyhow!("Operation store lock poisoned"))?;
        if operations.iter().any(|existing| existing.id == operation.id) {
            return Err(anyhow!("Operation {} already exists", operation.id));
        }
        debug!("Storing operation {}", operation.id);
        operations.push(operation);
        Ok(())
    }

    fn remove(&self, operation_id: &str) -> Result<bool> {
        let mut operations = self
            .operations
            .write()
            .map_err(|_| anyhow!("Operation store lock poisoned"))?;
        let before = operations.len();
        operations.retain(|operation| operation.id != operation_id);
        Ok(operations.len() != before)
    }

    fn add_all(&self, batch: &[OperationComptable]) -> Result<()> {
        let mut operations = self
            .operations
            .write()
            .map_err(|_| anyhow!("Operation store lock poisoned"))?;
        {
            let mut known_ids: HashSet<&str> = operations.iter().map(|operation| operation.id.as_str()).collect();
            for operation in batch {
                if !known_ids.insert(operation.id.as_str()) {
                    return Err(anyhow!("Operation {} already exists", operation.id));
                }
            }
        }
        debug!("Storing {} operations", batch.len());
        operations.extend(batch.iter().cloned());
        Ok(())
    }
}
