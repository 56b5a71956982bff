//! Import service domain logic for the inventory ledger.
//!
//! Importing happens in three steps that fail independently:
//!
//! 1. **Read** the export file (`ExchangeError::Access`, retryable)
//! 2. **Parse** the whole document (`ExchangeError::Parse`, nothing accepted)
//! 3. **Merge** against the operations already stored, rejecting duplicate ids
//!
//! The totals carried by an imported snapshot are informational and are never
//! trusted; callers recompute them from the accepted operations.

use log::{debug, error, info, warn};
use shared::{ComptabiliteExport, ImportSummary, OperationComptable};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::backend::errors::ExchangeError;
use crate::backend::storage::OperationStore;

/// Import service that handles reading and reconciling export snapshots
#[derive(Debug, Clone, Default)]
pub struct ImportService {}

impl ImportService {
    pub fn new() -> Self {
        Self {}
    }

    /// Decode an export document.
    ///
    /// Fails as a whole on malformed JSON, missing fields, undecodable dates,
    /// unknown operation kinds or invalid operations.
    pub fn parse_export(&self, bytes: &[u8]) -> Result<ComptabiliteExport, ExchangeError> {
        let export: ComptabiliteExport = serde_json::from_slice(bytes).map_err(|e| {
            warn!("⚠️ IMPORT: Rejected export document: {}", e);
            ExchangeError::from(e)
        })?;

        for operation in &export.operations {
            operation
                .validate()
                .map_err(|e| ExchangeError::parse(e.to_string()))?;
        }

        debug!("IMPORT: Parsed export with {} operations", export.operations.len());
        Ok(export)
    }

    /// Read and decode an export file
    pub fn read_export(&self, path: &Path) -> Result<ComptabiliteExport, ExchangeError> {
        let bytes = fs::read(path).map_err(|source| {
            error!("❌ IMPORT: Could not read {}: {}", path.display(), source);
            ExchangeError::Access {
                path: path.to_path_buf(),
                source,
            }
        })?;
        self.parse_export(&bytes)
    }

    /// Split the snapshot's operations into accepted ones and duplicates.
    ///
    /// An operation is a duplicate when its id is already in `existing` or was
    /// accepted earlier in the same snapshot. Accepted operations keep their
    /// input order.
    pub fn merge_import(
        &self,
        export: &ComptabiliteExport,
        existing: &[OperationComptable],
    ) -> ImportSummary {
        let mut known_ids: HashSet<&str> = existing.iter().map(|operation| operation.id.as_str()).collect();
        let mut summary = ImportSummary::default();

        for operation in &export.operations {
            if known_ids.insert(operation.id.as_str()) {
                summary.accepted.push(operation.clone());
            } else {
                debug!("IMPORT: Skipping duplicate operation {}", operation.id);
                summary.duplicate_count += 1;
            }
        }

        info!(
            "📥 IMPORT: {} operations accepted, {} duplicates skipped",
            summary.accepted.len(),
            summary.duplicate_count
        );
        summary
    }

    /// Import an export file into a store with complete orchestration.
    ///
    /// The accepted operations are handed to the store as one batch; if the
    /// store fails, none of them are kept.
    pub fn import_into_store(
        &self,
        path: &Path,
        store: &dyn OperationStore,
    ) -> Result<ImportSummary, ExchangeError> {
        info!("📥 IMPORT: Importing operations from {}", path.display());

        let export = self.read_export(path)?;
        let existing = store.list().map_err(ExchangeError::Store)?;
        let summary = self.merge_import(&export, &existing);

        if let Err(e) = store.add_all(&summary.accepted) {
            error!("❌ IMPORT: Failed to store imported operations: {}", e);
            return Err(ExchangeError::Store(e));
        }

        info!(
            "✅ IMPORT: Stored {} new operations from {}",
            summary.accepted.len(),
            path.display()
        );
        Ok(summary)
    }
}
