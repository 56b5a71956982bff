//! # Backend Module
//!
//! Contains all non-UI logic of the inventory ledger's accounting.
//!
//! ## Architecture
//!
//! ```text
//! Application (views, purchase flows)
//!     ↓
//! Domain Layer (accounting, export, import, feature gate)
//!     ↓
//! Storage Layer (OperationStore implementations)
//! ```
//!
//! The store and the entitlement oracle are passed in explicitly; nothing in
//! this crate keeps process-wide state.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod storage;

use anyhow::Result;
use log::info;
use shared::{ImportSummary, OperationComptable, Period};
use std::path::Path;
use std::sync::Arc;

pub use config::LedgerConfig;
pub use domain::*;
pub use errors::ExchangeError;
pub use storage::*;

/// Everything a caller needs to work with the ledger, wired from a config
#[derive(Clone)]
pub struct LedgerBackend {
    pub store: Arc<dyn OperationStore>,
    pub accounting_service: AccountingService,
    pub export_service: ExportService,
    pub import_service: ImportService,
    pub feature_gate: FeatureGate,
}

impl LedgerBackend {
    /// Wire services around an existing store and entitlement oracle
    pub fn new(
        config: &LedgerConfig,
        store: Arc<dyn OperationStore>,
        entitlement: Arc<dyn EntitlementOracle>,
    ) -> Result<Self> {
        let accounting_service = AccountingService::new(config.calendar_zone()?);
        let export_service = ExportService::new(accounting_service.clone(), config.export_directory.clone());

        Ok(Self {
            store,
            accounting_service,
            export_service,
            import_service: ImportService::new(),
            feature_gate: FeatureGate::new(entitlement, config.free_tier),
        })
    }

    /// Operations of a period, read from the store
    pub fn operations_for_period(&self, period: Period) -> Result<Vec<OperationComptable>> {
        let operations = self.store.list()?;
        Ok(self.accounting_service.operations_for_period(&operations, period)?)
    }

    /// Export a period from the store to a directory
    pub fn export_period(
        &self,
        period: Period,
        custom_directory: Option<&str>,
        format: ExportFormat,
    ) -> Result<ExportReport, ExchangeError> {
        let operations = self.store.list().map_err(ExchangeError::Store)?;
        self.export_service
            .export_to_directory(period, &operations, custom_directory, format)
    }

    /// Import an export file into the store
    pub fn import_file(&self, path: &Path) -> Result<ImportSummary, ExchangeError> {
        self.import_service.import_into_store(path, self.store.as_ref())
    }

    /// Delete an operation by id
    pub fn delete_operation(&self, operation_id: &str) -> Result<bool> {
        let removed = self.store.remove(operation_id)?;
        if removed {
            info!("🗑️ Deleted operation {}", operation_id);
        }
        Ok(removed)
    }
}

/// Initialize the backend with all required services, storing operations as
/// CSV in the configured data directory
pub fn initialize_backend(config: &LedgerConfig, entitlement: Arc<dyn EntitlementOracle>) -> Result<LedgerBackend> {
    logging::init_logging(config.log_level_filter()?);

    let data_directory = config.resolved_data_directory()?;
    info!("Setting up operation storage in {}", data_directory.display());
    let connection = CsvConnection::new(&data_directory)?;
    let store: Arc<dyn OperationStore> = Arc::new(CsvOperationStore::new(connection));

    info!("Setting up domain services");
    LedgerBackend::new(config, store, entitlement)
}
