//! Accounting core of the inventory and lending tracker: period filtering,
//! revenue/expense totals, and de-duplicating export/import of operations.

pub mod backend;

pub use backend::{initialize_backend, LedgerBackend, LedgerConfig};
pub use shared::{
    ComptabiliteExport, DayGroup, ImportSummary, LedgerSummary, OperationComptable, Period, Polarity, TypeOperation,
};
