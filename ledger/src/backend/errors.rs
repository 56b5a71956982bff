//! Error types for moving accounting snapshots in and out of the ledger.

use std::path::PathBuf;

use crate::backend::domain::accounting_service::AccountingError;
use crate::backend::domain::period::PeriodError;

/// Failure of a single export or import.
///
/// Every variant leaves prior state untouched: nothing is accepted on a parse
/// failure and no partial file is left behind on a write failure.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The document is not a valid accounting export
    #[error("Invalid accounting export: {reason}")]
    Parse { reason: String },

    /// The export source could not be read
    #[error("Could not read {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export destination could not be written
    #[error("Could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested period does not exist on the calendar
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// A total of the exported operations is out of range
    #[error(transparent)]
    Accounting(AccountingError),

    /// The operation store rejected a read or write
    #[error("Operation store failure: {0}")]
    Store(#[source] anyhow::Error),
}

impl ExchangeError {
    pub fn parse(reason: impl Into<String>) -> Self {
        ExchangeError::Parse { reason: reason.into() }
    }

    /// Whether asking the user to pick the source again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExchangeError::Access { .. })
    }
}

impl From<AccountingError> for ExchangeError {
    fn from(error: AccountingError) -> Self {
        match error {
            AccountingError::Period(period) => ExchangeError::Period(period),
            other => ExchangeError::Accounting(other),
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(error: serde_json::Error) -> Self {
        ExchangeError::parse(error.to_string())
    }
}
