//! Export service domain logic for the inventory ledger.
//!
//! This module builds portable accounting snapshots for a period and writes
//! them out, either as the JSON document that `ImportService` reads back or as
//! a human-readable CSV report. Choosing a destination in a UI is a
//! presentation concern; this layer only resolves and writes paths.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info};
use shared::{ComptabiliteExport, OperationComptable, Period};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::accounting_service::{AccountingError, AccountingService};
use crate::backend::errors::ExchangeError;

/// Output format of an export file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Round-trippable snapshot, readable by the importer
    Json,
    /// Human-readable report, one row per operation
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Where an export ended up
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub file_path: PathBuf,
    pub operation_count: usize,
    pub format: ExportFormat,
}

/// Export service that handles all export-related business logic
#[derive(Debug, Clone)]
pub struct ExportService {
    accounting: AccountingService,
    /// Fallback directory when the caller does not pick one
    export_directory: Option<PathBuf>,
}

impl ExportService {
    pub fn new(accounting: AccountingService, export_directory: Option<PathBuf>) -> Self {
        Self {
            accounting,
            export_directory,
        }
    }

    /// Build a snapshot of `operations` for `period`, stamped with the current time
    pub fn build_export(
        &self,
        period: Period,
        operations: &[OperationComptable],
    ) -> Result<ComptabiliteExport, AccountingError> {
        self.build_export_at(period, operations, Utc::now())
    }

    /// Build a snapshot with an explicit export timestamp.
    ///
    /// `operations` are copied as given; filtering to the period is the
    /// caller's job.
    pub fn build_export_at(
        &self,
        period: Period,
        operations: &[OperationComptable],
        date_export: DateTime<Utc>,
    ) -> Result<ComptabiliteExport, AccountingError> {
        let bounds = self.accounting.zone().instant_bounds(period)?;
        let summary = self.accounting.summarize(operations)?;

        Ok(ComptabiliteExport {
            date_export,
            periode_debut: bounds.map(|(start, _)| start),
            periode_fin: bounds.map(|(_, end)| end),
            total_revenus: summary.total_revenus,
            total_depenses: summary.total_depenses,
            benefice_net: summary.benefice_net,
            operations: operations.to_vec(),
        })
    }

    /// Serialize a snapshot as pretty JSON with keys sorted at every level
    pub fn to_json(&self, export: &ComptabiliteExport) -> serde_json::Result<String> {
        // serde_json's Map is ordered by key, so going through Value sorts the output
        let value = serde_json::to_value(export)?;
        serde_json::to_string_pretty(&value)
    }

    /// Render a snapshot as a CSV report, most recent operation first
    pub fn to_csv(&self, export: &ComptabiliteExport) -> Result<String> {
        let mut csv_writer = ::csv::Writer::from_writer(Vec::new());
        csv_writer.write_record(["id", "date", "type", "polarity", "montant", "materiel", "personne"])?;

        for operation in sorted_for_presentation(&export.operations) {
            let date = operation.date.to_rfc3339();
            let polarity = operation.polarity().to_string();
            let montant = format!("{:.2}", operation.montant);
            csv_writer.write_record([
                operation.id.as_str(),
                date.as_str(),
                operation.type_operation.label(),
                polarity.as_str(),
                montant.as_str(),
                operation.materiel_nom.as_deref().unwrap_or(""),
                operation.personne_nom.as_deref().unwrap_or(""),
            ])?;
        }

        let bytes = csv_writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish CSV report: {}", e.error()))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Write a snapshot as JSON to `path`
    pub fn write_export(&self, export: &ComptabiliteExport, path: &Path) -> Result<(), ExchangeError> {
        let json = self
            .to_json(export)
            .map_err(|e| ExchangeError::Write {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            })?;
        write_atomically(path, json.as_bytes())
    }

    /// Write a snapshot in the given format to `path`
    pub fn write_export_as(
        &self,
        export: &ComptabiliteExport,
        path: &Path,
        format: ExportFormat,
    ) -> Result<(), ExchangeError> {
        match format {
            ExportFormat::Json => self.write_export(export, path),
            ExportFormat::Csv => {
                let report = self.to_csv(export).map_err(|e| ExchangeError::Write {
                    path: path.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::InvalidData, e.to_string()),
                })?;
                write_atomically(path, report.as_bytes())
            }
        }
    }

    /// Export the operations of a period into a directory, with complete orchestration
    ///
    /// The directory is the caller's choice when given, else the configured
    /// export directory, else the user's Documents (or home) folder.
    pub fn export_to_directory(
        &self,
        period: Period,
        operations: &[OperationComptable],
        custom_directory: Option<&str>,
        format: ExportFormat,
    ) -> Result<ExportReport, ExchangeError> {
        info!("📁 EXPORT: Exporting {} ({:?}) - custom directory: {:?}", period, format, custom_directory);

        let in_period = self.accounting.operations_for_period(operations, period)?;
        let export = self.build_export(period, &in_period)?;

        let export_dir = self.resolve_directory(custom_directory).ok_or_else(|| {
            error!("❌ EXPORT: Could not determine default export directory");
            ExchangeError::Write {
                path: PathBuf::new(),
                source: io::Error::new(io::ErrorKind::NotFound, "no export directory available"),
            }
        })?;

        if let Err(e) = fs::create_dir_all(&export_dir) {
            error!("❌ EXPORT: Failed to create export directory {:?}: {}", export_dir, e);
            return Err(ExchangeError::Write { path: export_dir, source: e });
        }

        let today = self.accounting.zone().today();
        let file_path = export_dir.join(default_file_name(period, format, today));
        self.write_export_as(&export, &file_path, format)?;

        info!(
            "✅ EXPORT: Wrote {} operations to {}",
            export.operations.len(),
            file_path.display()
        );
        Ok(ExportReport {
            file_path,
            operation_count: export.operations.len(),
            format,
        })
    }

    fn resolve_directory(&self, custom_directory: Option<&str>) -> Option<PathBuf> {
        match custom_directory {
            Some(custom) if !custom.trim().is_empty() => Some(PathBuf::from(sanitize_path(custom))),
            _ => self
                .export_directory
                .clone()
                .or_else(dirs::document_dir)
                .or_else(dirs::home_dir),
        }
    }
}

/// Stable sort by descending date; operations with equal dates keep their order
pub fn sorted_for_presentation(operations: &[OperationComptable]) -> Vec<OperationComptable> {
    let mut sorted = operations.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

/// File name of an export, e.g. `comptabilite_2024-02_20240315.json`
pub fn default_file_name(period: Period, format: ExportFormat, today: NaiveDate) -> String {
    format!(
        "comptabilite_{}_{}.{}",
        period.slug(),
        today.format("%Y%m%d"),
        format.extension()
    )
}

/// Basic path sanitization to handle common user input issues
pub fn sanitize_path(path: &str) -> String {
    let mut cleaned = path.trim().to_string();

    // Remove surrounding quotes (single or double)
    if cleaned.len() >= 2
        && ((cleaned.starts_with('"') && cleaned.ends_with('"'))
            || (cleaned.starts_with('\'') && cleaned.ends_with('\'')))
    {
        cleaned = cleaned[1..cleaned.len() - 1].trim().to_string();
    }

    // Handle escaped spaces (common on some systems)
    cleaned = cleaned.replace("\\ ", " ");

    while cleaned.len() > 1 && (cleaned.ends_with('/') || cleaned.ends_with('\\')) {
        cleaned.pop();
    }

    // Handle tilde expansion for home directory
    if cleaned == "~" || cleaned.starts_with("~/") || cleaned.starts_with("~\\") {
        if let Some(home) = dirs::home_dir() {
            cleaned = if cleaned == "~" {
                home.to_string_lossy().to_string()
            } else {
                home.join(&cleaned[2..]).to_string_lossy().to_string()
            };
        }
    }

    cleaned
}

/// Write to a temporary sibling file, then move it into place
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), ExchangeError> {
    let temp_path = path.with_extension("tmp");
    let to_write_error = |source: io::Error| ExchangeError::Write {
        path: path.to_path_buf(),
        source,
    };

    let written = fs::File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&temp_path, path));

    if let Err(e) = written {
        error!("❌ EXPORT: Failed to write export file to {:?}: {}", path, e);
        let _ = fs::remove_file(&temp_path);
        return Err(to_write_error(e));
    }
    Ok(())
}
