use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use ::csv::{Reader, StringRecord, Writer};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use shared::{OperationComptable, TypeOperation};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::str::FromStr;
use std::sync::Mutex;

use super::connection::{CsvConnection, OPERATIONS_HEADER};
use crate::backend::storage::traits::OperationStore;

/// CSV-based operation store
#[derive(Debug)]
pub struct CsvOperationStore {
    connection: CsvConnection,
    /// Serializes read-modify-write cycles on the operations file
    write_lock: Mutex<()>,
}

impl CsvOperationStore {
    /// Create a new CSV operation store
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            connection,
            write_lock: Mutex::new(()),
        }
    }

    pub fn connection(&self) -> &CsvConnection {
        &self.connection
    }

    /// Read all operations from the CSV file
    fn read_operations(&self) -> Result<Vec<OperationComptable>> {
        self.connection.ensure_operations_file_exists()?;

        let file_path = self.connection.operations_file_path();
        let file = File::open(&file_path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut operations = Vec::new();
        for (index, result) in csv_reader.records().enumerate() {
            let record = result?;
            // Line 1 is the header
            let operation = parse_record(&record)
                .with_context(|| format!("{} line {}", file_path.display(), index + 2))?;
            operations.push(operation);
        }

        Ok(operations)
    }

    /// Write all operations to the CSV file
    fn write_operations(&self, operations: &[OperationComptable]) -> Result<()> {
        let file_path = self.connection.operations_file_path();

        // Create a temporary file for atomic write
        let temp_path = file_path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;

            let mut csv_writer = Writer::from_writer(BufWriter::new(file));
            csv_writer.write_record(OPERATIONS_HEADER)?;

            for operation in operations {
                let date = operation.date.to_rfc3339();
                let montant = operation.montant.to_string();
                csv_writer.write_record([
                    operation.id.as_str(),
                    date.as_str(),
                    operation.type_operation.code(),
                    montant.as_str(),
                    operation.materiel_nom.as_deref().unwrap_or(""),
                    operation.personne_nom.as_deref().unwrap_or(""),
                ])?;
            }

            csv_writer.flush()?;
        }

        // Atomic move from temp to final file
        std::fs::rename(&temp_path, &file_path)?;

        Ok(())
    }
}

fn parse_record(record: &StringRecord) -> Result<OperationComptable> {
    let field = |index: usize| record.get(index).unwrap_or("");
    let optional = |index: usize| Some(field(index)).filter(|value| !value.is_empty()).map(str::to_string);

    let id = field(0);
    if id.is_empty() {
        return Err(anyhow!("missing operation id"));
    }
    let date = DateTime::parse_from_rfc3339(field(1))
        .with_context(|| format!("invalid date '{}' for operation {}", field(1), id))?
        .with_timezone(&Utc);
    let type_operation = TypeOperation::from_code(field(2))
        .ok_or_else(|| anyhow!("unknown operation type '{}' for operation {}", field(2), id))?;
    let montant = Decimal::from_str(field(3))
        .with_context(|| format!("invalid amount '{}' for operation {}", field(3), id))?;

    let operation = OperationComptable {
        id: id.to_string(),
        date,
        type_operation,
        montant,
        materiel_nom: optional(4),
        personne_nom: optional(5),
    };
    operation
        .validate()
        .with_context(|| format!("invalid operation {}", id))?;
    Ok(operation)
}

impl OperationStore for CsvOperationStore {
    fn list(&self) -> Result<Vec<OperationComptable>> {
        self.read_operations()
    }

    fn add(&self, operation: OperationComptable) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("Operation store lock poisoned"))?;

        let mut operations = self.read_operations()?;
        if operations.iter().any(|existing| existing.id == operation.id) {
            warn!("⚠️ Refusing to store duplicate operation {}", operation.id);
            return Err(anyhow!("Operation {} already exists", operation.id));
        }

        debug!("💾 Storing operation {} ({})", operation.id, operation.type_operation.code());
        operations.push(operation);
        self.write_operations(&operations)
    }

    fn remove(&self, operation_id: &str) -> Result<bool> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("Operation store lock poisoned"))?;

        let mut operations = self.read_operations()?;
        let before = operations.len();
        operations.retain(|operation| operation.id != operation_id);

        if operations.len() == before {
            return Ok(false);
        }

        self.write_operations(&operations)?;
        info!("🗑️ Removed operation {}", operation_id);
        Ok(true)
    }

    /// Append a batch with a single rewrite of the file
    fn add_all(&self, batch: &[OperationComptable]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("Operation store lock poisoned"))?;

        let mut operations = self.read_operations()?;
        let mut known_ids: HashSet<String> = operations.iter().map(|operation| operation.id.clone()).collect();
        for operation in batch {
            if !known_ids.insert(operation.id.clone()) {
                warn!("⚠️ Refusing to store duplicate operation {}", operation.id);
                return Err(anyhow!("Operation {} already exists", operation.id));
            }
        }

        debug!("💾 Storing {} operations", batch.len());
        operations.extend(batch.iter().cloned());
        self.write_operations(&operations)
    }
}
