use anyhow::{anyhow, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

pub const OPERATIONS_FILE_NAME: &str = "operations.csv";
pub const OPERATIONS_HEADER: [&str; 6] = [
    "id",
    "date",
    "type_operation",
    "montant",
    "materiel_nom",
    "personne_nom",
];

/// CsvConnection manages the data directory and makes sure the operations
/// file exists with its header
#[derive(Debug, Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("📁 Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn operations_file_path(&self) -> PathBuf {
        self.base_directory.join(OPERATIONS_FILE_NAME)
    }

    /// Ensure the operations file exists with the CSV header
    pub fn ensure_operations_file_exists(&self) -> Result<()> {
        if !self.base_directory.exists() {
            fs::create_dir_all(&self.base_directory)?;
        }

        let file_path = self.operations_file_path();
        if !file_path.exists() {
            let header = format!("{}\n", OPERATIONS_HEADER.join(","));
            fs::write(&file_path, header)?;
        }

        Ok(())
    }
}

/// Default location of the ledger data
/// (~/Documents/Inventory Ledger, or ~/Inventory Ledger without a Documents folder)
pub fn default_data_directory() -> Result<PathBuf> {
    let parent = dirs::document_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(parent.join("Inventory Ledger"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let connection = CsvConnection::new(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(connection.operations_file_path(), nested.join("operations.csv"));
    }

    #[test]
    fn test_ensure_operations_file_writes_header_once() {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();

        connection.ensure_operations_file_exists().unwrap();
        fs::write(connection.operations_file_path(), "id,date,type_operation,montant,materiel_nom,personne_nom\nkeep\n").unwrap();
        connection.ensure_operations_file_exists().unwrap();

        let content = fs::read_to_string(connection.operations_file_path()).unwrap();
        assert!(content.ends_with("keep\n"));
    }
}
