use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest amount a single operation may carry, in whole currency units
pub const MAX_MONTANT_UNITS: i64 = 1_000_000_000_000_000;

/// Decimal places kept for monetary amounts
pub const MONTANT_SCALE: u32 = 2;

/// Whether an operation adds money to the books or takes money out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Polarity {
    Revenue,
    Expense,
}

/// Closed set of accounting operation kinds.
///
/// Every kind carries a fixed polarity; amounts are stored as magnitudes and
/// the sign is derived from the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeOperation {
    /// Rental income received for lending out an item
    LocationRevenu,
    /// Deposit collected when lending out an item
    LocationCaution,
    /// Money spent repairing an item
    ReparationDepense,
    /// Money spent renting an item from someone else
    MaLocationDepense,
    /// Deposit lost on something we rented
    MaLocationCautionPerdue,
}

impl TypeOperation {
    pub const ALL: [TypeOperation; 5] = [
        TypeOperation::LocationRevenu,
        TypeOperation::LocationCaution,
        TypeOperation::ReparationDepense,
        TypeOperation::MaLocationDepense,
        TypeOperation::MaLocationCautionPerdue,
    ];

    pub fn polarity(self) -> Polarity {
        match self {
            TypeOperation::LocationRevenu | TypeOperation::LocationCaution => Polarity::Revenue,
            TypeOperation::ReparationDepense
            | TypeOperation::MaLocationDepense
            | TypeOperation::MaLocationCautionPerdue => Polarity::Expense,
        }
    }

    pub fn is_revenue(self) -> bool {
        self.polarity() == Polarity::Revenue
    }

    /// Stable identifier, identical to the serialized form
    pub fn code(self) -> &'static str {
        match self {
            TypeOperation::LocationRevenu => "locationRevenu",
            TypeOperation::LocationCaution => "locationCaution",
            TypeOperation::ReparationDepense => "reparationDepense",
            TypeOperation::MaLocationDepense => "maLocationDepense",
            TypeOperation::MaLocationCautionPerdue => "maLocationCautionPerdue",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Human-readable label used in reports
    pub fn label(self) -> &'static str {
        match self {
            TypeOperation::LocationRevenu => "Rental revenue",
            TypeOperation::LocationCaution => "Rental deposit",
            TypeOperation::ReparationDepense => "Repair expense",
            TypeOperation::MaLocationDepense => "Rental expense",
            TypeOperation::MaLocationCautionPerdue => "Lost deposit",
        }
    }
}

impl fmt::Display for TypeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Revenue => write!(f, "revenue"),
            Polarity::Expense => write!(f, "expense"),
        }
    }
}

/// A single dated financial event, optionally tied to an item and a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationComptable {
    /// Unique identifier, assigned at creation and never changed
    pub id: String,
    /// When the operation happened (UTC, RFC 3339 on the wire)
    pub date: DateTime<Utc>,
    pub type_operation: TypeOperation,
    /// Non-negative magnitude; the sign comes from `type_operation`
    pub montant: Decimal,
    /// Display label of the item involved (denormalized)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materiel_nom: Option<String>,
    /// Display label of the person involved (denormalized)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personne_nom: Option<String>,
}

impl OperationComptable {
    /// Create a new operation with a freshly generated id
    pub fn new(
        date: DateTime<Utc>,
        type_operation: TypeOperation,
        montant: Decimal,
    ) -> Result<Self, OperationValidationError> {
        let operation = Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            type_operation,
            montant,
            materiel_nom: None,
            personne_nom: None,
        };
        operation.validate()?;
        Ok(operation)
    }

    pub fn with_materiel(mut self, nom: impl Into<String>) -> Self {
        self.materiel_nom = Some(nom.into());
        self
    }

    pub fn with_personne(mut self, nom: impl Into<String>) -> Self {
        self.personne_nom = Some(nom.into());
        self
    }

    pub fn validate(&self) -> Result<(), OperationValidationError> {
        if self.id.trim().is_empty() {
            return Err(OperationValidationError::EmptyId);
        }
        if self.montant.is_sign_negative() && !self.montant.is_zero() {
            return Err(OperationValidationError::NegativeAmount {
                id: self.id.clone(),
                montant: self.montant,
            });
        }
        if self.montant > Decimal::from(MAX_MONTANT_UNITS) {
            return Err(OperationValidationError::AmountTooLarge {
                id: self.id.clone(),
                montant: self.montant,
            });
        }
        if self.montant.normalize().scale() > MONTANT_SCALE {
            return Err(OperationValidationError::TooPrecise {
                id: self.id.clone(),
                montant: self.montant,
            });
        }
        Ok(())
    }

    pub fn polarity(&self) -> Polarity {
        self.type_operation.polarity()
    }

    pub fn is_revenue(&self) -> bool {
        self.type_operation.is_revenue()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperationValidationError {
    #[error("Operation id cannot be empty")]
    EmptyId,
    #[error("Operation {id} has a negative amount ({montant})")]
    NegativeAmount { id: String, montant: Decimal },
    #[error("Operation {id} has an amount above the supported maximum ({montant})")]
    AmountTooLarge { id: String, montant: Decimal },
    #[error("Operation {id} has more than two decimal places ({montant})")]
    TooPrecise { id: String, montant: Decimal },
}

/// Portable snapshot of a set of operations with the totals computed at
/// export time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComptabiliteExport {
    pub date_export: DateTime<Utc>,
    /// First instant of the exported period, absent for a full export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periode_debut: Option<DateTime<Utc>>,
    /// Last instant of the exported period, absent for a full export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periode_fin: Option<DateTime<Utc>>,
    /// Informational only; never trusted on import
    pub total_revenus: Decimal,
    pub total_depenses: Decimal,
    pub benefice_net: Decimal,
    pub operations: Vec<OperationComptable>,
}

/// Period filter applied to operations before aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    Month { year: i32, month: u32 },
    Year(i32),
    Total,
}

impl Period {
    /// Short identifier used in export file names
    pub fn slug(&self) -> String {
        match self {
            Period::Month { year, month } => format!("{:04}-{:02}", year, month),
            Period::Year(year) => format!("{:04}", year),
            Period::Total => "total".to_string(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month { year, month } => write!(f, "{:02}/{:04}", month, year),
            Period::Year(year) => write!(f, "{}", year),
            Period::Total => write!(f, "total"),
        }
    }
}

/// Operations that happened on the same calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: NaiveDate,
    /// Most recent first
    pub operations: Vec<OperationComptable>,
}

/// Revenue, expense and net totals over a set of operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub total_revenus: Decimal,
    pub total_depenses: Decimal,
    pub benefice_net: Decimal,
    pub operation_count: usize,
}

/// Result of reconciling an export snapshot against existing operations
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportSummary {
    /// Operations to persist, in the order they appeared in the snapshot
    pub accepted: Vec<OperationComptable>,
    pub duplicate_count: usize,
}
