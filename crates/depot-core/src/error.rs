//! # Error Types
//!
//! Domain-specific error types for depot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  depot-core errors (this file)                                         │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input shape/range failures                     │
//! │                                                                         │
//! │  depot-db errors (separate crate)                                      │
//! │  ├── DbError          - Storage failures                               │
//! │  └── LedgerError      - What workflows return (Domain | Storage |      │
//! │                         ConcurrencyConflict)                           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use thiserror::Error;

use crate::quantity::Quantity;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger domain errors.
///
/// Every variant is a typed result the caller decides how to present;
/// none of them is ever swallowed inside a workflow.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity (warehouse, product, supplier, customer, document)
    /// does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Not enough available stock to take the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Outbound sale (qty: 6)
    ///      │
    ///      ▼
    /// Check stock under lock: available=4
    ///      │
    ///      ▼
    /// InsufficientStock { available: 4, requested: 6 }
    ///      │
    ///      ▼
    /// UI shows: "Only 4 available, 6 requested"
    /// ```
    #[error(
        "Insufficient stock for product {product_id} in warehouse {warehouse_id}: \
         available {available}, requested {requested}"
    )]
    InsufficientStock {
        warehouse_id: String,
        product_id: String,
        available: Quantity,
        requested: Quantity,
    },

    /// A mutation was requested from a warehouse to itself.
    #[error("Source and destination warehouse must differ")]
    SameWarehouse,

    /// Received plus damaged exceeds what was sent.
    #[error("Received {received} + damaged {damaged} exceeds sent quantity {sent}")]
    OverReceipt {
        sent: Quantity,
        received: Quantity,
        damaged: Quantity,
    },

    /// Illegal state transition (receiving a completed mutation,
    /// approving an approved opname, ...).
    #[error("{document} {id} is {current}, cannot perform operation")]
    InvalidState {
        document: String,
        id: String,
        current: String,
    },

    /// An opname for the same warehouse, product and date already exists.
    #[error("Opname already exists for product {product_id} in warehouse {warehouse_id} on {date}")]
    DuplicateOpname {
        warehouse_id: String,
        product_id: String,
        date: NaiveDate,
    },

    /// Releasing more than is currently reserved.
    #[error("Cannot release {requested}: only {reserved} reserved")]
    ReservationExceeded {
        reserved: Quantity,
        requested: Quantity,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidState error.
    pub fn invalid_state(
        document: impl Into<String>,
        id: impl Into<String>,
        current: impl std::fmt::Display,
    ) -> Self {
        CoreError::InvalidState {
            document: document.into(),
            id: id.into(),
            current: current.to_string(),
        }
    }

    /// True for errors caused by bad caller input rather than ledger state.
    ///
    /// `SameWarehouse` and `OverReceipt` are reported as their own variants
    /// but belong to the validation class.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::SameWarehouse | CoreError::OverReceipt { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised eagerly, before a workflow takes any lock or touches storage.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or positive.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (invalid UUID, invalid date, invalid code...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            warehouse_id: "wh-a".to_string(),
            product_id: "p-1".to_string(),
            available: Quantity::from_units(4),
            requested: Quantity::from_units(6),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1 in warehouse wh-a: available 4, requested 6"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "warehouse_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(core_err.is_validation());
    }

    #[test]
    fn test_validation_class() {
        assert!(CoreError::SameWarehouse.is_validation());
        assert!(!CoreError::not_found("Warehouse", "x").is_validation());
        assert!(!CoreError::invalid_state("Mutation", "m-1", "completed").is_validation());
    }

    #[test]
    fn test_invalid_state_message() {
        let err = CoreError::invalid_state("Mutation", "m-1", "completed");
        assert_eq!(
            err.to_string(),
            "Mutation m-1 is completed, cannot perform operation"
        );
    }
}
