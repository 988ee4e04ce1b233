//! # Error Types
//!
//! Storage errors and the error every ledger workflow returns.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← Adds context and categorization                             │
//! │       │                                                                 │
//! │       │      CoreError (depot-core)      lock timeout / SQLITE_BUSY    │
//! │       │            │                              │                     │
//! │       ▼            ▼                              ▼                     │
//! │  LedgerError::Storage  ::Domain          ::ConcurrencyConflict         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller matches on kind() and decides retry / message                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use depot_core::{CoreError, ValidationError};
use thiserror::Error;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate document code (should never happen, codes are allocated
    ///   inside the writing transaction)
    /// - Second opname for the same warehouse, product and date
    /// - Duplicate warehouse code or product SKU
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative quantity, reserved above
    /// on-hand). The stock mutator rejects these first; reaching SQLite
    /// means a write bypassed it.
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// SQLite write lock still held by another connection after the busy
    /// timeout.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

// SQLITE_BUSY, SQLITE_BUSY_SNAPSHOT, SQLITE_LOCKED
const BUSY_CODES: [&str; 3] = ["5", "517", "6"];

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze code/message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                let busy = db_err
                    .code()
                    .map(|code| BUSY_CODES.contains(&code.as_ref()))
                    .unwrap_or(false);

                if busy || msg.contains("database is locked") {
                    DbError::Busy(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    // "UNIQUE constraint failed: <table>.<column>"
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// LedgerError
// =============================================================================

/// What every ledger workflow returns.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Infrastructure failure. The transaction was rolled back.
    #[error(transparent)]
    Storage(DbError),

    /// The stock line lock (or SQLite's write lock) could not be obtained
    /// in time. Nothing was written; the whole workflow may be retried.
    #[error("Concurrency conflict on {resource} after {waited_ms}ms")]
    ConcurrencyConflict { resource: String, waited_ms: u64 },
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientStock,
    InvalidState,
    DuplicateOpname,
    ConcurrencyConflict,
    Storage,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Domain(err) => match err {
                CoreError::NotFound { .. } => ErrorKind::NotFound,
                CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
                CoreError::InvalidState { .. } => ErrorKind::InvalidState,
                CoreError::DuplicateOpname { .. } => ErrorKind::DuplicateOpname,
                CoreError::ReservationExceeded { .. } => ErrorKind::InvalidState,
                CoreError::Validation(_)
                | CoreError::SameWarehouse
                | CoreError::OverReceipt { .. } => ErrorKind::Validation,
            },
            LedgerError::Storage(_) => ErrorKind::Storage,
            LedgerError::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
        }
    }

    /// True when re-running the whole workflow may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::ConcurrencyConflict { .. } | LedgerError::Storage(DbError::PoolExhausted)
        )
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        LedgerError::Domain(CoreError::not_found(entity, id))
    }
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Busy(message) => LedgerError::ConcurrencyConflict {
                resource: format!("database ({message})"),
                waited_ms: 0,
            },
            DbError::NotFound { entity, id } => LedgerError::not_found(entity, id),
            other => LedgerError::Storage(other),
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::from(DbError::from(err))
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Domain(CoreError::Validation(err))
    }
}

/// Result type for ledger workflows and queries.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::Quantity;

    #[test]
    fn test_kind_mapping() {
        let err: LedgerError = CoreError::InsufficientStock {
            warehouse_id: "wh-a".to_string(),
            product_id: "p-1".to_string(),
            available: Quantity::from_units(4),
            requested: Quantity::from_units(6),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert!(!err.is_retryable());

        let err: LedgerError = CoreError::SameWarehouse.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_busy_is_concurrency_conflict() {
        let err: LedgerError = DbError::Busy("database is locked".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::ConcurrencyConflict);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_pool_exhausted_is_retryable_storage() {
        let err: LedgerError = DbError::PoolExhausted.into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_row_not_found_maps_to_domain() {
        let err: LedgerError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_validation_error_converts() {
        let err: LedgerError = ValidationError::Required {
            field: "actor".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Validation error: actor is required");
    }
}
