//! # depot-db: Ledger Engine for Depot
//!
//! Owns every write to the stock ledger. Documents come in through
//! [`StockLedger`]; quantities and history come out.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Depot Data Flow                                  │
//! │                                                                         │
//! │  Admin application (inbound form, sale form, transfer, count)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     depot-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  StockLedger  │    │ StockLocks    │    │  Mutator     │  │   │
//! │  │   │  (workflow/)  │───►│ (locks.rs)    │    │ (mutator.rs) │  │   │
//! │  │   │               │    └───────────────┘    │              │  │   │
//! │  │   │ receive/sell  │                         │ level + one  │  │   │
//! │  │   │ send/receive  │────────────────────────►│ history row  │  │   │
//! │  │   │ count/approve │                         └──────┬───────┘  │   │
//! │  │   └───────┬───────┘                                │          │   │
//! │  │           ▼                                        ▼          │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │◄───│ Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   stock_levels · stock_history (append-only) · documents       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`config`] - `depot.toml` + `DEPOT_*` environment overrides
//! - [`error`] - Storage and workflow error types
//! - [`locks`] - Per stock line async locks
//! - [`repository`] - Row-level access to catalog, stock and document tables
//! - [`mutator`] - The single path that changes on-hand quantity
//! - [`availability`] - `quantity - reserved` checks
//! - [`workflow`] - [`StockLedger`], one method per document operation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use depot_db::{Database, LedgerConfig, StockLedger};
//!
//! let config = LedgerConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//! let ledger = StockLedger::new(db, config.ledger_settings());
//!
//! let posting = ledger.receive_inbound("admin", input).await?;
//! println!("{} -> {}", posting.document.code, posting.entries[0].new_qty);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod config;
pub mod error;
pub mod locks;
pub mod migrations;
pub mod mutator;
pub mod pool;
pub mod repository;
pub mod workflow;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, LedgerConfig};
pub use error::{DbError, DbResult, ErrorKind, LedgerError, LedgerResult};
pub use locks::StockLocks;
pub use pool::{Database, DbConfig};
pub use workflow::{LedgerSettings, StockLedger};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
