//! # depot-core: Pure Domain Logic for the Depot stock ledger
//!
//! This crate holds the types and rules of the ledger as pure functions with
//! zero I/O dependencies. Storage, locking and transactions live in `depot-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Depot Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Admin application (external caller)               │   │
//! │  │    receipts, sales, transfers, stock counts, reports            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ StockLedger operations                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               depot-db (workflows, mutator, SQLite)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ depot-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ quantity  │  │ documents │  │   code    │  │ validation│  │   │
//! │  │   │ Quantity  │  │ Mutation  │  │ IN-2026.. │  │   rules   │  │   │
//! │  │   │  Money    │  │  Opname   │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOCKS • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog, stock level, availability and history types
//! - [`documents`] - Inbound receipts, outbound sales, mutations, opnames
//! - [`quantity`] - Fixed-point `Quantity` (thousandths, no floating point)
//! - [`money`] - Integer-cent `Money`
//! - [`code`] - `PREFIX-YYYYMMDD-NNN` document codes
//! - [`ledger`] - Replaying history entries back into a quantity
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use depot_core::quantity::Quantity;
//! use depot_core::documents::{DifferenceType, Opname};
//!
//! let system = Quantity::from_units(50);
//! let physical = Quantity::from_units(42);
//!
//! let (difference, kind) = Opname::difference(system, physical);
//! assert_eq!(difference, Quantity::from_units(8));
//! assert_eq!(kind, DifferenceType::Shortage);
//! ```

pub mod code;
pub mod documents;
pub mod error;
pub mod ledger;
pub mod money;
pub mod quantity;
pub mod types;
pub mod validation;

pub use code::{DocumentCode, DocumentKind};
pub use documents::*;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::Quantity;
pub use types::*;

/// Maximum length of free-text notes on documents and history entries.
pub const MAX_NOTES_LEN: usize = 1000;

/// Maximum length of an attachment reference on an outbound sale.
pub const MAX_ATTACHMENT_LEN: usize = 255;
