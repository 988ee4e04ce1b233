//! # Repository Module
//!
//! SQL for the ledger, grouped by table.
//!
//! ## Two Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CatalogRepository (struct over the pool)                              │
//! │    db.catalog().create_warehouse("JKT-01", "Jakarta")                  │
//! │    Standalone reads and inserts, no ledger effect.                     │
//! │                                                                         │
//! │  Ledger repositories (free functions over &mut SqliteConnection)       │
//! │    stock::ensure_level(&mut *tx, &key, now)                            │
//! │    inbound::insert(&mut *tx, &receipt)                                 │
//! │    Composed by workflows inside one BEGIN IMMEDIATE transaction;       │
//! │    they never begin or commit on their own.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog`] - Warehouses, products, suppliers, customers
//! - [`stock`] - Stock levels and history entries
//! - [`sequence`] - Per-prefix, per-day document code counters
//! - [`inbound`] / [`outbound`] - Receipt and sale documents
//! - [`mutation`] - Inter-warehouse transfers
//! - [`opname`] - Physical counts

pub mod catalog;
pub mod inbound;
pub mod mutation;
pub mod opname;
pub mod outbound;
pub mod sequence;
pub mod stock;
