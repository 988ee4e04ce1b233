//! # Ledger Workflows
//!
//! [`StockLedger`] is the entry point callers use: one method per document
//! operation, each running as a single unit of work.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. validate input shape              (no lock, no connection)         │
//! │  2. acquire stock line locks          (sorted, bounded by timeout)     │
//! │  3. BEGIN IMMEDIATE                                                    │
//! │  4. existence / state / availability checks (re-read under the lock)  │
//! │  5. allocate document code                                             │
//! │  6. insert / update document                                           │
//! │  7. stock mutator (level + history)                                    │
//! │  8. COMMIT, then release locks                                         │
//! │                                                                         │
//! │  Any error between 3 and 8 drops the transaction: full rollback.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//! - [`StockLedger::receive_inbound`] / [`StockLedger::sell_outbound`]
//! - [`StockLedger::send_mutation`] / [`StockLedger::receive_mutation`] /
//!   [`StockLedger::reject_mutation`]
//! - [`StockLedger::create_opname`] / [`StockLedger::approve_opname`]
//! - [`StockLedger::reserve`] / [`StockLedger::release`]
//! - read side in [`query`]

mod inbound;
mod mutation;
mod opname;
mod outbound;
pub mod query;
mod reservation;

use chrono::{DateTime, Utc};
use depot_core::validation::validate_actor;
use depot_core::{DocumentKind, StockKey};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CodePrefixes;
use crate::error::LedgerResult;
use crate::locks::{StockGuard, StockLocks};
use crate::pool::Database;
use crate::repository::sequence;

/// Runtime knobs for the ledger.
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// How long a workflow waits for its stock line locks.
    pub lock_timeout: Duration,
    pub prefixes: CodePrefixes,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            lock_timeout: Duration::from_secs(10),
            prefixes: CodePrefixes::default(),
        }
    }
}

/// The stock ledger engine.
///
/// Cheap to clone; clones share the pool and the lock table. Every process
/// writing to the same database file should go through a single
/// `StockLedger` (and its clones) so the per-line locks are actually shared.
#[derive(Debug, Clone)]
pub struct StockLedger {
    db: Database,
    locks: Arc<StockLocks>,
    settings: Arc<LedgerSettings>,
}

impl StockLedger {
    pub fn new(db: Database, settings: LedgerSettings) -> Self {
        StockLedger {
            db,
            locks: Arc::new(StockLocks::new()),
            settings: Arc::new(settings),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    async fn lock(&self, keys: impl IntoIterator<Item = StockKey>) -> LedgerResult<StockGuard> {
        self.locks.acquire(keys, self.settings.lock_timeout).await
    }

    async fn begin(&self) -> LedgerResult<Transaction<'static, Sqlite>> {
        Ok(self.db.begin_write().await?)
    }

    async fn next_code(
        &self,
        conn: &mut SqliteConnection,
        kind: DocumentKind,
        now: DateTime<Utc>,
    ) -> LedgerResult<String> {
        let prefix = self.settings.prefixes.prefix(kind);
        let code = sequence::next_code(conn, prefix, now.date_naive()).await?;
        Ok(code.to_string())
    }
}

fn check_actor(actor: &str) -> LedgerResult<()> {
    validate_actor(actor)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;

    #[tokio::test]
    async fn test_codes_use_configured_prefix() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = LedgerSettings {
            prefixes: CodePrefixes {
                opname: "SO".to_string(),
                ..CodePrefixes::default()
            },
            ..LedgerSettings::default()
        };
        let ledger = StockLedger::new(db, settings);

        let mut tx = ledger.begin().await.unwrap();
        let now = Utc::now();
        let first = ledger.next_code(&mut tx, DocumentKind::Opname, now).await.unwrap();
        let second = ledger.next_code(&mut tx, DocumentKind::Inbound, now).await.unwrap();
        tx.commit().await.unwrap();

        let day = now.format("%Y%m%d");
        assert_eq!(first, format!("SO-{day}-001"));
        assert_eq!(second, format!("IN-{day}-001"));
    }

    #[test]
    fn test_blank_actor_rejected() {
        assert!(check_actor("").is_err());
        assert!(check_actor("admin").is_ok());
    }
}
