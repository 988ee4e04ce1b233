//! # Stock Mutator
//!
//! The only code path that changes an on-hand quantity.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply(conn, delta)          (caller holds the key lock + write tx)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ensure_level ── create the line at 0 on first touch                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  new = quantity + change                                               │
//! │       ├── new < 0          → InsufficientStock                         │
//! │       ├── new < reserved   → InsufficientStock                         │
//! │       ▼                                                                 │
//! │  UPDATE stock_levels  (quantity, version + 1)                          │
//! │  INSERT stock_history (previous, new, change, reference, entry_seq)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both writes share the caller's transaction: either the level and its
//! history entry both land, or neither does.

use chrono::{DateTime, Utc};
use depot_core::{
    CoreError, Quantity, Reference, StockHistoryEntry, StockKey, ValidationError,
};
use sqlx::SqliteConnection;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::LedgerResult;
use crate::repository::stock;

/// A signed quantity change for one stock line, attributed to a document.
#[derive(Debug, Clone)]
pub struct StockDelta {
    pub key: StockKey,
    pub change: Quantity,
    pub reference: Reference,
    pub notes: Option<String>,
}

impl StockDelta {
    pub fn new(key: StockKey, change: Quantity, reference: Reference) -> Self {
        StockDelta {
            key,
            change,
            reference,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// Applies `delta` and appends its history entry.
pub async fn apply(
    conn: &mut SqliteConnection,
    delta: &StockDelta,
    actor: &str,
    now: DateTime<Utc>,
) -> LedgerResult<StockHistoryEntry> {
    if delta.change.is_zero() {
        return Err(ValidationError::InvalidFormat {
            field: "change_qty".to_string(),
            reason: "must not be zero".to_string(),
        }
        .into());
    }

    let level = stock::ensure_level(&mut *conn, &delta.key, now).await?;

    let new_qty = level
        .quantity
        .checked_add(delta.change)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        })?;

    if new_qty.is_negative() || new_qty < level.reserved_qty {
        warn!(
            key = %delta.key,
            on_hand = %level.quantity,
            reserved = %level.reserved_qty,
            change = %delta.change,
            reference = %delta.reference.code,
            "Stock change rejected"
        );
        return Err(CoreError::InsufficientStock {
            warehouse_id: delta.key.warehouse_id.clone(),
            product_id: delta.key.product_id.clone(),
            available: level.available(),
            requested: -delta.change,
        }
        .into());
    }

    let version = level.version + 1;
    stock::update_quantity(&mut *conn, &level.id, new_qty, version, actor, now).await?;

    let entry = StockHistoryEntry {
        id: Uuid::new_v4().to_string(),
        stock_level_id: level.id.clone(),
        entry_seq: version,
        warehouse_id: delta.key.warehouse_id.clone(),
        product_id: delta.key.product_id.clone(),
        previous_qty: level.quantity,
        new_qty,
        change_qty: delta.change,
        reference_type: delta.reference.kind,
        reference_id: delta.reference.id.clone(),
        reference_code: delta.reference.code.clone(),
        notes: delta.notes.clone(),
        actor: actor.to_string(),
        created_at: now,
    };
    stock::insert_history(&mut *conn, &entry).await?;

    debug!(
        key = %delta.key,
        previous = %entry.previous_qty,
        new = %entry.new_qty,
        change = %entry.change_qty,
        reference = %entry.reference_code,
        entry_seq = entry.entry_seq,
        "Stock change applied"
    );

    Ok(entry)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pool::{Database, DbConfig};
    use depot_core::ReferenceType;

    async fn setup() -> (Database, StockKey) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        let warehouse = catalog.create_warehouse("WH-A", "Alpha").await.unwrap();
        let product = catalog.create_product("SKU-1", "Widget", "pcs").await.unwrap();
        (db, StockKey::new(warehouse.id, product.id))
    }

    fn delta(key: &StockKey, units: i64, seq: u32) -> StockDelta {
        StockDelta::new(
            key.clone(),
            Quantity::from_units(units),
            Reference::new(
                ReferenceType::Adjustment,
                format!("doc-{seq}"),
                format!("ADJ-20260105-{seq:03}"),
            ),
        )
    }

    #[tokio::test]
    async fn test_apply_chains_history() {
        let (db, key) = setup().await;
        let mut tx = db.begin_write().await.unwrap();

        let first = apply(&mut tx, &delta(&key, 100, 1), "u-1", Utc::now()).await.unwrap();
        let second = apply(&mut tx, &delta(&key, -30, 2), "u-1", Utc::now()).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first.previous_qty, Quantity::ZERO);
        assert_eq!(first.new_qty, Quantity::from_units(100));
        assert_eq!(first.entry_seq, 1);
        assert_eq!(second.previous_qty, first.new_qty);
        assert_eq!(second.new_qty, Quantity::from_units(70));
        assert_eq!(second.change_qty, Quantity::from_units(-30));
        assert_eq!(second.entry_seq, 2);

        let mut conn = db.pool().acquire().await.unwrap();
        let level = stock::fetch_level(&mut conn, &key).await.unwrap().unwrap();
        assert_eq!(level.quantity, Quantity::from_units(70));
        assert_eq!(level.version, 2);
        assert_eq!(level.updated_by.as_deref(), Some("u-1"));
    }

    #[tokio::test]
    async fn test_negative_result_rejected() {
        let (db, key) = setup().await;
        let mut tx = db.begin_write().await.unwrap();

        apply(&mut tx, &delta(&key, 5, 1), "u-1", Utc::now()).await.unwrap();
        let err = apply(&mut tx, &delta(&key, -6, 2), "u-1", Utc::now())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        match err {
            crate::LedgerError::Domain(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, Quantity::from_units(5));
                assert_eq!(requested, Quantity::from_units(6));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_debit_below_reserved_rejected() {
        let (db, key) = setup().await;
        let mut tx = db.begin_write().await.unwrap();

        let now = Utc::now();
        apply(&mut tx, &delta(&key, 10, 1), "u-1", now).await.unwrap();
        let level = stock::fetch_level(&mut tx, &key).await.unwrap().unwrap();
        stock::update_reserved(&mut tx, &level.id, Quantity::from_units(8), "u-1", now)
            .await
            .unwrap();

        let err = apply(&mut tx, &delta(&key, -3, 2), "u-1", now)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert!(apply(&mut tx, &delta(&key, -2, 3), "u-1", now).await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_change_rejected() {
        let (db, key) = setup().await;
        let mut tx = db.begin_write().await.unwrap();
        let err = apply(&mut tx, &delta(&key, 0, 1), "u-1", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
