//! # Stock Repository
//!
//! Stock level rows and the append-only history table.
//!
//! Only the stock mutator and the reservation workflow write through here.

use chrono::{DateTime, Utc};
use depot_core::{Quantity, ReferenceType, StockHistoryEntry, StockKey, StockLevel};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::DbResult;

const LEVEL_COLUMNS: &str =
    "id, warehouse_id, product_id, quantity, reserved_qty, version, last_updated, updated_by";

const HISTORY_COLUMNS: &str = "id, stock_level_id, entry_seq, warehouse_id, product_id, \
     previous_qty, new_qty, change_qty, reference_type, reference_id, reference_code, \
     notes, actor, created_at";

// =============================================================================
// Stock Levels
// =============================================================================

pub async fn fetch_level(conn: &mut SqliteConnection, key: &StockKey) -> DbResult<Option<StockLevel>> {
    let sql = format!(
        "SELECT {LEVEL_COLUMNS} FROM stock_levels WHERE warehouse_id = ?1 AND product_id = ?2"
    );
    let level = sqlx::query_as::<_, StockLevel>(&sql)
        .bind(&key.warehouse_id)
        .bind(&key.product_id)
        .fetch_optional(conn)
        .await?;

    Ok(level)
}

/// Returns the line for `key`, creating it at zero on first touch.
pub async fn ensure_level(
    conn: &mut SqliteConnection,
    key: &StockKey,
    now: DateTime<Utc>,
) -> DbResult<StockLevel> {
    sqlx::query(
        r#"
        INSERT INTO stock_levels (id, warehouse_id, product_id, quantity, reserved_qty, version, last_updated)
        VALUES (?1, ?2, ?3, 0, 0, 0, ?4)
        ON CONFLICT (warehouse_id, product_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&key.warehouse_id)
    .bind(&key.product_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let sql = format!(
        "SELECT {LEVEL_COLUMNS} FROM stock_levels WHERE warehouse_id = ?1 AND product_id = ?2"
    );
    let level = sqlx::query_as::<_, StockLevel>(&sql)
        .bind(&key.warehouse_id)
        .bind(&key.product_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(level)
}

/// Writes a new on-hand quantity and bumps the line version.
pub async fn update_quantity(
    conn: &mut SqliteConnection,
    level_id: &str,
    quantity: Quantity,
    version: i64,
    actor: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE stock_levels
        SET quantity = ?2, version = ?3, last_updated = ?4, updated_by = ?5
        WHERE id = ?1
        "#,
    )
    .bind(level_id)
    .bind(quantity)
    .bind(version)
    .bind(now)
    .bind(actor)
    .execute(conn)
    .await?;

    Ok(())
}

/// Writes a new reserved quantity. On-hand and version are untouched.
pub async fn update_reserved(
    conn: &mut SqliteConnection,
    level_id: &str,
    reserved: Quantity,
    actor: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE stock_levels
        SET reserved_qty = ?2, last_updated = ?3, updated_by = ?4
        WHERE id = ?1
        "#,
    )
    .bind(level_id)
    .bind(reserved)
    .bind(now)
    .bind(actor)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn list_levels_for_warehouse(
    conn: &mut SqliteConnection,
    warehouse_id: &str,
) -> DbResult<Vec<StockLevel>> {
    let sql = format!(
        "SELECT {LEVEL_COLUMNS} FROM stock_levels WHERE warehouse_id = ?1 ORDER BY product_id"
    );
    let levels = sqlx::query_as::<_, StockLevel>(&sql)
        .bind(warehouse_id)
        .fetch_all(conn)
        .await?;

    Ok(levels)
}

// =============================================================================
// History
// =============================================================================

pub async fn insert_history(conn: &mut SqliteConnection, entry: &StockHistoryEntry) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_history (
            id, stock_level_id, entry_seq, warehouse_id, product_id,
            previous_qty, new_qty, change_qty,
            reference_type, reference_id, reference_code,
            notes, actor, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.stock_level_id)
    .bind(entry.entry_seq)
    .bind(&entry.warehouse_id)
    .bind(&entry.product_id)
    .bind(entry.previous_qty)
    .bind(entry.new_qty)
    .bind(entry.change_qty)
    .bind(entry.reference_type)
    .bind(&entry.reference_id)
    .bind(&entry.reference_code)
    .bind(&entry.notes)
    .bind(&entry.actor)
    .bind(entry.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Every entry of one stock line, oldest first.
pub async fn history_for_line(
    conn: &mut SqliteConnection,
    key: &StockKey,
) -> DbResult<Vec<StockHistoryEntry>> {
    let sql = format!(
        "SELECT {HISTORY_COLUMNS} FROM stock_history \
         WHERE warehouse_id = ?1 AND product_id = ?2 ORDER BY entry_seq"
    );
    let entries = sqlx::query_as::<_, StockHistoryEntry>(&sql)
        .bind(&key.warehouse_id)
        .bind(&key.product_id)
        .fetch_all(conn)
        .await?;

    Ok(entries)
}

/// Entries written by one document, in write order.
pub async fn history_for_reference(
    conn: &mut SqliteConnection,
    reference_type: ReferenceType,
    reference_id: &str,
) -> DbResult<Vec<StockHistoryEntry>> {
    let sql = format!(
        "SELECT {HISTORY_COLUMNS} FROM stock_history \
         WHERE reference_type = ?1 AND reference_id = ?2 ORDER BY rowid"
    );
    let entries = sqlx::query_as::<_, StockHistoryEntry>(&sql)
        .bind(reference_type)
        .bind(reference_id)
        .fetch_all(conn)
        .await?;

    Ok(entries)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn line(db: &Database) -> StockKey {
        let catalog = db.catalog();
        let warehouse = catalog.create_warehouse("WH-A", "Alpha").await.unwrap();
        let product = catalog.create_product("SKU-1", "Widget", "pcs").await.unwrap();
        StockKey::new(warehouse.id, product.id)
    }

    #[tokio::test]
    async fn test_ensure_level_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let key = line(&db).await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(fetch_level(&mut conn, &key).await.unwrap().is_none());

        let first = ensure_level(&mut conn, &key, Utc::now()).await.unwrap();
        let second = ensure_level(&mut conn, &key, Utc::now()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(first.quantity.is_zero());
        assert_eq!(first.version, 0);
    }

    #[tokio::test]
    async fn test_negative_quantity_rejected_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let key = line(&db).await;
        let mut conn = db.pool().acquire().await.unwrap();
        let level = ensure_level(&mut conn, &key, Utc::now()).await.unwrap();

        let result = update_quantity(
            &mut conn,
            &level.id,
            Quantity::from_units(-1),
            1,
            "u-1",
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(crate::DbError::CheckViolation { .. })));
    }

    #[tokio::test]
    async fn test_reserved_above_quantity_rejected_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let key = line(&db).await;
        let mut conn = db.pool().acquire().await.unwrap();
        let level = ensure_level(&mut conn, &key, Utc::now()).await.unwrap();

        let result =
            update_reserved(&mut conn, &level.id, Quantity::from_units(1), "u-1", Utc::now()).await;
        assert!(result.is_err());
    }
}
