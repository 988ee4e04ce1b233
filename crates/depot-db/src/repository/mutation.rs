//! # Stock Mutation Repository
//!
//! Status updates are guarded with `status = 'sent'` in the WHERE clause;
//! callers treat zero affected rows as an invalid transition.

use chrono::{DateTime, Utc};
use depot_core::{MutationStatus, Quantity, StockMutation};
use sqlx::SqliteConnection;

use crate::error::DbResult;

const COLUMNS: &str = "id, code, from_warehouse_id, to_warehouse_id, product_id, quantity, \
     received_qty, damaged_qty, status, notes, rejection_reason, sent_at, received_at, \
     rejected_at, created_by, received_by, rejected_by";

pub async fn insert(conn: &mut SqliteConnection, mutation: &StockMutation) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_mutations (
            id, code, from_warehouse_id, to_warehouse_id, product_id,
            quantity, received_qty, damaged_qty, status,
            notes, rejection_reason, sent_at, received_at, rejected_at,
            created_by, received_by, rejected_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
    )
    .bind(&mutation.id)
    .bind(&mutation.code)
    .bind(&mutation.from_warehouse_id)
    .bind(&mutation.to_warehouse_id)
    .bind(&mutation.product_id)
    .bind(mutation.quantity)
    .bind(mutation.received_qty)
    .bind(mutation.damaged_qty)
    .bind(mutation.status)
    .bind(&mutation.notes)
    .bind(&mutation.rejection_reason)
    .bind(mutation.sent_at)
    .bind(mutation.received_at)
    .bind(mutation.rejected_at)
    .bind(&mutation.created_by)
    .bind(&mutation.received_by)
    .bind(&mutation.rejected_by)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<StockMutation>> {
    let sql = format!("SELECT {COLUMNS} FROM stock_mutations WHERE id = ?1");
    let mutation = sqlx::query_as::<_, StockMutation>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(mutation)
}

/// `sent → completed`. Returns false if the row was no longer `sent`.
pub async fn mark_completed(
    conn: &mut SqliteConnection,
    id: &str,
    received_qty: Quantity,
    damaged_qty: Quantity,
    actor: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE stock_mutations
        SET status = ?2, received_qty = ?3, damaged_qty = ?4,
            received_at = ?5, received_by = ?6
        WHERE id = ?1 AND status = ?7
        "#,
    )
    .bind(id)
    .bind(MutationStatus::Completed)
    .bind(received_qty)
    .bind(damaged_qty)
    .bind(now)
    .bind(actor)
    .bind(MutationStatus::Sent)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// `sent → rejected`. Returns false if the row was no longer `sent`.
pub async fn mark_rejected(
    conn: &mut SqliteConnection,
    id: &str,
    reason: Option<&str>,
    actor: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE stock_mutations
        SET status = ?2, rejection_reason = ?3, rejected_at = ?4, rejected_by = ?5
        WHERE id = ?1 AND status = ?6
        "#,
    )
    .bind(id)
    .bind(MutationStatus::Rejected)
    .bind(reason)
    .bind(now)
    .bind(actor)
    .bind(MutationStatus::Sent)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Mutations touching `warehouse_id` on either end, newest first.
pub async fn list_for_warehouse(
    conn: &mut SqliteConnection,
    warehouse_id: &str,
    status: Option<MutationStatus>,
) -> DbResult<Vec<StockMutation>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM stock_mutations \
         WHERE (from_warehouse_id = ?1 OR to_warehouse_id = ?1) \
           AND (?2 IS NULL OR status = ?2) \
         ORDER BY sent_at DESC, code DESC"
    );
    let mutations = sqlx::query_as::<_, StockMutation>(&sql)
        .bind(warehouse_id)
        .bind(status)
        .fetch_all(conn)
        .await?;

    Ok(mutations)
}
