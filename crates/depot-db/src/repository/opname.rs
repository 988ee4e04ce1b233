//! # Opname Repository

use chrono::{DateTime, NaiveDate, Utc};
use depot_core::{Opname, OpnameStatus, Quantity, StockKey};
use sqlx::SqliteConnection;

use crate::error::DbResult;

const COLUMNS: &str = "id, code, warehouse_id, product_id, system_qty, physical_qty, \
     difference_qty, difference_type, status, opname_date, notes, created_by, created_at, \
     approved_by, approved_at, approved_system_qty";

pub async fn insert(conn: &mut SqliteConnection, opname: &Opname) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO opnames (
            id, code, warehouse_id, product_id,
            system_qty, physical_qty, difference_qty, difference_type,
            status, opname_date, notes, created_by, created_at,
            approved_by, approved_at, approved_system_qty
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        "#,
    )
    .bind(&opname.id)
    .bind(&opname.code)
    .bind(&opname.warehouse_id)
    .bind(&opname.product_id)
    .bind(opname.system_qty)
    .bind(opname.physical_qty)
    .bind(opname.difference_qty)
    .bind(opname.difference_type)
    .bind(opname.status)
    .bind(opname.opname_date)
    .bind(&opname.notes)
    .bind(&opname.created_by)
    .bind(opname.created_at)
    .bind(&opname.approved_by)
    .bind(opname.approved_at)
    .bind(opname.approved_system_qty)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Opname>> {
    let sql = format!("SELECT {COLUMNS} FROM opnames WHERE id = ?1");
    let opname = sqlx::query_as::<_, Opname>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(opname)
}

/// The count for one stock line on one date, if any.
pub async fn find_for_line(
    conn: &mut SqliteConnection,
    key: &StockKey,
    date: NaiveDate,
) -> DbResult<Option<Opname>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM opnames \
         WHERE warehouse_id = ?1 AND product_id = ?2 AND opname_date = ?3"
    );
    let opname = sqlx::query_as::<_, Opname>(&sql)
        .bind(&key.warehouse_id)
        .bind(&key.product_id)
        .bind(date)
        .fetch_optional(conn)
        .await?;

    Ok(opname)
}

/// `draft → approved`. Returns false if the row was no longer a draft.
pub async fn mark_approved(
    conn: &mut SqliteConnection,
    id: &str,
    live_qty: Quantity,
    actor: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE opnames
        SET status = ?2, approved_by = ?3, approved_at = ?4, approved_system_qty = ?5
        WHERE id = ?1 AND status = ?6
        "#,
    )
    .bind(id)
    .bind(OpnameStatus::Approved)
    .bind(actor)
    .bind(now)
    .bind(live_qty)
    .bind(OpnameStatus::Draft)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
