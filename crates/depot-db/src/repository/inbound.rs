//! # Inbound Receipt Repository

use depot_core::InboundReceipt;
use sqlx::SqliteConnection;

use crate::error::DbResult;

const COLUMNS: &str = "id, code, supplier_id, warehouse_id, product_id, quantity, unit_price, \
     received_date, notes, created_by, created_at";

pub async fn insert(conn: &mut SqliteConnection, receipt: &InboundReceipt) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inbound_receipts (
            id, code, supplier_id, warehouse_id, product_id,
            quantity, unit_price, received_date, notes,
            created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&receipt.id)
    .bind(&receipt.code)
    .bind(&receipt.supplier_id)
    .bind(&receipt.warehouse_id)
    .bind(&receipt.product_id)
    .bind(receipt.quantity)
    .bind(receipt.unit_price)
    .bind(receipt.received_date)
    .bind(&receipt.notes)
    .bind(&receipt.created_by)
    .bind(receipt.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<InboundReceipt>> {
    let sql = format!("SELECT {COLUMNS} FROM inbound_receipts WHERE id = ?1");
    let receipt = sqlx::query_as::<_, InboundReceipt>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(receipt)
}

pub async fn get_by_code(conn: &mut SqliteConnection, code: &str) -> DbResult<Option<InboundReceipt>> {
    let sql = format!("SELECT {COLUMNS} FROM inbound_receipts WHERE code = ?1");
    let receipt = sqlx::query_as::<_, InboundReceipt>(&sql)
        .bind(code)
        .fetch_optional(conn)
        .await?;

    Ok(receipt)
}
