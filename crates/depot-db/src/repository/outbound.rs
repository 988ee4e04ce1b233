//! # Outbound Sale Repository

use depot_core::OutboundSale;
use sqlx::SqliteConnection;

use crate::error::DbResult;

const COLUMNS: &str = "id, code, customer_id, warehouse_id, product_id, quantity, unit_price, \
     total_price, sale_date, notes, attachment, created_by, created_at";

pub async fn insert(conn: &mut SqliteConnection, sale: &OutboundSale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO outbound_sales (
            id, code, customer_id, warehouse_id, product_id,
            quantity, unit_price, total_price, sale_date,
            notes, attachment, created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.code)
    .bind(&sale.customer_id)
    .bind(&sale.warehouse_id)
    .bind(&sale.product_id)
    .bind(sale.quantity)
    .bind(sale.unit_price)
    .bind(sale.total_price)
    .bind(sale.sale_date)
    .bind(&sale.notes)
    .bind(&sale.attachment)
    .bind(&sale.created_by)
    .bind(sale.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<OutboundSale>> {
    let sql = format!("SELECT {COLUMNS} FROM outbound_sales WHERE id = ?1");
    let sale = sqlx::query_as::<_, OutboundSale>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(sale)
}

pub async fn get_by_code(conn: &mut SqliteConnection, code: &str) -> DbResult<Option<OutboundSale>> {
    let sql = format!("SELECT {COLUMNS} FROM outbound_sales WHERE code = ?1");
    let sale = sqlx::query_as::<_, OutboundSale>(&sql)
        .bind(code)
        .fetch_optional(conn)
        .await?;

    Ok(sale)
}
