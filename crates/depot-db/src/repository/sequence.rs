//! # Document Code Sequences
//!
//! One counter row per `(prefix, day)`. The increment runs inside the
//! caller's write transaction, so a rolled-back workflow gives its number
//! back and two committed documents can never share a code.

use chrono::NaiveDate;
use depot_core::DocumentCode;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Allocates the next code for `prefix` on `day`.
pub async fn next_code(
    conn: &mut SqliteConnection,
    prefix: &str,
    day: NaiveDate,
) -> DbResult<DocumentCode> {
    let day_key = day.format("%Y%m%d").to_string();

    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO document_sequences (prefix, day, last_value)
        VALUES (?1, ?2, 1)
        ON CONFLICT (prefix, day) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(prefix)
    .bind(&day_key)
    .fetch_one(conn)
    .await?;

    let sequence = u32::try_from(value).map_err(|_| {
        DbError::Internal(format!("{prefix} sequence for {day_key} out of range: {value}"))
    })?;

    let code = DocumentCode::new(prefix, day, sequence);
    debug!(code = %code, "Allocated document code");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_sequence_per_prefix_and_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let a = next_code(&mut conn, "IN", day(5)).await.unwrap();
        let b = next_code(&mut conn, "IN", day(5)).await.unwrap();
        let other_prefix = next_code(&mut conn, "OUT", day(5)).await.unwrap();
        let next_day = next_code(&mut conn, "IN", day(6)).await.unwrap();

        assert_eq!(a.to_string(), "IN-20260105-001");
        assert_eq!(b.to_string(), "IN-20260105-002");
        assert_eq!(other_prefix.to_string(), "OUT-20260105-001");
        assert_eq!(next_day.to_string(), "IN-20260106-001");
    }

    #[tokio::test]
    async fn test_rolled_back_allocation_is_reused() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        {
            let mut tx = db.begin_write().await.unwrap();
            next_code(&mut tx, "MUT", day(5)).await.unwrap();
        }

        let mut tx = db.begin_write().await.unwrap();
        let code = next_code(&mut tx, "MUT", day(5)).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(code.sequence, 1);
    }

    #[tokio::test]
    async fn test_exhausted_counter_is_an_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        sqlx::query(
            "INSERT INTO document_sequences (prefix, day, last_value) VALUES ('IN', '20260105', ?1)",
        )
        .bind(i64::from(u32::MAX))
        .execute(&mut *conn)
        .await
        .unwrap();

        let err = next_code(&mut conn, "IN", day(5)).await.unwrap_err();
        assert!(matches!(err, DbError::Internal(_)));

        // other days are unaffected
        let code = next_code(&mut conn, "IN", day(6)).await.unwrap();
        assert_eq!(code.sequence, 1);
    }
}
