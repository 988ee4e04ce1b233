//! # Availability Checker
//!
//! `available = quantity - reserved`. A stock line that was never touched
//! reads as zero.
//!
//! Workflows call [`ensure`] inside their transaction while holding the key
//! lock, so the answer cannot go stale before the debit lands.

use depot_core::{Availability, CoreError, Quantity, StockKey};
use sqlx::SqliteConnection;
use tracing::warn;

use crate::error::{DbResult, LedgerResult};
use crate::repository::stock;

pub async fn check(conn: &mut SqliteConnection, key: &StockKey) -> DbResult<Availability> {
    let level = stock::fetch_level(conn, key).await?;
    Ok(Availability::from_level(level.as_ref()))
}

/// Fails with `InsufficientStock` unless `requested` is covered.
pub async fn ensure(
    conn: &mut SqliteConnection,
    key: &StockKey,
    requested: Quantity,
) -> LedgerResult<Availability> {
    let availability = check(conn, key).await?;

    if !availability.covers(requested) {
        warn!(
            key = %key,
            available = %availability.available,
            requested = %requested,
            "Insufficient stock"
        );
        return Err(CoreError::InsufficientStock {
            warehouse_id: key.warehouse_id.clone(),
            product_id: key.product_id.clone(),
            available: availability.available,
            requested,
        }
        .into());
    }

    Ok(availability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_untouched_line_is_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let key = StockKey::new("wh-x", "p-x");

        let availability = check(&mut conn, &key).await.unwrap();
        assert!(!availability.is_available);
        assert!(availability.quantity.is_zero());

        let err = ensure(&mut conn, &key, Quantity::from_units(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    }
}
