//! # Catalog Repository
//!
//! Warehouses, products, suppliers and customers: the entities every
//! workflow checks for before it touches stock.

use chrono::Utc;
use depot_core::{Customer, Product, Supplier, ValidationError, Warehouse};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbResult, LedgerError, LedgerResult};

/// Catalog tables a workflow can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntity {
    Warehouse,
    Product,
    Supplier,
    Customer,
}

impl CatalogEntity {
    fn table(&self) -> &'static str {
        match self {
            CatalogEntity::Warehouse => "warehouses",
            CatalogEntity::Product => "products",
            CatalogEntity::Supplier => "suppliers",
            CatalogEntity::Customer => "customers",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CatalogEntity::Warehouse => "Warehouse",
            CatalogEntity::Product => "Product",
            CatalogEntity::Supplier => "Supplier",
            CatalogEntity::Customer => "Customer",
        }
    }
}

/// Whether `id` exists in the entity's table.
pub async fn exists(conn: &mut SqliteConnection, entity: CatalogEntity, id: &str) -> DbResult<bool> {
    // table name comes from the closed CatalogEntity set, never from input
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", entity.table());
    let found: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(conn).await?;
    Ok(found)
}

/// Fails with `NotFound` unless `id` exists.
pub async fn require(conn: &mut SqliteConnection, entity: CatalogEntity, id: &str) -> LedgerResult<()> {
    if exists(conn, entity, id).await? {
        Ok(())
    } else {
        Err(LedgerError::not_found(entity.label(), id))
    }
}

fn required(field: &str, value: &str) -> LedgerResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        }
        .into());
    }
    if value.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        }
        .into());
    }
    Ok(value.to_string())
}

/// Repository for catalog rows.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    pub async fn create_warehouse(&self, code: &str, name: &str) -> LedgerResult<Warehouse> {
        let warehouse = Warehouse {
            id: Uuid::new_v4().to_string(),
            code: required("code", code)?,
            name: required("name", name)?,
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(id = %warehouse.id, code = %warehouse.code, "Creating warehouse");

        sqlx::query(
            r#"
            INSERT INTO warehouses (id, code, name, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&warehouse.id)
        .bind(&warehouse.code)
        .bind(&warehouse.name)
        .bind(warehouse.is_active)
        .bind(warehouse.created_at)
        .execute(&self.pool)
        .await?;

        Ok(warehouse)
    }

    pub async fn create_product(&self, sku: &str, name: &str, unit: &str) -> LedgerResult<Product> {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: required("sku", sku)?,
            name: required("name", name)?,
            unit: required("unit", unit)?,
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(id = %product.id, sku = %product.sku, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, unit, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.unit)
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn create_supplier(&self, name: &str) -> LedgerResult<Supplier> {
        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name: required("name", name)?,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO suppliers (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&supplier.id)
            .bind(&supplier.name)
            .bind(supplier.created_at)
            .execute(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn create_customer(&self, name: &str) -> LedgerResult<Customer> {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: required("name", name)?,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO customers (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&customer.id)
            .bind(&customer.name)
            .bind(customer.created_at)
            .execute(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn get_warehouse(&self, id: &str) -> DbResult<Option<Warehouse>> {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            "SELECT id, code, name, is_active, created_at FROM warehouses WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(warehouse)
    }

    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, sku, name, unit, is_active, created_at FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn list_warehouses(&self) -> DbResult<Vec<Warehouse>> {
        let warehouses = sqlx::query_as::<_, Warehouse>(
            "SELECT id, code, name, is_active, created_at FROM warehouses ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(warehouses)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let warehouse = catalog.create_warehouse("JKT-01", "Jakarta").await.unwrap();
        let product = catalog.create_product("SKU-1", "Rice 5kg", "bag").await.unwrap();

        let found = catalog.get_warehouse(&warehouse.id).await.unwrap().unwrap();
        assert_eq!(found.code, "JKT-01");
        assert!(found.is_active);
        assert_eq!(
            catalog.get_product(&product.id).await.unwrap().unwrap().unit,
            "bag"
        );
        assert_eq!(catalog.list_warehouses().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_require_reports_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let supplier = db.catalog().create_supplier("Acme").await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(require(&mut conn, CatalogEntity::Supplier, &supplier.id).await.is_ok());

        let err = require(&mut conn, CatalogEntity::Customer, &supplier.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.catalog().create_customer("   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_duplicate_warehouse_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        catalog.create_warehouse("JKT-01", "Jakarta").await.unwrap();
        let err = catalog.create_warehouse("JKT-01", "Jakarta 2").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
