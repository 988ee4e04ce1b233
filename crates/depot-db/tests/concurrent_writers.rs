//! Concurrent workflows against a file database with a multi-connection pool.

use chrono::Utc;
use depot_core::{DocumentCode, InboundInput, Money, OutboundInput, Quantity};
use depot_db::{Database, DbConfig, ErrorKind, LedgerSettings, StockLedger};
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;

const ACTOR: &str = "tester";
const WRITERS: usize = 8;

struct Fixture {
    // keeps the database file alive
    _dir: TempDir,
    ledger: StockLedger,
    warehouse: String,
    supplier: String,
    customer: String,
}

async fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let config = DbConfig::new(dir.path().join("depot.db"))
        .max_connections(WRITERS as u32)
        .busy_timeout(Duration::from_secs(10));
    let db = Database::new(config).await.unwrap();
    let catalog = db.catalog();

    let warehouse = catalog.create_warehouse("WH-A", "Warehouse A").await.unwrap();
    let supplier = catalog.create_supplier("Supplier One").await.unwrap();
    let customer = catalog.create_customer("Customer One").await.unwrap();

    Fixture {
        _dir: dir,
        ledger: StockLedger::new(db, LedgerSettings::default()),
        warehouse: warehouse.id,
        supplier: supplier.id,
        customer: customer.id,
    }
}

impl Fixture {
    async fn product(&self, sku: &str) -> String {
        self.ledger
            .database()
            .catalog()
            .create_product(sku, sku, "pcs")
            .await
            .unwrap()
            .id
    }

    fn inbound(&self, product_id: &str, qty: i64) -> InboundInput {
        InboundInput {
            supplier_id: self.supplier.clone(),
            warehouse_id: self.warehouse.clone(),
            product_id: product_id.to_string(),
            quantity: Quantity::from_units(qty),
            unit_price: Money::from_cents(100),
            received_date: Utc::now().date_naive(),
            notes: None,
        }
    }

    fn sale(&self, product_id: &str, qty: i64) -> OutboundInput {
        OutboundInput {
            customer_id: self.customer.clone(),
            warehouse_id: self.warehouse.clone(),
            product_id: product_id.to_string(),
            quantity: Quantity::from_units(qty),
            unit_price: Money::from_cents(150),
            sale_date: Utc::now().date_naive(),
            notes: None,
            attachment: None,
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_sales_on_one_line_sell_once() {
    let fx = setup().await;
    let product = fx.product("SKU-RACE").await;
    fx.ledger
        .receive_inbound(ACTOR, fx.inbound(&product, 10))
        .await
        .unwrap();

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let ledger = fx.ledger.clone();
            let input = fx.sale(&product, 6);
            tokio::spawn(async move { ledger.sell_outbound(ACTOR, input).await })
        })
        .collect();

    let mut succeeded = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) if err.kind() == ErrorKind::InsufficientStock => short += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(short, WRITERS - 1);

    let availability = fx.ledger.availability(&fx.warehouse, &product).await.unwrap();
    assert_eq!(availability.quantity, Quantity::from_units(4));

    let report = fx.ledger.reconcile(&fx.warehouse, &product).await.unwrap();
    assert!(report.consistent);
    assert_eq!(report.entries, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_documents_get_distinct_codes() {
    let fx = setup().await;

    // one line per writer, so only the code counter is shared
    let mut products = Vec::with_capacity(WRITERS);
    for i in 0..WRITERS {
        products.push(fx.product(&format!("SKU-{i}")).await);
    }

    let handles: Vec<_> = products
        .iter()
        .map(|product| {
            let ledger = fx.ledger.clone();
            let input = fx.inbound(product, 1);
            tokio::spawn(async move { ledger.receive_inbound(ACTOR, input).await })
        })
        .collect();

    let mut codes = HashSet::new();
    let mut sequences = Vec::with_capacity(WRITERS);
    for handle in handles {
        let posting = handle.await.unwrap().unwrap();
        let code: DocumentCode = posting.document.code.parse().unwrap();
        sequences.push(code.sequence);
        assert!(codes.insert(posting.document.code));
    }

    assert_eq!(codes.len(), WRITERS);
    sequences.sort_unstable();
    let expected: Vec<u32> = (1..=WRITERS as u32).collect();
    assert_eq!(sequences, expected);
}
