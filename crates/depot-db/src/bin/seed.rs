//! # Seed Data Generator
//!
//! Populates a development database with a small catalog and walks one
//! transfer through the ledger.
//!
//! ## Usage
//! ```bash
//! # Use depot.toml / DEPOT_* settings
//! cargo run -p depot-db --bin seed
//!
//! # Specify database path
//! cargo run -p depot-db --bin seed -- --db ./data/depot.db
//!
//! # Specify config file
//! cargo run -p depot-db --bin seed -- --config ./depot.toml
//! ```
//!
//! ## Scenario
//! ```text
//!   inbound   +100 → JKT-01
//!   send        30   JKT-01 → SBY-01
//!   receive     28 received, 2 damaged
//!
//!   JKT-01: 70    SBY-01: 28    damaged: 2    lost: 0
//! ```

use chrono::Utc;
use depot_core::{
    InboundInput, Money, Quantity, ReceiveMutationInput, SendMutationInput,
};
use depot_db::{Database, LedgerConfig, StockLedger};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ACTOR: &str = "seed";

/// Warehouses created on an empty database: (code, name).
const WAREHOUSES: &[(&str, &str)] = &[("JKT-01", "Jakarta Central"), ("SBY-01", "Surabaya East")];

/// Products created on an empty database: (sku, name, unit).
const PRODUCTS: &[(&str, &str, &str)] = &[
    ("RICE-5KG", "Rice 5kg", "sack"),
    ("OIL-2L", "Cooking Oil 2L", "bottle"),
    ("SUGAR-1KG", "Sugar 1kg", "pack"),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,depot=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Depot Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => warn!(arg = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = LedgerConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(config.db_config()).await?;
    let catalog = db.catalog();

    if !catalog.list_warehouses().await?.is_empty() {
        warn!(
            path = %config.database.path.display(),
            "Database already has warehouses; skipping seed. Delete the file to regenerate."
        );
        return Ok(());
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    let mut warehouses = Vec::with_capacity(WAREHOUSES.len());
    for (code, name) in WAREHOUSES {
        warehouses.push(catalog.create_warehouse(code, name).await?);
    }

    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (sku, name, unit) in PRODUCTS {
        products.push(catalog.create_product(sku, name, unit).await?);
    }

    let supplier = catalog.create_supplier("PT Sumber Makmur").await?;
    let customer = catalog.create_customer("Toko Sejahtera").await?;

    info!(
        warehouses = warehouses.len(),
        products = products.len(),
        customer = %customer.name,
        "Catalog seeded"
    );

    // =========================================================================
    // Scenario
    // =========================================================================

    let ledger = StockLedger::new(db.clone(), config.ledger_settings());
    let (origin, destination) = (&warehouses[0], &warehouses[1]);
    let product = &products[0];
    let today = Utc::now().date_naive();

    let receipt = ledger
        .receive_inbound(
            ACTOR,
            InboundInput {
                supplier_id: supplier.id.clone(),
                warehouse_id: origin.id.clone(),
                product_id: product.id.clone(),
                quantity: Quantity::from_units(100),
                unit_price: Money::from_cents(65_000_00),
                received_date: today,
                notes: Some("Opening stock".to_string()),
            },
        )
        .await?;
    info!(code = %receipt.document.code, "Inbound posted");

    let sent = ledger
        .send_mutation(
            ACTOR,
            SendMutationInput {
                from_warehouse_id: origin.id.clone(),
                to_warehouse_id: destination.id.clone(),
                product_id: product.id.clone(),
                quantity: Quantity::from_units(30),
                notes: None,
            },
        )
        .await?;

    let received = ledger
        .receive_mutation(
            ACTOR,
            ReceiveMutationInput {
                mutation_id: sent.id.clone(),
                received_qty: Quantity::from_units(28),
                damaged_qty: Quantity::from_units(2),
            },
        )
        .await?;
    info!(
        code = %received.document.code,
        status = %received.document.status,
        damaged = %received.document.damaged_qty,
        lost = %received.document.lost_qty(),
        "Mutation completed"
    );

    for warehouse in [origin, destination] {
        let availability = ledger.availability(&warehouse.id, &product.id).await?;
        let report = ledger.reconcile(&warehouse.id, &product.id).await?;
        info!(
            warehouse = %warehouse.code,
            product = %product.sku,
            quantity = %availability.quantity,
            consistent = report.consistent,
            "Stock line"
        );
    }

    db.close().await;
    info!("Seed complete");

    Ok(())
}
