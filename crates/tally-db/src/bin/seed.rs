//! # Seed Data Generator
//!
//! Populates the database with catalog items and, optionally, sample
//! invoices for development.
//!
//! ## Usage
//! ```bash
//! # 50 items, no invoices (default)
//! cargo run -p tally-db --bin seed
//!
//! # Custom amounts
//! cargo run -p tally-db --bin seed -- --items 200 --invoices 40
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Items
//! - SKU: five letters from the name, a dash, four digits (`WIDGE-0007`)
//! - Stock: 5 - 50
//! - Cost: 1.00 - 40.99, sale price 20-60% above cost
//!
//! Sample invoices take one to three lines each, are dated across the last
//! seven days and go through the same sequence + conditional decrement path
//! as live invoices, so stock stays consistent.

use chrono::{Duration, Utc};
use std::env;
use tally_core::reference::{format_reference, reference_period};
use tally_core::{Invoice, InvoiceLineItem, Item};
use tally_db::repository::generate_id;
use tally_db::{Database, DbConfig};

const NAMES: &[&str] = &[
    "Widget", "Gadget", "Sprocket", "Bracket", "Hinge", "Gasket", "Flange", "Spindle",
    "Bearing", "Coupling", "Fastener", "Bushing", "Pulley", "Ratchet", "Spring", "Washer",
];

const VARIANTS: &[&str] = &["Mini", "Standard", "Heavy", "Pro", "Steel", "Brass"];

const CUSTOMERS: &[&str] = &["John Doe", "Jane Roe", "Acme Ltd", "Globex", "Initech"];

const SEED_OWNER: &str = "seed";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut item_count: usize = 50;
    let mut invoice_count: usize = 0;
    let mut db_path = String::from("./tally.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--items" | "-i" => {
                if i + 1 < args.len() {
                    item_count = args[i + 1].parse().unwrap_or(item_count);
                    i += 1;
                }
            }
            "--invoices" | "-n" => {
                if i + 1 < args.len() {
                    invoice_count = args[i + 1].parse().unwrap_or(invoice_count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -i, --items <N>     Number of items to generate (default: 50)");
                println!("  -n, --invoices <N>  Number of sample invoices (default: 0)");
                println!("  -d, --db <PATH>     Database file path (default: ./tally.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tally Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!("Items:    {}", item_count);
    println!("Invoices: {}", invoice_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating items...");

    let start = std::time::Instant::now();
    let mut items = Vec::with_capacity(item_count);

    for seed in 0..item_count {
        let item = generate_item(seed);
        match db.items().insert(&item).await {
            Ok(item) => items.push(item),
            Err(e) => eprintln!("Failed to insert {}: {}", item.sku, e),
        }
    }

    println!("✓ Generated {} items in {:?}", items.len(), start.elapsed());

    if invoice_count > 0 && !items.is_empty() {
        println!();
        println!("Generating invoices...");

        let mut created = 0;
        for seed in 0..invoice_count {
            match create_invoice(&db, &items, seed).await {
                Ok(Some(reference)) => {
                    created += 1;
                    if created % 10 == 0 {
                        println!("  Created {} invoices (last {})...", created, reference);
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("Failed to create invoice {}: {}", seed, e),
            }
        }

        println!("✓ Created {} invoices", created);
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one deterministic catalog item.
fn generate_item(seed: usize) -> Item {
    let name = NAMES[seed % NAMES.len()];
    let variant = VARIANTS[(seed / NAMES.len()) % VARIANTS.len()];

    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .chain(std::iter::repeat('X'))
        .take(5)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{:04}", prefix, seed + 1);

    let unit_price_cents = 100 + ((seed * 37) % 4000) as i64;
    let markup_pct = 20 + (seed % 41) as i64;
    let sale_price_cents = unit_price_cents + unit_price_cents * markup_pct / 100;

    Item {
        id: generate_id(),
        name: format!("{} {}", variant, name),
        sku,
        quantity: 5 + (seed % 46) as i64,
        unit_price_cents,
        sale_price_cents,
        created_at: Utc::now(),
    }
}

/// Creates one sample invoice. Returns `None` when stock ran out for a line.
async fn create_invoice(
    db: &Database,
    items: &[Item],
    seed: usize,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let now = Utc::now();
    let date = now - Duration::hours((seed % (7 * 24)) as i64);
    let line_count = 1 + seed % 3;

    let invoice_id = generate_id();
    let mut lines = Vec::with_capacity(line_count);
    let mut amount_cents = 0;
    for n in 0..line_count {
        let item = &items[(seed * 7 + n * 13) % items.len()];
        let quantity = 1 + ((seed + n) % 3) as i64;
        amount_cents += item.sale_price_cents * quantity;
        lines.push(InvoiceLineItem {
            id: generate_id(),
            invoice_id: invoice_id.clone(),
            item_id: item.id.clone(),
            quantity,
        });
    }

    let mut uow = db.begin().await?;
    let period = reference_period(date);
    let sequence = uow.next_sequence(&period).await?;

    let invoice = Invoice {
        id: invoice_id,
        customer: CUSTOMERS[seed % CUSTOMERS.len()].to_string(),
        reference: format_reference(&period, sequence),
        date,
        amount_cents,
        user_id: SEED_OWNER.to_string(),
        created_at: now,
        items: lines,
    };

    uow.insert_invoice(&invoice).await?;
    for line in &invoice.items {
        if !uow.decrement_stock(&line.item_id, line.quantity).await? {
            uow.rollback().await?;
            return Ok(None);
        }
    }
    uow.commit().await?;

    Ok(Some(invoice.reference))
}
