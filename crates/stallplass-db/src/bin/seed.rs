//! # Seed Data
//!
//! Installs the default Stallplass rates, discount tiers and a sample code.
//!
//! ## Usage
//! ```bash
//! # Seed ./stallplass.db
//! cargo run -p stallplass-db --bin seed
//!
//! # Specify database path
//! cargo run -p stallplass-db --bin seed -- --db ./data/stallplass.db
//! ```
//!
//! Base prices are upserted every run. Tiers and the sample code are only
//! inserted into empty tables, so reruns never duplicate them.

use chrono::Utc;
use stallplass_core::{
    DiscountCode, DiscountKind, DiscountRate, DiscountTier, ItemType, Money, PricingFamily,
    TierKind,
};
use stallplass_db::{Database, DbConfig, DbError};
use std::env;

/// (name, øre, description)
const BASE_PRICES: &[(&str, i64, &str)] = &[
    ("box-monthly", 9900, "Annonse per stallboks per måned"),
    ("service-monthly", 19900, "Tjenesteannonse per måned"),
    ("boost-daily", 1000, "Sponset plassering per boks per dag"),
];

/// (family, kind, min, max, percent)
const TIERS: &[(PricingFamily, TierKind, i64, Option<i64>, u32)] = &[
    (PricingFamily::Box, TierKind::Quantity, 1, Some(4), 0),
    (PricingFamily::Box, TierKind::Quantity, 5, Some(9), 10),
    (PricingFamily::Box, TierKind::Quantity, 10, None, 20),
    (PricingFamily::Box, TierKind::Duration, 3, Some(5), 5),
    (PricingFamily::Box, TierKind::Duration, 6, Some(11), 10),
    (PricingFamily::Box, TierKind::Duration, 12, None, 15),
    (PricingFamily::Service, TierKind::Duration, 6, Some(11), 10),
    (PricingFamily::Service, TierKind::Duration, 12, None, 15),
    (PricingFamily::Boost, TierKind::Duration, 7, Some(13), 5),
    (PricingFamily::Boost, TierKind::Duration, 14, Some(29), 10),
    (PricingFamily::Boost, TierKind::Duration, 30, None, 20),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./stallplass.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stallplass Pricing Seed");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./stallplass.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stallplass Pricing Seed");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    for (name, price, description) in BASE_PRICES {
        let stored = db
            .base_prices()
            .upsert(name, Money::from_ore(*price), Some(*description), true)
            .await?;
        println!("  {:<16} {}", stored.name, stored.price);
    }
    println!("✓ Base prices installed");

    let mut inserted = 0;
    for family in PricingFamily::ALL {
        for kind in [TierKind::Quantity, TierKind::Duration] {
            let bands: Vec<_> = TIERS
                .iter()
                .filter(|t| t.0 == family && t.1 == kind)
                .collect();
            if bands.is_empty() || !db.tiers().list(family, kind).await?.is_empty() {
                continue;
            }

            for &&(_, _, min_value, max_value, percent) in &bands {
                db.tiers()
                    .insert(&DiscountTier {
                        id: String::new(),
                        family,
                        kind,
                        min_value,
                        max_value,
                        discount_percentage: DiscountRate::from_percent(percent),
                        is_active: true,
                    })
                    .await?;
                inserted += 1;
            }
        }
    }
    println!("✓ Inserted {} discount tiers", inserted);

    let sample = DiscountCode {
        id: String::new(),
        code: "SUMMER20".to_string(),
        name: Some("Sommerkampanje".to_string()),
        kind: DiscountKind::Percentage {
            percent: 20,
            max_discount: Some(Money::from_kroner(500)),
        },
        applicable_item_types: vec![ItemType::BoxAdvertising, ItemType::BoxSponsored],
        is_active: true,
        expires_at: None,
        usage_limit: Some(100),
        usage_count: 0,
        created_at: Utc::now(),
    };
    match db.discount_codes().insert(&sample).await {
        Ok(code) => println!("✓ Created discount code {}", code.code),
        Err(DbError::UniqueViolation { .. }) => println!("  Discount code SUMMER20 already exists"),
        Err(e) => return Err(e.into()),
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
