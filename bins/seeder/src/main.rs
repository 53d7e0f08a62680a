//! Demo data seeder for Tally development and testing.
//!
//! Seeds a demo business with the default chart of accounts, a handful of
//! categories and exchange rates into its base currency. Safe to run more
//! than once.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tally_core::chart::CategoryKind;
use tally_core::currency::ExchangeRate;
use tally_core::ledger::LedgerService;
use tally_db::entities::businesses;
use tally_db::{BusinessRates, CategoryRepository, ExchangeRateRepository, SeaOrmLedgerStore};
use tally_shared::types::{BusinessId, CategoryId, CurrencyCode};
use uuid::Uuid;

/// Demo business ID (stable across runs).
const DEMO_BUSINESS_ID: Uuid = Uuid::from_u128(1);

const DEMO_CATEGORIES: [(&str, CategoryKind); 6] = [
    ("Sales", CategoryKind::Income),
    ("Service Revenue", CategoryKind::Income),
    ("Rent", CategoryKind::Expense),
    ("Office Supplies", CategoryKind::Expense),
    ("Travel", CategoryKind::Expense),
    ("Utilities", CategoryKind::Expense),
];

const DEMO_RATES: [(&str, Decimal); 3] = [
    ("EUR", dec!(1.10)),
    ("GBP", dec!(1.27)),
    ("IDR", dec!(0.000063)),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("TALLY__DATABASE__URL"))
        .context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = tally_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding demo business...");
    let business_id = seed_business(&db).await?;

    println!("Seeding chart of accounts...");
    seed_chart(&db, business_id).await?;

    println!("Seeding categories...");
    seed_categories(&db, business_id).await?;

    println!("Seeding exchange rates...");
    seed_exchange_rates(&db, business_id).await?;

    println!("Seeding complete! Demo business: {business_id}");
    Ok(())
}

fn ledger(
    db: &DatabaseConnection,
    business_id: BusinessId,
) -> LedgerService<SeaOrmLedgerStore, BusinessRates> {
    let rates = BusinessRates::new(ExchangeRateRepository::new(db.clone()), business_id);
    LedgerService::new(Arc::new(SeaOrmLedgerStore::new(db.clone())), Arc::new(rates))
}

/// Seeds the demo business.
async fn seed_business(db: &DatabaseConnection) -> anyhow::Result<BusinessId> {
    let business_id = BusinessId::from_uuid(DEMO_BUSINESS_ID);
    if businesses::Entity::find_by_id(DEMO_BUSINESS_ID)
        .one(db)
        .await?
        .is_some()
    {
        println!("  Demo business already exists, skipping...");
        return Ok(business_id);
    }

    businesses::ActiveModel {
        id: Set(DEMO_BUSINESS_ID),
        name: Set("Demo Consulting".to_string()),
        base_currency: Set(CurrencyCode::usd().to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await?;
    println!("  Created Demo Consulting (USD)");
    Ok(business_id)
}

/// Seeds the default chart of accounts.
async fn seed_chart(db: &DatabaseConnection, business_id: BusinessId) -> anyhow::Result<()> {
    let chart = ledger(db, business_id).seed_default_chart(business_id).await?;
    println!("  {} accounts in chart", chart.accounts().len());
    Ok(())
}

/// Seeds income and expense categories bound to their accounts.
async fn seed_categories(
    db: &DatabaseConnection,
    business_id: BusinessId,
) -> anyhow::Result<()> {
    let repo = CategoryRepository::new(db.clone());
    let existing = repo.list(business_id).await?;
    let service = ledger(db, business_id);

    for (name, kind) in DEMO_CATEGORIES {
        if existing.iter().any(|c| c.name == name) {
            println!("  Category {name} already exists, skipping...");
            continue;
        }
        let category = service
            .bind_category(business_id, CategoryId::new(), name, kind)
            .await?;
        repo.insert(&category).await?;
        println!("  Created category {name} ({})", kind.as_str());
    }
    Ok(())
}

/// Seeds rates into USD, effective 30 days ago.
async fn seed_exchange_rates(
    db: &DatabaseConnection,
    business_id: BusinessId,
) -> anyhow::Result<()> {
    let repo = ExchangeRateRepository::new(db.clone());
    let effective_date = (Utc::now() - Duration::days(30)).date_naive();

    for (code, rate) in DEMO_RATES {
        let rate = ExchangeRate::new(
            CurrencyCode::parse(code)?,
            CurrencyCode::usd(),
            rate,
            effective_date,
        )?;
        repo.upsert(business_id, &rate).await?;
        println!("  {code}/USD = {} from {effective_date}", rate.rate);
    }
    Ok(())
}
