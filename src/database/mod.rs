use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::{debug, info};

use crate::models::{Installment, PhoneRecord, PricePoint, Source, SpecSet};
use crate::traits::PhoneStore;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Create database file if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database file");
            if let Some(parent) = db_url
                .strip_prefix("sqlite:")
                .map(|path| Path::new(path.trim_start_matches("//")))
                .and_then(Path::parent)
                .filter(|parent| !parent.as_os_str().is_empty())
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePool::connect(db_url).await?;
        Self::migrate(pool).await
    }

    /// Private in-memory database. A single connection keeps every query on
    /// the same memory store.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    pub async fn count_phones(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM phones")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl PhoneStore for Database {
    async fn add_phone(&self, record: &PhoneRecord) -> Result<String> {
        let id = record.id();
        let now = Utc::now();
        let specs = serde_json::to_string(record.specs())?;
        let price = record.price().to_string();
        let installment = record.installment();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO phones (id, model, brand, price, specs, source, source_url,
                                installment_count, installment_amount, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                brand = excluded.brand,
                price = excluded.price,
                specs = excluded.specs,
                source_url = excluded.source_url,
                installment_count = excluded.installment_count,
                installment_amount = excluded.installment_amount,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&id)
        .bind(record.model())
        .bind(record.brand())
        .bind(&price)
        .bind(&specs)
        .bind(record.source().id())
        .bind(record.source_url())
        .bind(i64::from(installment.count))
        .bind(installment.amount.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO price_history (phone_id, price, source, recorded_at)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(&id)
        .bind(&price)
        .bind(record.source().id())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Saved {} ({}) at {}", record.model(), record.source(), price);
        Ok(id)
    }

    async fn get_phones(&self, limit: usize) -> Result<Vec<PhoneRecord>> {
        let rows = sqlx::query(
            r"
            SELECT model, price, specs, source, source_url, installment_count, installment_amount
            FROM phones
            ORDER BY updated_at DESC, model ASC
            LIMIT ?
            ",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(phone_from_row).collect()
    }

    async fn get_price_history(&self, model: &str) -> Result<Vec<PricePoint>> {
        let rows = sqlx::query(
            r"
            SELECT h.price, h.recorded_at, h.source
            FROM price_history h
            JOIN phones p ON p.id = h.phone_id
            WHERE p.model = ?
            ORDER BY h.recorded_at ASC, h.id ASC
            ",
        )
        .bind(model)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(price_point_from_row).collect()
    }
}

fn price_point_from_row(row: &SqliteRow) -> Result<PricePoint> {
    Ok(PricePoint {
        price: parse_decimal(&row.try_get::<String, _>("price")?)?,
        date: row.try_get::<DateTime<Utc>, _>("recorded_at")?,
        source: Source::from_str(&row.try_get::<String, _>("source")?)?,
    })
}

fn phone_from_row(row: &SqliteRow) -> Result<PhoneRecord> {
    let specs: SpecSet = serde_json::from_str(&row.try_get::<String, _>("specs")?)
        .context("stored specs are not valid JSON")?;
    let installment = Installment {
        count: u32::try_from(row.try_get::<i64, _>("installment_count")?).unwrap_or(0),
        amount: parse_decimal(&row.try_get::<String, _>("installment_amount")?)?,
    };

    Ok(PhoneRecord::new(
        row.try_get::<String, _>("model")?,
        parse_decimal(&row.try_get::<String, _>("price")?)?,
        specs,
        Source::from_str(&row.try_get::<String, _>("source")?)?,
        row.try_get::<Option<String>, _>("source_url")?,
    )
    .with_installment(installment))
}

fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text).with_context(|| format!("invalid stored decimal {text:?}"))
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}
