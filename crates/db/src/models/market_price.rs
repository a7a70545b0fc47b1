use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// Wholesale crop price as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, JsonSchema, TS)]
pub struct CropPrice {
    /// Name of the crop, e.g. "Wheat".
    pub name: String,
    /// Price per quintal in Indian Rupees.
    pub price: f64,
    /// Percentage change in price over the last 24 hours.
    pub change: f64,
}

/// Seed price for a named variety.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, JsonSchema, TS)]
pub struct SeedPrice {
    /// Name of the crop seed, e.g. "Maize".
    pub name: String,
    /// Seed variety, e.g. "HQPM-1".
    pub variety: String,
    /// Price per quintal in Indian Rupees.
    pub price: f64,
}

impl CropPrice {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CropPrice>("SELECT name, price, change FROM crop_prices ORDER BY name")
            .fetch_all(pool)
            .await
    }

    /// Delete every stored price and insert `prices` in one transaction.
    ///
    /// Returns the number of rows stored afterwards.
    pub async fn replace_all(pool: &SqlitePool, prices: &[CropPrice]) -> Result<u64, sqlx::Error> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM crop_prices").execute(&mut *tx).await?;

        for price in prices {
            // Duplicate names from the model keep the last value.
            sqlx::query(
                r#"INSERT INTO crop_prices (name, price, change, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT(name) DO UPDATE SET
                    price = excluded.price,
                    change = excluded.change,
                    updated_at = excluded.updated_at"#,
            )
            .bind(&price.name)
            .bind(price.price)
            .bind(price.change)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let stored = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM crop_prices")
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(u64::try_from(stored).unwrap_or_default())
    }
}

impl SeedPrice {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SeedPrice>(
            "SELECT name, variety, price FROM seed_prices ORDER BY name, variety",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn replace_all(pool: &SqlitePool, prices: &[SeedPrice]) -> Result<u64, sqlx::Error> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM seed_prices").execute(&mut *tx).await?;

        for price in prices {
            sqlx::query(
                r#"INSERT INTO seed_prices (name, variety, price, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT(name, variety) DO UPDATE SET
                    price = excluded.price,
                    updated_at = excluded.updated_at"#,
            )
            .bind(&price.name)
            .bind(&price.variety)
            .bind(price.price)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let stored = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM seed_prices")
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(u64::try_from(stored).unwrap_or_default())
    }
}
