//! Schema checks backing the health endpoint.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::warn;
use ts_rs::TS;

/// Tables the application reads or writes.
pub const REQUIRED_TABLES: &[&str] = &[
    "user_profiles",
    "farms",
    "crops",
    "sensor_readings",
    "cultivation_plans",
    "soil_reports",
    "crop_prices",
    "seed_prices",
];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn validate(&self) -> Result<DatabaseHealth, DatabaseValidationError> {
        let migrations_table_exists = self.table_exists("_sqlx_migrations").await?;
        if !migrations_table_exists {
            warn!("Database not initialized - _sqlx_migrations table does not exist");
            return Ok(DatabaseHealth {
                initialized: false,
                migrations_applied: 0,
                latest_migration: None,
                missing_tables: REQUIRED_TABLES.iter().map(|t| t.to_string()).collect(),
            });
        }

        let migrations_applied = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        let latest_migration = sqlx::query_scalar::<_, String>(
            "SELECT description FROM _sqlx_migrations WHERE success = 1 ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let missing_tables = self.missing_tables(REQUIRED_TABLES).await?;
        if !missing_tables.is_empty() {
            warn!(?missing_tables, "Database is missing tables");
        }

        Ok(DatabaseHealth {
            initialized: true,
            migrations_applied: migrations_applied as usize,
            latest_migration,
            missing_tables,
        })
    }

    pub async fn missing_tables(
        &self,
        required_tables: &[&str],
    ) -> Result<Vec<String>, DatabaseValidationError> {
        let mut missing = Vec::new();
        for table in required_tables {
            if !self.table_exists(table).await? {
                missing.push(table.to_string());
            }
        }
        Ok(missing)
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseValidationError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct DatabaseHealth {
    pub initialized: bool,
    pub migrations_applied: usize,
    pub latest_migration: Option<String>,
    pub missing_tables: Vec<String>,
}

impl DatabaseHealth {
    pub fn is_ok(&self) -> bool {
        self.initialized && self.missing_tables.is_empty()
    }

    pub fn summary(&self) -> String {
        if !self.initialized {
            "Database not initialized - migrations need to be run".to_string()
        } else if !self.missing_tables.is_empty() {
            format!("Database is missing tables: {}", self.missing_tables.join(", "))
        } else {
            format!("Database OK - {} migrations applied", self.migrations_applied)
        }
    }
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;

    #[tokio::test]
    async fn migrated_database_is_healthy() {
        let db = DBService::in_memory().await.unwrap();
        let health = DatabaseValidator::new(db.pool.clone()).validate().await.unwrap();
        assert!(health.is_ok(), "{}", health.summary());
        assert!(health.migrations_applied >= 1);
        assert_eq!(health.latest_migration.as_deref(), Some("init"));
    }

    #[tokio::test]
    async fn empty_database_reports_uninitialized() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let health = DatabaseValidator::new(pool).validate().await.unwrap();
        assert!(!health.is_ok());
        assert_eq!(health.missing_tables.len(), REQUIRED_TABLES.len());
    }
}
