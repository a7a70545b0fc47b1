use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "crop_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CropStatus {
    #[default]
    Planned,
    Planted,
    Growing,
    Harvested,
    Failed,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Crop {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub owner_id: String,
    pub crop_type: String,
    pub variety: Option<String>,
    pub planting_date: NaiveDate,
    pub expected_harvest_date: NaiveDate,
    pub actual_harvest_date: Option<NaiveDate>,
    pub status: CropStatus,
    pub expected_yield: Option<f64>,
    pub actual_yield: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCrop {
    pub owner_id: String,
    pub crop_type: String,
    pub variety: Option<String>,
    pub planting_date: NaiveDate,
    pub expected_harvest_date: NaiveDate,
    #[serde(default)]
    pub status: CropStatus,
    pub expected_yield: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateCrop {
    pub crop_type: Option<String>,
    pub variety: Option<String>,
    pub planting_date: Option<NaiveDate>,
    pub expected_harvest_date: Option<NaiveDate>,
    pub actual_harvest_date: Option<NaiveDate>,
    pub status: Option<CropStatus>,
    pub expected_yield: Option<f64>,
    pub actual_yield: Option<f64>,
    pub notes: Option<String>,
}

impl Crop {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        farm_id: Uuid,
        data: &CreateCrop,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Crop>(
            r#"INSERT INTO crops
                (id, farm_id, owner_id, crop_type, variety, planting_date,
                 expected_harvest_date, status, expected_yield, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING *"#,
        )
        .bind(id)
        .bind(farm_id)
        .bind(&data.owner_id)
        .bind(&data.crop_type)
        .bind(&data.variety)
        .bind(data.planting_date)
        .bind(data.expected_harvest_date)
        .bind(data.status)
        .bind(data.expected_yield)
        .bind(&data.notes)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Crop>("SELECT * FROM crops WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recently planted first.
    pub async fn find_by_farm_id(pool: &SqlitePool, farm_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Crop>(
            "SELECT * FROM crops WHERE farm_id = $1 ORDER BY planting_date DESC, rowid DESC",
        )
        .bind(farm_id)
        .fetch_all(pool)
        .await
    }

    /// Most recently planted first, across all of the owner's farms.
    pub async fn find_by_owner_id(
        pool: &SqlitePool,
        owner_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Crop>(
            "SELECT * FROM crops WHERE owner_id = $1 ORDER BY planting_date DESC, rowid DESC",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateCrop,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Crop>(
            r#"UPDATE crops SET
                crop_type = COALESCE($2, crop_type),
                variety = COALESCE($3, variety),
                planting_date = COALESCE($4, planting_date),
                expected_harvest_date = COALESCE($5, expected_harvest_date),
                actual_harvest_date = COALESCE($6, actual_harvest_date),
                status = COALESCE($7, status),
                expected_yield = COALESCE($8, expected_yield),
                actual_yield = COALESCE($9, actual_yield),
                notes = COALESCE($10, notes),
                updated_at = $11
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(id)
        .bind(&data.crop_type)
        .bind(&data.variety)
        .bind(data.planting_date)
        .bind(data.expected_harvest_date)
        .bind(data.actual_harvest_date)
        .bind(data.status)
        .bind(data.expected_yield)
        .bind(data.actual_yield)
        .bind(&data.notes)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM crops WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn wheat(planted: &str) -> CreateCrop {
        CreateCrop {
            owner_id: "u1".to_string(),
            crop_type: "Wheat".to_string(),
            variety: Some("HD-2967".to_string()),
            planting_date: date(planted),
            expected_harvest_date: date("2025-04-01"),
            status: CropStatus::Planted,
            expected_yield: Some(18.0),
            notes: None,
        }
    }

    #[tokio::test]
    async fn lists_by_planting_date_descending() {
        let db = DBService::in_memory().await.unwrap();
        let farm_id = Uuid::new_v4();
        let early = Crop::create(&db.pool, Uuid::new_v4(), farm_id, &wheat("2024-11-01"))
            .await
            .unwrap();
        let late = Crop::create(&db.pool, Uuid::new_v4(), farm_id, &wheat("2024-11-20"))
            .await
            .unwrap();

        let by_farm = Crop::find_by_farm_id(&db.pool, farm_id).await.unwrap();
        assert_eq!(by_farm[0].id, late.id);
        assert_eq!(by_farm[1].id, early.id);

        let by_owner = Crop::find_by_owner_id(&db.pool, "u1").await.unwrap();
        assert_eq!(by_owner.len(), 2);
    }

    #[tokio::test]
    async fn harvest_update_sets_status_and_yield() {
        let db = DBService::in_memory().await.unwrap();
        let crop = Crop::create(&db.pool, Uuid::new_v4(), Uuid::new_v4(), &wheat("2024-11-01"))
            .await
            .unwrap();

        let harvested = Crop::update(
            &db.pool,
            crop.id,
            &UpdateCrop {
                status: Some(CropStatus::Harvested),
                actual_harvest_date: Some(date("2025-03-28")),
                actual_yield: Some(19.5),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(harvested.status, CropStatus::Harvested);
        assert_eq!(harvested.actual_yield, Some(19.5));
        assert_eq!(harvested.variety.as_deref(), Some("HD-2967"));
    }
}
