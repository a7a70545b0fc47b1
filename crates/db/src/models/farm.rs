use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Farm {
    pub id: Uuid,
    pub owner_id: String,
    pub farm_name: String,
    pub location: String,
    pub district: String,
    pub size_acres: f64,
    pub soil_type: String,
    pub topography: String,
    pub water_source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFarm {
    pub farm_name: String,
    pub location: String,
    pub district: String,
    pub size_acres: f64,
    pub soil_type: String,
    pub topography: String,
    pub water_source: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateFarm {
    pub farm_name: Option<String>,
    pub location: Option<String>,
    pub district: Option<String>,
    pub size_acres: Option<f64>,
    pub soil_type: Option<String>,
    pub topography: Option<String>,
    pub water_source: Option<String>,
}

impl Farm {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        owner_id: &str,
        data: &CreateFarm,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Farm>(
            r#"INSERT INTO farms
                (id, owner_id, farm_name, location, district, size_acres,
                 soil_type, topography, water_source, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *"#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&data.farm_name)
        .bind(&data.location)
        .bind(&data.district)
        .bind(data.size_acres)
        .bind(&data.soil_type)
        .bind(&data.topography)
        .bind(&data.water_source)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Farm>("SELECT * FROM farms WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Newest first.
    pub async fn find_by_owner_id(
        pool: &SqlitePool,
        owner_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Farm>(
            "SELECT * FROM farms WHERE owner_id = $1 ORDER BY created_at DESC, rowid DESC",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateFarm,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Farm>(
            r#"UPDATE farms SET
                farm_name = COALESCE($2, farm_name),
                location = COALESCE($3, location),
                district = COALESCE($4, district),
                size_acres = COALESCE($5, size_acres),
                soil_type = COALESCE($6, soil_type),
                topography = COALESCE($7, topography),
                water_source = COALESCE($8, water_source),
                updated_at = $9
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(id)
        .bind(&data.farm_name)
        .bind(&data.location)
        .bind(&data.district)
        .bind(data.size_acres)
        .bind(&data.soil_type)
        .bind(&data.topography)
        .bind(&data.water_source)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    /// Crops, readings and plans referencing the farm are left in place.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM farms WHERE id = $1")
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

    pub(crate) fn sample_farm(name: &str) -> CreateFarm {
        CreateFarm {
            farm_name: name.to_string(),
            location: "Pimpalgaon".to_string(),
            district: "Nashik".to_string(),
            size_acres: 3.0,
            soil_type: "Black Soil".to_string(),
            topography: "Flat".to_string(),
            water_source: "Canal".to_string(),
        }
    }

    #[tokio::test]
    async fn lists_owner_farms_newest_first() {
        let db = DBService::in_memory().await.unwrap();
        let first = Farm::create(&db.pool, Uuid::new_v4(), "u1", &sample_farm("North"))
            .await
            .unwrap();
        let second = Farm::create(&db.pool, Uuid::new_v4(), "u1", &sample_farm("South"))
            .await
            .unwrap();
        Farm::create(&db.pool, Uuid::new_v4(), "u2", &sample_farm("Other"))
            .await
            .unwrap();

        let farms = Farm::find_by_owner_id(&db.pool, "u1").await.unwrap();
        let ids: Vec<Uuid> = farms.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn update_merges_and_delete_removes() {
        let db = DBService::in_memory().await.unwrap();
        let farm = Farm::create(&db.pool, Uuid::new_v4(), "u1", &sample_farm("North"))
            .await
            .unwrap();

        let updated = Farm::update(
            &db.pool,
            farm.id,
            &UpdateFarm {
                size_acres: Some(4.5),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.size_acres, 4.5);
        assert_eq!(updated.farm_name, "North");

        assert_eq!(Farm::delete(&db.pool, farm.id).await.unwrap(), 1);
        assert!(Farm::find_by_id(&db.pool, farm.id).await.unwrap().is_none());
        assert_eq!(Farm::delete(&db.pool, farm.id).await.unwrap(), 0);
    }
}
