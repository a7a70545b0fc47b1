use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// Farmer profile keyed by the identity provider's uid.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub location: Option<String>,
    pub land_size_acres: Option<f64>,
    pub soil_type: Option<String>,
    pub water_source: Option<String>,
    pub annual_budget: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUserProfile {
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub location: Option<String>,
    pub land_size_acres: Option<f64>,
    pub soil_type: Option<String>,
    pub water_source: Option<String>,
    pub annual_budget: Option<String>,
}

/// Merge update: absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateUserProfile {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub location: Option<String>,
    pub land_size_acres: Option<f64>,
    pub soil_type: Option<String>,
    pub water_source: Option<String>,
    pub annual_budget: Option<String>,
}

impl UserProfile {
    /// Create the profile, overwriting any previous document with the same uid.
    pub async fn upsert(
        pool: &SqlitePool,
        uid: &str,
        data: &CreateUserProfile,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, UserProfile>(
            r#"INSERT INTO user_profiles
                (uid, email, display_name, photo_url, location, land_size_acres,
                 soil_type, water_source, annual_budget, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            ON CONFLICT(uid) DO UPDATE SET
                email = excluded.email,
                display_name = excluded.display_name,
                photo_url = excluded.photo_url,
                location = excluded.location,
                land_size_acres = excluded.land_size_acres,
                soil_type = excluded.soil_type,
                water_source = excluded.water_source,
                annual_budget = excluded.annual_budget,
                updated_at = excluded.updated_at
            RETURNING *"#,
        )
        .bind(uid)
        .bind(&data.email)
        .bind(&data.display_name)
        .bind(&data.photo_url)
        .bind(&data.location)
        .bind(data.land_size_acres)
        .bind(&data.soil_type)
        .bind(&data.water_source)
        .bind(&data.annual_budget)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_uid(pool: &SqlitePool, uid: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE uid = $1")
            .bind(uid)
            .fetch_optional(pool)
            .await
    }

    /// Returns `None` when no profile exists for `uid`.
    pub async fn update(
        pool: &SqlitePool,
        uid: &str,
        data: &UpdateUserProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"UPDATE user_profiles SET
                email = COALESCE($2, email),
                display_name = COALESCE($3, display_name),
                photo_url = COALESCE($4, photo_url),
                location = COALESCE($5, location),
                land_size_acres = COALESCE($6, land_size_acres),
                soil_type = COALESCE($7, soil_type),
                water_source = COALESCE($8, water_source),
                annual_budget = COALESCE($9, annual_budget),
                updated_at = $10
            WHERE uid = $1
            RETURNING *"#,
        )
        .bind(uid)
        .bind(&data.email)
        .bind(&data.display_name)
        .bind(&data.photo_url)
        .bind(&data.location)
        .bind(data.land_size_acres)
        .bind(&data.soil_type)
        .bind(&data.water_source)
        .bind(&data.annual_budget)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn profile() -> CreateUserProfile {
        CreateUserProfile {
            email: "asha@example.com".to_string(),
            display_name: "Asha".to_string(),
            photo_url: None,
            location: Some("Nashik".to_string()),
            land_size_acres: Some(2.5),
            soil_type: Some("Black Soil".to_string()),
            water_source: None,
            annual_budget: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_merge_update() {
        let db = DBService::in_memory().await.unwrap();

        let created = UserProfile::upsert(&db.pool, "uid-1", &profile()).await.unwrap();
        assert_eq!(created.display_name, "Asha");

        let updated = UserProfile::update(
            &db.pool,
            "uid-1",
            &UpdateUserProfile {
                water_source: Some("Borewell".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.water_source.as_deref(), Some("Borewell"));
        assert_eq!(updated.location.as_deref(), Some("Nashik"));
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_missing_profile_is_none() {
        let db = DBService::in_memory().await.unwrap();
        let result = UserProfile::update(&db.pool, "ghost", &UpdateUserProfile::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(UserProfile::find_by_uid(&db.pool, "ghost").await.unwrap().is_none());
    }
}
