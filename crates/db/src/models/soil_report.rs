use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display)]
#[sqlx(type_name = "report_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportType {
    Pdf,
    Image,
    Manual,
}

/// Laboratory values; any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct SoilData {
    pub ph: Option<f64>,
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
    pub organic_matter: Option<f64>,
    pub notes: Option<String>,
}

impl SoilData {
    /// Human readable summary in the form farmers type into the advice forms.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ph) = self.ph {
            parts.push(format!("pH: {ph}"));
        }
        if let Some(n) = self.nitrogen {
            parts.push(format!("Nitrogen: {n} kg/ha"));
        }
        if let Some(p) = self.phosphorus {
            parts.push(format!("Phosphorus: {p} kg/ha"));
        }
        if let Some(k) = self.potassium {
            parts.push(format!("Potassium: {k} kg/ha"));
        }
        if let Some(om) = self.organic_matter {
            parts.push(format!("Organic matter: {om}%"));
        }
        if let Some(notes) = self.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            parts.push(notes.trim().to_string());
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct SoilReport {
    pub id: Uuid,
    pub owner_id: String,
    pub farm_id: Option<Uuid>,
    pub year: i32,
    pub report_type: ReportType,
    pub file_url: Option<String>,
    #[ts(as = "SoilData")]
    pub data: Json<SoilData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateSoilReport {
    pub farm_id: Option<Uuid>,
    pub year: i32,
    pub report_type: ReportType,
    pub file_url: Option<String>,
    #[serde(default)]
    pub data: SoilData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateSoilReport {
    pub year: Option<i32>,
    pub report_type: Option<ReportType>,
    pub file_url: Option<String>,
    pub data: Option<SoilData>,
}

impl SoilReport {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        owner_id: &str,
        data: &CreateSoilReport,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SoilReport>(
            r#"INSERT INTO soil_reports
                (id, owner_id, farm_id, year, report_type, file_url, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *"#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(data.farm_id)
        .bind(data.year)
        .bind(data.report_type)
        .bind(&data.file_url)
        .bind(Json(&data.data))
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Most recent year first.
    pub async fn find_by_owner_id(
        pool: &SqlitePool,
        owner_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SoilReport>(
            "SELECT * FROM soil_reports WHERE owner_id = $1 ORDER BY year DESC, rowid DESC",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    /// `data`, when given, replaces the stored values as a whole.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateSoilReport,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SoilReport>(
            r#"UPDATE soil_reports SET
                year = COALESCE($2, year),
                report_type = COALESCE($3, report_type),
                file_url = COALESCE($4, file_url),
                data = COALESCE($5, data),
                updated_at = $6
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(id)
        .bind(data.year)
        .bind(data.report_type)
        .bind(&data.file_url)
        .bind(data.data.as_ref().map(Json))
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }
}
