use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

pub const DEFAULT_READING_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display)]
#[sqlx(type_name = "sensor_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Humidity,
    SoilMoisture,
    Ph,
    Light,
    Rainfall,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct SensorReading {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: SensorKind,
    pub value: f64,
    pub unit: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateSensorReading {
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: SensorKind,
    pub value: f64,
    pub unit: String,
    pub location: Option<String>,
}

impl SensorReading {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        farm_id: Uuid,
        data: &CreateSensorReading,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SensorReading>(
            r#"INSERT INTO sensor_readings
                (id, farm_id, sensor_id, timestamp, kind, value, unit, location, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *"#,
        )
        .bind(id)
        .bind(farm_id)
        .bind(&data.sensor_id)
        .bind(data.timestamp)
        .bind(data.kind)
        .bind(data.value)
        .bind(&data.unit)
        .bind(&data.location)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Latest readings first, at most `limit` of them.
    pub async fn find_recent_by_farm_id(
        pool: &SqlitePool,
        farm_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SensorReading>(
            r#"SELECT * FROM sensor_readings
            WHERE farm_id = $1
            ORDER BY timestamp DESC, rowid DESC
            LIMIT $2"#,
        )
        .bind(farm_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn recent_readings_are_limited_and_ordered() {
        let db = DBService::in_memory().await.unwrap();
        let farm_id = Uuid::new_v4();
        let base = Utc::now();

        for minutes in 0..5 {
            SensorReading::create(
                &db.pool,
                Uuid::new_v4(),
                farm_id,
                &CreateSensorReading {
                    sensor_id: "soil-sensor-1".to_string(),
                    timestamp: base + Duration::minutes(minutes),
                    kind: SensorKind::SoilMoisture,
                    value: 30.0 + minutes as f64,
                    unit: "%".to_string(),
                    location: None,
                },
            )
            .await
            .unwrap();
        }

        let readings = SensorReading::find_recent_by_farm_id(&db.pool, farm_id, 3)
            .await
            .unwrap();
        let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![34.0, 33.0, 32.0]);
        assert_eq!(readings[0].kind, SensorKind::SoilMoisture);
    }
}
