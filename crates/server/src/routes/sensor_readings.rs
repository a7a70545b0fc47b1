use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::sensor_reading::{CreateSensorReading, DEFAULT_READING_LIMIT, SensorReading};
use deployment::Deployment;
use serde::Deserialize;
use services::services::validation::{Validate, ValidationError};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path, Query},
};

const MAX_READING_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    pub limit: Option<i64>,
}

/// GET /api/farms/{farm_id}/sensor-readings?limit=
/// Newest first, `limit` defaults to 50.
pub async fn list_readings(
    State(deployment): State<DeploymentImpl>,
    Path(farm_id): Path<Uuid>,
    Query(query): Query<ReadingsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<SensorReading>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_READING_LIMIT);
    if !(1..=MAX_READING_LIMIT).contains(&limit) {
        return Err(ValidationError::new(
            "limit",
            format!("must be between 1 and {MAX_READING_LIMIT}"),
        )
        .into());
    }
    let readings =
        SensorReading::find_recent_by_farm_id(&deployment.db().pool, farm_id, limit).await?;
    Ok(ResponseJson(ApiResponse::success(readings)))
}

pub async fn create_reading(
    State(deployment): State<DeploymentImpl>,
    Path(farm_id): Path<Uuid>,
    Json(payload): Json<CreateSensorReading>,
) -> Result<ResponseJson<ApiResponse<SensorReading>>, ApiError> {
    payload.validate()?;
    let reading =
        SensorReading::create(&deployment.db().pool, Uuid::new_v4(), farm_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(reading)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route(
        "/farms/{farm_id}/sensor-readings",
        get(list_readings).post(create_reading),
    )
}
