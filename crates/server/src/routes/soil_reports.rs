use axum::{Router, extract::State, response::Json as ResponseJson, routing::{get, patch}};
use db::models::soil_report::{CreateSoilReport, SoilReport, UpdateSoilReport};
use deployment::Deployment;
use services::services::validation::Validate;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path},
};

pub async fn list_soil_reports(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<SoilReport>>>, ApiError> {
    let reports = SoilReport::find_by_owner_id(&deployment.db().pool, &uid).await?;
    Ok(ResponseJson(ApiResponse::success(reports)))
}

pub async fn create_soil_report(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
    Json(payload): Json<CreateSoilReport>,
) -> Result<ResponseJson<ApiResponse<SoilReport>>, ApiError> {
    payload.validate()?;
    let report = SoilReport::create(&deployment.db().pool, Uuid::new_v4(), &uid, &payload).await?;
    tracing::info!(report_id = %report.id, owner_id = %uid, year = report.year, "Soil report saved");
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub async fn update_soil_report(
    State(deployment): State<DeploymentImpl>,
    Path(report_id): Path<Uuid>,
    Json(payload): Json<UpdateSoilReport>,
) -> Result<ResponseJson<ApiResponse<SoilReport>>, ApiError> {
    payload.validate()?;
    let report = SoilReport::update(&deployment.db().pool, report_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Soil report"))?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route(
            "/users/{uid}/soil-reports",
            get(list_soil_reports).post(create_soil_report),
        )
        .route("/soil-reports/{report_id}", patch(update_soil_report))
}
