use axum::{Router, extract::State, response::Json as ResponseJson, routing::{get, patch}};
use db::models::crop::{CreateCrop, Crop, UpdateCrop};
use deployment::Deployment;
use services::services::validation::Validate;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path},
};

pub async fn list_farm_crops(
    State(deployment): State<DeploymentImpl>,
    Path(farm_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Crop>>>, ApiError> {
    let crops = Crop::find_by_farm_id(&deployment.db().pool, farm_id).await?;
    Ok(ResponseJson(ApiResponse::success(crops)))
}

/// GET /api/users/{uid}/crops
/// Latest planting date first.
pub async fn list_user_crops(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<Crop>>>, ApiError> {
    let crops = Crop::find_by_owner_id(&deployment.db().pool, &uid).await?;
    Ok(ResponseJson(ApiResponse::success(crops)))
}

pub async fn create_crop(
    State(deployment): State<DeploymentImpl>,
    Path(farm_id): Path<Uuid>,
    Json(payload): Json<CreateCrop>,
) -> Result<ResponseJson<ApiResponse<Crop>>, ApiError> {
    payload.validate()?;
    let crop = Crop::create(&deployment.db().pool, Uuid::new_v4(), farm_id, &payload).await?;
    tracing::info!(crop_id = %crop.id, farm_id = %farm_id, "Crop added");
    Ok(ResponseJson(ApiResponse::success(crop)))
}

pub async fn update_crop(
    State(deployment): State<DeploymentImpl>,
    Path(crop_id): Path<Uuid>,
    Json(payload): Json<UpdateCrop>,
) -> Result<ResponseJson<ApiResponse<Crop>>, ApiError> {
    payload.validate()?;
    let crop = Crop::update(&deployment.db().pool, crop_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Crop"))?;
    Ok(ResponseJson(ApiResponse::success(crop)))
}

pub async fn delete_crop(
    State(deployment): State<DeploymentImpl>,
    Path(crop_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if Crop::delete(&deployment.db().pool, crop_id).await? == 0 {
        return Err(ApiError::NotFound("Crop"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route(
            "/farms/{farm_id}/crops",
            get(list_farm_crops).post(create_crop),
        )
        .route("/users/{uid}/crops", get(list_user_crops))
        .route("/crops/{crop_id}", patch(update_crop).delete(delete_crop))
}
