use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::farm::{CreateFarm, Farm, UpdateFarm};
use deployment::Deployment;
use services::services::validation::Validate;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path},
};

/// GET /api/users/{uid}/farms
/// Newest first.
pub async fn list_farms(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<Farm>>>, ApiError> {
    let farms = Farm::find_by_owner_id(&deployment.db().pool, &uid).await?;
    Ok(ResponseJson(ApiResponse::success(farms)))
}

pub async fn create_farm(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
    Json(payload): Json<CreateFarm>,
) -> Result<ResponseJson<ApiResponse<Farm>>, ApiError> {
    payload.validate()?;
    let farm = Farm::create(&deployment.db().pool, Uuid::new_v4(), &uid, &payload).await?;
    tracing::info!(farm_id = %farm.id, owner_id = %uid, "Farm added");
    Ok(ResponseJson(ApiResponse::success(farm)))
}

pub async fn get_farm(
    State(deployment): State<DeploymentImpl>,
    Path(farm_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Farm>>, ApiError> {
    let farm = Farm::find_by_id(&deployment.db().pool, farm_id)
        .await?
        .ok_or(ApiError::NotFound("Farm"))?;
    Ok(ResponseJson(ApiResponse::success(farm)))
}

pub async fn update_farm(
    State(deployment): State<DeploymentImpl>,
    Path(farm_id): Path<Uuid>,
    Json(payload): Json<UpdateFarm>,
) -> Result<ResponseJson<ApiResponse<Farm>>, ApiError> {
    payload.validate()?;
    let farm = Farm::update(&deployment.db().pool, farm_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Farm"))?;
    Ok(ResponseJson(ApiResponse::success(farm)))
}

pub async fn delete_farm(
    State(deployment): State<DeploymentImpl>,
    Path(farm_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if Farm::delete(&deployment.db().pool, farm_id).await? == 0 {
        return Err(ApiError::NotFound("Farm"));
    }
    tracing::info!(farm_id = %farm_id, "Farm deleted");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/users/{uid}/farms", get(list_farms).post(create_farm))
        .route(
            "/farms/{farm_id}",
            get(get_farm).patch(update_farm).delete(delete_farm),
        )
}
