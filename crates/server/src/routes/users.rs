use axum::{Router, extract::State, response::Json as ResponseJson, routing::put};
use db::models::user_profile::{CreateUserProfile, UpdateUserProfile, UserProfile};
use deployment::Deployment;
use services::services::validation::{Validate, required};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path},
};

/// PUT /api/users/{uid}
/// Create the profile, replacing any existing one.
pub async fn put_profile(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
    Json(payload): Json<CreateUserProfile>,
) -> Result<ResponseJson<ApiResponse<UserProfile>>, ApiError> {
    required("uid", &uid)?;
    payload.validate()?;
    let profile = UserProfile::upsert(&deployment.db().pool, &uid, &payload).await?;
    tracing::info!(uid = %uid, "User profile saved");
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub async fn get_profile(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
) -> Result<ResponseJson<ApiResponse<UserProfile>>, ApiError> {
    let profile = UserProfile::find_by_uid(&deployment.db().pool, &uid)
        .await?
        .ok_or(ApiError::NotFound("User profile"))?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub async fn update_profile(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
    Json(payload): Json<UpdateUserProfile>,
) -> Result<ResponseJson<ApiResponse<UserProfile>>, ApiError> {
    payload.validate()?;
    let profile = UserProfile::update(&deployment.db().pool, &uid, &payload)
        .await?
        .ok_or(ApiError::NotFound("User profile"))?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route(
        "/users/{uid}",
        put(put_profile).get(get_profile).patch(update_profile),
    )
}
