use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use chrono::Utc;
use db::models::cultivation_plan::{
    CreateCultivationPlan, CultivationPlan, UpdateCultivationPlan,
};
use deployment::Deployment;
use serde::Deserialize;
use services::services::{
    plan_progress::PlanProgress,
    validation::{Validate, ValidationError, iso_date},
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path, Query},
};

pub async fn list_plans(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<CultivationPlan>>>, ApiError> {
    let plans = CultivationPlan::find_by_owner_id(&deployment.db().pool, &uid).await?;
    Ok(ResponseJson(ApiResponse::success(plans)))
}

/// POST /api/users/{uid}/plans
/// Save a generated plan for the user.
pub async fn create_plan(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
    Json(payload): Json<CreateCultivationPlan>,
) -> Result<ResponseJson<ApiResponse<CultivationPlan>>, ApiError> {
    payload.validate()?;
    let plan =
        CultivationPlan::create(&deployment.db().pool, Uuid::new_v4(), &uid, &payload).await?;
    tracing::info!(
        plan_id = %plan.id,
        owner_id = %uid,
        weeks = plan.weeks().len(),
        "Cultivation plan saved"
    );
    Ok(ResponseJson(ApiResponse::success(plan)))
}

pub async fn get_plan(
    State(deployment): State<DeploymentImpl>,
    Path(plan_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<CultivationPlan>>, ApiError> {
    let plan = CultivationPlan::find_by_id(&deployment.db().pool, plan_id)
        .await?
        .ok_or(ApiError::NotFound("Cultivation plan"))?;
    Ok(ResponseJson(ApiResponse::success(plan)))
}

pub async fn update_plan(
    State(deployment): State<DeploymentImpl>,
    Path(plan_id): Path<Uuid>,
    Json(payload): Json<UpdateCultivationPlan>,
) -> Result<ResponseJson<ApiResponse<CultivationPlan>>, ApiError> {
    if payload.plan.as_ref().is_some_and(|weeks| weeks.is_empty()) {
        return Err(ValidationError::new("plan", "must contain at least one week").into());
    }
    let plan = CultivationPlan::update(&deployment.db().pool, plan_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Cultivation plan"))?;
    Ok(ResponseJson(ApiResponse::success(plan)))
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    /// Defaults to the current UTC date.
    pub today: Option<String>,
}

/// GET /api/plans/{plan_id}/progress
pub async fn get_progress(
    State(deployment): State<DeploymentImpl>,
    Path(plan_id): Path<Uuid>,
    Query(query): Query<ProgressQuery>,
) -> Result<ResponseJson<ApiResponse<PlanProgress>>, ApiError> {
    let today = match query.today.as_deref() {
        Some(raw) => iso_date("today", raw)?,
        None => Utc::now().date_naive(),
    };
    let plan = CultivationPlan::find_by_id(&deployment.db().pool, plan_id)
        .await?
        .ok_or(ApiError::NotFound("Cultivation plan"))?;
    let progress = PlanProgress::compute(plan.weeks(), plan.sowing_date, today);
    Ok(ResponseJson(ApiResponse::success(progress)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/users/{uid}/plans", get(list_plans).post(create_plan))
        .route("/plans/{plan_id}", get(get_plan).patch(update_plan))
        .route("/plans/{plan_id}/progress", get(get_progress))
}
