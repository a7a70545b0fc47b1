use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use serde::Serialize;
use services::services::database_validator::{DatabaseHealth, DatabaseValidator};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Serialize, TS)]
pub struct HealthStatus {
    #[ts(type = "string")]
    pub status: &'static str,
    #[ts(type = "string")]
    pub version: &'static str,
    pub llm_configured: bool,
    pub database: DatabaseHealth,
}

pub async fn health_check(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<HealthStatus>>, ApiError> {
    let database = DatabaseValidator::new(deployment.db().pool.clone())
        .validate()
        .await?;
    if !database.is_ok() {
        tracing::warn!(summary = %database.summary(), "Health check found a degraded database");
    }
    Ok(ResponseJson(ApiResponse::success(HealthStatus {
        status: if database.is_ok() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        llm_configured: deployment.flows().llm().is_configured(),
        database,
    })))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/health", get(health_check))
}
