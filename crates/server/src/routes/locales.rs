use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use serde::Serialize;
use services::services::{
    config::FirebaseClientConfig,
    locales::{LOCALES, Locale},
};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Serialize)]
pub struct LocaleList {
    pub default_locale: &'static str,
    pub locales: &'static [Locale],
}

pub async fn list_locales(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<LocaleList>> {
    ResponseJson(ApiResponse::success(LocaleList {
        default_locale: deployment.config().default_locale,
        locales: LOCALES,
    }))
}

/// GET /api/client-config
/// Public web client settings for sign-in and uploads.
pub async fn client_config(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<FirebaseClientConfig>>, ApiError> {
    let config = deployment
        .config()
        .firebase
        .clone()
        .ok_or(ApiError::NotConfigured("Client configuration is not available."))?;
    Ok(ResponseJson(ApiResponse::success(config)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/locales", get(list_locales))
        .route("/client-config", get(client_config))
}
