use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use serde::Deserialize;
use services::services::{validation::min_chars, weather::WeatherData};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, extract::Query};

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    #[serde(default)]
    pub location: String,
}

/// GET /api/weather?location=
pub async fn get_weather(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<WeatherQuery>,
) -> Result<ResponseJson<ApiResponse<WeatherData>>, ApiError> {
    min_chars("location", &query.location, 2)?;
    let weather = deployment.weather().current(query.location.trim()).await?;
    Ok(ResponseJson(ApiResponse::success(weather)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/weather", get(get_weather))
}
