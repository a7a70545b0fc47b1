use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::{get, post},
};
use db::models::market_price::CropPrice;
use deployment::Deployment;
use serde::Deserialize;
use serde_json::json;
use services::services::{
    flows::market_prices::{MarketPriceSyncFlow, MarketSyncInput, MarketSyncReport},
    market_data::{MandiRecord, ProductionRecord, SeedMarketPrice},
    validation::required,
};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Query},
};

/// Bare `{message}` body used by the dashboard price widgets.
pub struct PriceFetchError(&'static str);

impl IntoResponse for PriceFetchError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ResponseJson(json!({ "message": self.0 })),
        )
            .into_response()
    }
}

/// GET /api/prices/crops
pub async fn get_crop_prices(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<Vec<CropPrice>>, PriceFetchError> {
    CropPrice::find_all(&deployment.db().pool)
        .await
        .map(ResponseJson)
        .map_err(|e| {
            tracing::error!(error = %e, "API Error fetching crop prices");
            PriceFetchError("Failed to fetch crop prices")
        })
}

/// GET /api/prices/seeds
pub async fn get_seed_prices(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<Vec<SeedMarketPrice>>, PriceFetchError> {
    deployment
        .market_data()
        .seed_prices()
        .await
        .map(ResponseJson)
        .map_err(|e| {
            tracing::error!(error = %e, "API Error fetching seed prices");
            PriceFetchError("Failed to fetch seed prices")
        })
}

/// GET /api/prices/mandi
pub async fn get_mandi_prices(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<MandiRecord>>>, ApiError> {
    let records = deployment.market_data().latest_crop_prices().await?;
    Ok(ResponseJson(ApiResponse::success(records)))
}

#[derive(Debug, Deserialize)]
pub struct ProductionQuery {
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub season: String,
}

/// GET /api/prices/production?district=&season=
pub async fn get_production(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<ProductionQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ProductionRecord>>>, ApiError> {
    required("district", &query.district)?;
    required("season", &query.season)?;
    let records = deployment
        .market_data()
        .production_data(query.district.trim(), query.season.trim())
        .await?;
    Ok(ResponseJson(ApiResponse::success(records)))
}

/// POST /api/prices/sync
/// Ask the model for fresh prices and store them.
pub async fn sync_prices(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<MarketSyncInput>,
) -> Result<ResponseJson<ApiResponse<MarketSyncReport>>, ApiError> {
    let flow = MarketPriceSyncFlow::new(deployment.db().pool.clone());
    let report = flow.sync(deployment.flows(), &payload).await?;
    tracing::info!(
        crops = report.crop_prices_updated,
        seeds = report.seed_prices_updated,
        "Market prices synced"
    );
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/prices",
        Router::new()
            .route("/crops", get(get_crop_prices))
            .route("/seeds", get(get_seed_prices))
            .route("/mandi", get(get_mandi_prices))
            .route("/production", get(get_production))
            .route("/sync", post(sync_prices)),
    )
}
