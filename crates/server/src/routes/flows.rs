//! One POST endpoint per AI flow.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use deployment::Deployment;
use services::services::flows::{
    FlowError,
    chatbot::{ChatInput, ChatOutput, ChatbotFlow},
    crop_recommendation::{
        CropRecommendationFlow, CropRecommendationInput, CropRecommendationOutput,
    },
    cultivation_plan::{CultivationPlanFlow, CultivationPlanInput, CultivationPlanOutput},
    disease_detection::{DiseaseDetectionFlow, DiseaseDetectionInput, DiseaseDetectionOutput},
    farming_advice::{FarmingAdviceFlow, FarmingAdviceInput, FarmingAdviceOutput},
    plan_document::{PlanDocument, PlanDocumentFlow, PlanDocumentInput},
};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, extract::Json};

pub async fn crop_recommendation(
    State(deployment): State<DeploymentImpl>,
    Json(input): Json<CropRecommendationInput>,
) -> Result<ResponseJson<ApiResponse<CropRecommendationOutput>>, ApiError> {
    let output = deployment
        .flows()
        .run(&CropRecommendationFlow, &input)
        .await?;
    Ok(ResponseJson(ApiResponse::success(output)))
}

pub async fn disease_detection(
    State(deployment): State<DeploymentImpl>,
    Json(input): Json<DiseaseDetectionInput>,
) -> Result<ResponseJson<ApiResponse<DiseaseDetectionOutput>>, ApiError> {
    let output = DiseaseDetectionFlow.diagnose(deployment.flows(), &input).await?;
    tracing::info!(
        disease = %output.disease,
        confidence = output.confidence,
        "Disease detection finished"
    );
    Ok(ResponseJson(ApiResponse::success(output)))
}

pub async fn chat(
    State(deployment): State<DeploymentImpl>,
    Json(input): Json<ChatInput>,
) -> Result<ResponseJson<ApiResponse<ChatOutput>>, ApiError> {
    let output = deployment.flows().run(&ChatbotFlow, &input).await?;
    Ok(ResponseJson(ApiResponse::success(output)))
}

pub async fn farming_advice(
    State(deployment): State<DeploymentImpl>,
    Json(input): Json<FarmingAdviceInput>,
) -> Result<ResponseJson<ApiResponse<FarmingAdviceOutput>>, ApiError> {
    let flow = FarmingAdviceFlow::new(deployment.weather().clone());
    let output = deployment.flows().run(&flow, &input).await?;
    Ok(ResponseJson(ApiResponse::success(output)))
}

pub async fn cultivation_plan(
    State(deployment): State<DeploymentImpl>,
    Json(input): Json<CultivationPlanInput>,
) -> Result<ResponseJson<ApiResponse<CultivationPlanOutput>>, ApiError> {
    let flow = CultivationPlanFlow::new(deployment.weather().clone());
    let output = deployment.flows().run(&flow, &input).await?;
    if output.cultivation_plan.is_empty() {
        return Err(FlowError::EmptyAnswer("Failed to generate a cultivation plan.").into());
    }
    Ok(ResponseJson(ApiResponse::success(output)))
}

pub async fn plan_document(
    State(deployment): State<DeploymentImpl>,
    Json(input): Json<PlanDocumentInput>,
) -> Result<ResponseJson<ApiResponse<PlanDocument>>, ApiError> {
    let document = PlanDocumentFlow.generate(deployment.flows(), &input).await?;
    Ok(ResponseJson(ApiResponse::success(document)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/flows",
        Router::new()
            .route("/crop-recommendation", post(crop_recommendation))
            .route("/disease-detection", post(disease_detection))
            .route("/chat", post(chat))
            .route("/farming-advice", post(farming_advice))
            .route("/cultivation-plan", post(cultivation_plan))
            .route("/plan-document", post(plan_document)),
    )
}
