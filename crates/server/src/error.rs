use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use deployment::DeploymentError;
use services::services::{
    database_validator::DatabaseValidationError,
    flows::FlowError,
    llm_api::LlmApiError,
    market_data::MarketDataError,
    storage::StorageError,
    validation::ValidationError,
    weather::WeatherError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    DatabaseValidation(#[from] DatabaseValidationError),
    #[error("{0}")]
    NotConfigured(&'static str),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Flow(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Weather(WeatherError::LocationNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            ApiError::Database(_) | ApiError::DatabaseValidation(_) => {
                "Database error. Please try again.".to_string()
            }
            ApiError::Flow(FlowError::Llm(LlmApiError::MissingApiKey)) => {
                LlmApiError::MissingApiKey.to_string()
            }
            ApiError::Flow(FlowError::Llm(_)) => {
                "The AI service failed to answer. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(ApiResponse::<()>::error(&self.user_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_status_codes() {
        assert_eq!(
            ApiError::from(ValidationError::new("farm_name", "is required")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("Farm").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::BadRequest("missing field `farm_name`".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FlowError::from(ValidationError::new("query", "is required")))
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FlowError::from(LlmApiError::Timeout)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn hides_database_details() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.user_message(), "Database error. Please try again.");
        assert_eq!(
            ApiError::NotFound("Cultivation plan").user_message(),
            "Cultivation plan not found"
        );
    }

    #[test]
    fn upload_failures_split_by_cause() {
        let rejected = ApiError::from(StorageError::TooLarge);
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let disk = ApiError::from(StorageError::from(std::io::Error::other("disk full")));
        assert_eq!(disk.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(disk.user_message(), "Failed to upload file. Please try again.");
    }
}
