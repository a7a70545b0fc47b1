use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use deployment::Deployment;
use serde::Deserialize;
use services::services::storage::{StoredFile, UploadFolder};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{Json, Path},
};

#[derive(Debug, Deserialize, TS)]
pub struct UploadRequest {
    #[serde(default)]
    pub folder: UploadFolder,
    pub data_uri: String,
}

/// Store a data URI and return the URL to save as `file_url` or `photo_url`.
pub async fn upload_file(
    State(deployment): State<DeploymentImpl>,
    Path(uid): Path<String>,
    Json(payload): Json<UploadRequest>,
) -> Result<ResponseJson<ApiResponse<StoredFile>>, ApiError> {
    let stored = deployment
        .storage()
        .save(&uid, payload.folder, &payload.data_uri)
        .await?;
    Ok(ResponseJson(ApiResponse::success(stored)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/users/{uid}/uploads", post(upload_file))
}
