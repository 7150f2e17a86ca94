//! Single image generation handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateImageResponse {
    pub message: String,
    pub filename: String,
}

pub const IMAGE_SAVED_MESSAGE: &str = "Image generated and saved successfully.";

/// `POST /api/v1/generate`
pub async fn generate_image(
    State(state): State<AppState>,
    body: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateImageResponse>> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let prompt = request
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Prompt is required in the request body."))?;

    let saved = state
        .pipeline()?
        .generate_single_image(&prompt)
        .await
        .map_err(ApiError::Image)?;

    Ok(Json(GenerateImageResponse {
        message: IMAGE_SAVED_MESSAGE.to_string(),
        filename: saved.filename,
    }))
}
