//! Story-to-reel handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use storyreel_models::StoryReport;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StoryRequest {
    #[serde(default)]
    pub story: Option<String>,
}

/// `POST /api/v1/story-to-images`
///
/// Runs the whole pipeline and returns the report, including partial
/// outcomes such as failed scenes or a missing video.
pub async fn story_to_reel(
    State(state): State<AppState>,
    body: Result<Json<StoryRequest>, JsonRejection>,
) -> ApiResult<Json<StoryReport>> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let story = request
        .story
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Story content is required in the request body."))?;

    let pipeline = state.pipeline()?;
    info!("Processing story ({} chars)", story.len());

    let report = pipeline.process_story(&story).await.map_err(ApiError::Story)?;
    Ok(Json(report))
}
