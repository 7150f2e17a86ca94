//! Re-upload of compiled videos.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use storyreel_storage::UploadedObject;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadVideoResponse {
    pub message: String,
    pub upload_result: UploadedObject,
}

pub const VIDEO_UPLOADED_MESSAGE: &str = "Video uploaded successfully";

/// `POST /upload-video/:videoName`
///
/// Uploads a file that already sits in the videos directory.
pub async fn upload_video(
    State(state): State<AppState>,
    Path(video_name): Path<String>,
) -> ApiResult<Json<UploadVideoResponse>> {
    let upload_result = state
        .pipeline()?
        .upload_local_video(&video_name)
        .await
        .map_err(ApiError::Upload)?;

    Ok(Json(UploadVideoResponse {
        message: VIDEO_UPLOADED_MESSAGE.to_string(),
        upload_result,
    }))
}
