use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde_json::Value;
use tracing::{error, instrument, warn};

use super::dto::{AnalysisRequest, AnalyzeResponse};
use super::services::{analyze_image, AnalyzeError};
use crate::state::AppState;
use crate::validation::parse_body;

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/image-analyze", post(image_analyze))
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let message = match &self {
            AnalyzeError::Upstream(_) | AnalyzeError::EmptyResponse => {
                "analysis service did not answer"
            }
            AnalyzeError::InvalidJson(_) | AnalyzeError::SchemaMismatch(_) => {
                "analysis could not be read"
            }
        };
        (
            StatusCode::BAD_GATEWAY,
            Json(AnalyzeResponse::failure(Value::String(self.to_string()), message)),
        )
            .into_response()
    }
}

/// POST /api/image-analyze { inlineData: { mimeType, data } }
///
/// Validation failures answer 200 with `ok: false`; existing clients branch on
/// the body, not the status.
#[instrument(skip(state, body))]
pub async fn image_analyze(State(state): State<AppState>, body: Bytes) -> Response {
    let req = match parse_body::<AnalysisRequest>(&body) {
        Ok(r) => r,
        Err(issues) => {
            warn!(issues = issues.len(), "invalid analyze request");
            let error = serde_json::to_value(&issues).unwrap_or(Value::Null);
            return Json(AnalyzeResponse::failure(error, "")).into_response();
        }
    };

    match analyze_image(&state, req).await {
        Ok(analysis) => Json(AnalyzeResponse::success(analysis)).into_response(),
        Err(e) => {
            error!(error = %e, "image analysis failed");
            e.into_response()
        }
    }
}
