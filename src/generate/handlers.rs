use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use tracing::{error, instrument, warn};

use super::dto::{GenerationRequest, MessageResponse};
use super::services::{generate_image, GenerateError};
use crate::state::AppState;
use crate::validation::parse_body;

pub fn generate_routes() -> Router<AppState> {
    Router::new().route("/image-generate", post(image_generate))
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        match self {
            GenerateError::NoImage => (
                StatusCode::NOT_FOUND,
                Json(MessageResponse::new("No image found")),
            )
                .into_response(),
            GenerateError::Upstream(_)
            | GenerateError::NoResponse
            | GenerateError::InvalidImage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new("error")),
            )
                .into_response(),
        }
    }
}

fn png(bytes: Bytes) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CONTENT_DISPOSITION, "inline; filename=\"image.png\""),
        ],
        bytes,
    )
        .into_response()
}

/// POST /api/image-generate { prompt } → raw PNG bytes
#[instrument(skip(state, body))]
pub async fn image_generate(State(state): State<AppState>, body: Bytes) -> Response {
    let req = match parse_body::<GenerationRequest>(&body) {
        Ok(r) => r,
        Err(issues) => {
            warn!(issues = issues.len(), "invalid generate request");
            return (
                StatusCode::NOT_FOUND,
                Json(MessageResponse {
                    message: "Prompt incorrecto".into(),
                    error: Some(issues),
                }),
            )
                .into_response();
        }
    };

    match generate_image(&state, req).await {
        Ok(bytes) => png(bytes),
        Err(GenerateError::NoImage) => {
            warn!("model answered without an image");
            GenerateError::NoImage.into_response()
        }
        Err(e) => {
            error!(error = %e, "image generation failed");
            e.into_response()
        }
    }
}
