use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, error};

use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::config::GeminiConfig;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("gemini request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gemini returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("gemini response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can answer a `generateContent` call.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(!cfg.api_key.trim().is_empty(), "gemini api key is empty");
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = cfg.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = self.endpoint(model);
        debug!(%model, "calling gemini generateContent");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(%model, %status, "gemini api error");
            return Err(GeminiError::Status { status, body });
        }

        debug!(%model, bytes = body.len(), "gemini responded");
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::types::{Content, InlineData, Part};
    use axum::{extract::Path, http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1beta", addr)
    }

    fn config(base_url: String) -> GeminiConfig {
        GeminiConfig {
            api_key: "secret-key".into(),
            base_url,
            analysis_model: "gemini-2.0-flash".into(),
            generation_model: "gemini-2.0-flash-preview-image-generation".into(),
            timeout_secs: Some(5),
        }
    }

    fn image_request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline(InlineData {
                    mime_type: "image/jpeg".into(),
                    data: "AAECAw==".into(),
                }),
                Part::text("describe"),
            ])],
            generation_config: None,
        }
    }

    #[test]
    fn rejects_blank_api_key() {
        let mut cfg = config("http://localhost".into());
        cfg.api_key = "  ".into();
        assert!(GeminiClient::new(&cfg).is_err());
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let client = GeminiClient::new(&config("http://localhost/v1beta/".into())).unwrap();
        assert_eq!(
            client.endpoint("gemini-2.0-flash"),
            "http://localhost/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn sends_key_and_wire_body() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|Path(call): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
                let key = headers
                    .get("x-goog-api-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [{ "text": format!("{}|{}|{}", call, key, body["contents"][0]["parts"][0]["inlineData"]["data"].as_str().unwrap_or_default()) }]
                        }
                    }]
                }))
            }),
        );
        let base = spawn_stub(router).await;
        let client = GeminiClient::new(&config(base)).unwrap();

        let resp = client
            .generate_content("gemini-2.0-flash", &image_request())
            .await
            .expect("stub call");
        assert_eq!(
            resp.first_text(),
            Some("gemini-2.0-flash:generateContent|secret-key|AAECAw==")
        );
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async {
                (
                    axum::http::StatusCode::FORBIDDEN,
                    Json(json!({ "error": { "code": 403, "message": "API key not valid" } })),
                )
            }),
        );
        let base = spawn_stub(router).await;
        let client = GeminiClient::new(&config(base)).unwrap();

        let err = client
            .generate_content("gemini-2.0-flash", &image_request())
            .await
            .unwrap_err();
        match err {
            GeminiError::Status { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert!(body.contains("API key not valid"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let router = Router::new().route("/v1beta/models/:call", post(|| async { "not json" }));
        let base = spawn_stub(router).await;
        let client = GeminiClient::new(&config(base)).unwrap();

        let err = client
            .generate_content("gemini-2.0-flash", &image_request())
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::Decode(_)));
    }
}
