use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::dto::{AnalysisRequest, AnalysisResult};
use crate::gemini::types::{Content, GenerateContentRequest, Part};
use crate::gemini::GeminiError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Upstream(#[from] GeminiError),
    #[error("model response has no text part")]
    EmptyResponse,
    #[error("model answer is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("model answer does not match the analysis schema: {0}")]
    SchemaMismatch(#[source] serde_json::Error),
}

/// Removes ```json / ``` fence markers anywhere in `text`, then trims.
pub fn strip_fences(text: &str) -> String {
    lazy_static! {
        static ref FENCE_RE: Regex = Regex::new(r"```json\n?|\n?```").unwrap();
    }
    FENCE_RE.replace_all(text, "").trim().to_string()
}

/// Parses the model's text answer and checks it against [`AnalysisResult`].
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalyzeError> {
    let cleaned = strip_fences(text);
    let value: Value = serde_json::from_str(&cleaned).map_err(AnalyzeError::InvalidJson)?;
    serde_json::from_value(value).map_err(AnalyzeError::SchemaMismatch)
}

fn build_request(st: &AppState, req: AnalysisRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(vec![
            Part::inline(req.inline_data),
            Part::text(st.config.prompt.text.clone()),
        ])],
        generation_config: None,
    }
}

pub async fn analyze_image(
    st: &AppState,
    req: AnalysisRequest,
) -> Result<AnalysisResult, AnalyzeError> {
    let model = &st.config.gemini.analysis_model;
    info!(
        %model,
        prompt_version = %st.config.prompt.version,
        mime_type = %req.inline_data.mime_type,
        "analyzing image"
    );

    let response = st
        .model
        .generate_content(model, &build_request(st, req))
        .await?;
    let finish_reason = response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref());
    let text = response.first_text().ok_or(AnalyzeError::EmptyResponse)?;
    debug!(chars = text.len(), ?finish_reason, "model answered");

    parse_analysis(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fakes::analysis_template as template;
    use serde_json::json;

    #[test]
    fn strip_fences_handles_json_fence() {
        let fenced = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_fences(fenced), "{\"a\":1}");
    }

    #[test]
    fn strip_fences_leaves_plain_text() {
        assert_eq!(strip_fences("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn strip_fences_removes_bare_fences() {
        assert_eq!(strip_fences("```\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_fences("```json[1]```").as_str(), "[1]");
    }

    #[test]
    fn parse_analysis_returns_identical_value() {
        let fenced = format!("```json\n{}\n```", serde_json::to_string_pretty(&template()).unwrap());
        let parsed = parse_analysis(&fenced).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), template());
    }

    #[test]
    fn parse_analysis_rejects_prose() {
        let err = parse_analysis("Lo siento, no puedo identificar la comida.").unwrap_err();
        assert!(matches!(err, AnalyzeError::InvalidJson(_)));
    }

    #[test]
    fn parse_analysis_rejects_wrong_shape() {
        let err = parse_analysis(r#"{"foodAnalysis":{"identifiedFood":"pan"}}"#).unwrap_err();
        assert!(matches!(err, AnalyzeError::SchemaMismatch(_)));
    }

    #[test]
    fn parse_analysis_drops_unknown_keys() {
        let mut v = template();
        v["foodAnalysis"]["confidence"] = json!("alta");
        let parsed = parse_analysis(&v.to_string()).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), template());
    }
}
