use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::prompt::AnalysisPrompt;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
const DEFAULT_BODY_LIMIT_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub analysis_model: String,
    pub generation_model: String,
    pub timeout_secs: Option<u64>,
}

impl GeminiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .with_context(|| format!("{} has invalid value {:?}", key, v))
        })
        .transpose()
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub prompt: AnalysisPrompt,
    pub body_limit_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the
    /// process environment.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let timeout_secs = parse_var::<u64>(&var, "UPSTREAM_TIMEOUT_SECS")?;
        anyhow::ensure!(
            timeout_secs != Some(0),
            "UPSTREAM_TIMEOUT_SECS must be greater than zero; unset it to disable the timeout"
        );

        let gemini = GeminiConfig {
            api_key: var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?,
            base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            analysis_model: var("ANALYSIS_MODEL").unwrap_or_else(|| DEFAULT_ANALYSIS_MODEL.into()),
            generation_model: var("GENERATION_MODEL")
                .unwrap_or_else(|| DEFAULT_GENERATION_MODEL.into()),
            timeout_secs,
        };

        let prompt = match var("ANALYSIS_PROMPT_FILE") {
            Some(path) => {
                let version = var("ANALYSIS_PROMPT_VERSION").unwrap_or_else(|| "custom".into());
                AnalysisPrompt::from_file(&path, version)?
            }
            None => AnalysisPrompt::builtin(),
        };

        let body_limit_bytes =
            parse_var::<usize>(&var, "BODY_LIMIT_BYTES")?.unwrap_or(DEFAULT_BODY_LIMIT_BYTES);

        Ok(Self {
            gemini,
            prompt,
            body_limit_bytes,
        })
    }

    /// Config used by unit tests; never talks to a real endpoint.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            gemini: GeminiConfig {
                api_key: "test-key".into(),
                base_url: "http://127.0.0.1:0".into(),
                analysis_model: DEFAULT_ANALYSIS_MODEL.into(),
                generation_model: DEFAULT_GENERATION_MODEL.into(),
                timeout_secs: None,
            },
            prompt: AnalysisPrompt::builtin(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}
