use crate::config::AppConfig;
use crate::gemini::{GeminiClient, GenerativeModel};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub model: Arc<dyn GenerativeModel>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let model = Arc::new(GeminiClient::new(&config.gemini)?) as Arc<dyn GenerativeModel>;
        Ok(Self { config, model })
    }

    #[cfg(test)]
    pub fn fake(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            config: Arc::new(AppConfig::for_tests()),
            model,
        }
    }
}
