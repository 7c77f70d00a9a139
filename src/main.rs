mod analyze;
mod app;
mod config;
mod gemini;
mod generate;
mod prompt;
mod state;
mod validation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nutrilens=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init()?;
    tracing::info!(
        analysis_model = %app_state.config.gemini.analysis_model,
        generation_model = %app_state.config.gemini.generation_model,
        prompt_version = %app_state.config.prompt.version,
        "gemini configured"
    );

    app::serve(app::build_app(app_state)).await
}
