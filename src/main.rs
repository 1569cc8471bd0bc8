use std::error::Error;
use std::sync::Arc;

use nanogate::config::{GatewayConfig, TextBackend};
use nanogate::gateway::Gateway;
use nanogate::llm::adapters::gemini_agent;
use nanogate::llm::gemini::DEFAULT_API_BASE;
use nanogate::llm::{GeminiClient, LLM};
use nanogate::server::{self, AppState, app_router};
use nanogate::shutdown::CtrlCShutdown;
use nanogate::telemetry::init_tracing;
use nanogate::utils::https::https_client;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load .env before the subscriber reads NANOGATE_LOG_FORMAT and RUST_LOG.
    dotenv::dotenv().ok();
    init_tracing();

    let config = GatewayConfig::from_env().inspect_err(|e| error!("{e}"))?;
    info!(
        text_model = %config.text_model,
        image_models = ?config.image_models,
        max_attempts = config.retry.attempts(),
        retry_candidates = config.retry_candidates,
        "Starting Nano Banana gateway"
    );

    let gemini = Arc::new(
        GeminiClient::new(https_client()?, &config.api_key, &config.text_model)
            .with_base_url(&config.api_base),
    );
    let text: Box<dyn LLM> = match config.text_backend {
        TextBackend::Rest => Box::new(gemini.clone()),
        TextBackend::Rig => {
            if config.api_base != DEFAULT_API_BASE {
                warn!("NANOGATE_API_BASE is ignored by the rig text backend");
            }
            Box::new(gemini_agent(&config.api_key, &config.text_model))
        }
    };

    let gateway = Gateway::new(
        text,
        Some(config.retry.clone()),
        gemini,
        config.selector()?,
    )?;
    let router = app_router(AppState::new(gateway));

    let listener = TcpListener::bind(config.listen_addr()).await?;
    server::serve(listener, router, Box::new(CtrlCShutdown::new())).await?;
    Ok(())
}
