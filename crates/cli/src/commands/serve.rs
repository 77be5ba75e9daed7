//! `laxbot serve` — wire up the full pipeline and start the gateway.
//!
//! This is the composition root: every component is constructed here and
//! handed to the gateway behind an `Arc`.

use std::path::Path;
use std::sync::Arc;

use laxbot_auth::AuthGuard;
use laxbot_chat::{ChatOrchestrator, QuizGenerator};
use laxbot_config::AppConfig;
use laxbot_core::KeyValueStore;
use laxbot_gateway::{build_router, AppState};
use laxbot_providers::OpenAiProvider;
use laxbot_store::{InMemoryStore, SessionStore, SqliteStore};

pub async fn run(
    config_path: &Path,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load(config_path)?;
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let Some(token_secret) = config.auth.token_secret.clone() else {
        return Err("No token secret configured; set LAXBOT_TOKEN_SECRET".into());
    };
    let Some(api_key) = config.provider.api_key.clone() else {
        return Err("No provider API key configured; set LAXBOT_API_KEY".into());
    };

    let kv: Arc<dyn KeyValueStore> = match config.store.backend.as_str() {
        "in_memory" => Arc::new(InMemoryStore::new()),
        _ => Arc::new(SqliteStore::new(&config.store.path).await?),
    };
    let sessions = Arc::new(SessionStore::new(kv.clone(), config.store.page_size));
    let guard = Arc::new(AuthGuard::new(token_secret.into_bytes(), kv));
    let provider = Arc::new(OpenAiProvider::new(
        "openai",
        config.provider.api_url.clone(),
        api_key,
    )?);
    let registry = Arc::new(laxbot_tools::default_registry(&config.tools));

    let state = AppState {
        guard,
        orchestrator: Arc::new(ChatOrchestrator::new(
            provider.clone(),
            registry,
            sessions.clone(),
            config.provider.clone(),
        )),
        quiz: Arc::new(QuizGenerator::new(provider, config.provider.clone())),
        sessions,
    };

    println!("📚 laxbot gateway");
    println!(
        "   Listening:  {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!(
        "   Store:      {} ({})",
        config.store.backend, config.store.path
    );
    println!("   Chat model: {}", config.provider.chat_model);

    let router = build_router(state, &config.gateway);
    laxbot_gateway::serve(router, &config.gateway).await?;

    Ok(())
}
