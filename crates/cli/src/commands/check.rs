//! `laxbot check` — validate configuration and report what is wired up.

use std::path::Path;

use laxbot_config::AppConfig;

fn presence(value: &Option<String>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "configured",
        _ => "MISSING",
    }
}

pub fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path)?;

    println!("Configuration OK ({})", config_path.display());
    println!(
        "   Provider:     {} (chat: {}, vision: {})",
        config.provider.api_url, config.provider.chat_model, config.provider.vision_model
    );
    println!("   API key:      {}", presence(&config.provider.api_key));
    println!("   Token secret: {}", presence(&config.auth.token_secret));
    println!(
        "   Store:        {} ({})",
        config.store.backend, config.store.path
    );
    println!(
        "   Translation:  {}",
        match &config.tools.translate_api_key {
            Some(k) if !k.is_empty() => "configured".to_string(),
            _ => "not configured, the translate tool will echo its input".to_string(),
        }
    );
    println!("   Encyclopedia: {}", config.tools.encyclopedia_api_url);

    if config.provider.api_key.is_none() || !config.has_token_secret() {
        println!();
        println!("Set LAXBOT_API_KEY and LAXBOT_TOKEN_SECRET before running `laxbot serve`.");
    }

    Ok(())
}
