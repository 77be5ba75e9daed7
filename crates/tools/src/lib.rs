//! Built-in tool implementations for laxbot.
//!
//! These are the four homework helpers the model may call between its two
//! completion rounds: exact arithmetic, Swedish/English translation,
//! spelling feedback, and encyclopedia lookups.
//!
//! Tools answer in user-facing Swedish. Ordinary misses (no article found,
//! translation service not configured) come back as friendly text the model
//! can relay; only malformed arguments are errors.

pub mod calculator;
pub mod encyclopedia;
pub mod spelling;
pub mod translator;

use laxbot_config::ToolsConfig;
use laxbot_core::ToolRegistry;

/// Create the full tool registry from configuration.
///
/// External-service tools share one HTTP client.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    let client = reqwest::Client::new();

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(calculator::CalculateTool));
    registry.register(Box::new(translator::TranslateTool::new(
        client.clone(),
        config.translate_api_url.clone(),
        config.translate_api_key.clone(),
    )));
    registry.register(Box::new(spelling::CheckSpellingTool));
    registry.register(Box::new(encyclopedia::SearchInformationTool::new(
        client,
        config.encyclopedia_api_url.clone(),
        config.excerpt_limit,
    )));
    registry
}
