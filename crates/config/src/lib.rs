//! Configuration loading and validation for laxbot.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides for the secrets (`LAXBOT_API_KEY`, `LAXBOT_TOKEN_SECRET`,
//! `DEEPL_API_KEY`). Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Completion provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Session store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Token verification settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Tool executor settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key; normally supplied via `LAXBOT_API_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model for text-only turns
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model for turns carrying an image
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens for the first completion round
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Max tokens for the post-tool round
    #[serde(default = "default_followup_max_tokens")]
    pub followup_max_tokens: u32,

    /// Max tokens for quiz generation
    #[serde(default = "default_quiz_max_tokens")]
    pub quiz_max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend: "sqlite" or "in_memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path
    #[serde(default = "default_store_path")]
    pub path: String,

    /// Items per prefix-query page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin for the web client
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Request body limit in bytes (images arrive base64-inlined)
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret; normally supplied via `LAXBOT_TOKEN_SECRET`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,

    /// Token lifetime granted at login
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// DeepL-compatible translation endpoint
    #[serde(default = "default_translate_url")]
    pub translate_api_url: String,

    /// Translation API key; normally supplied via `DEEPL_API_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_api_key: Option<String>,

    /// Wikipedia REST base URL (language-specific)
    #[serde(default = "default_encyclopedia_url")]
    pub encyclopedia_api_url: String,

    /// Encyclopedia excerpt cap, in characters
    #[serde(default = "default_excerpt_limit")]
    pub excerpt_limit: usize,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_chat_model() -> String {
    "gpt-4o-mini".into()
}
fn default_vision_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_followup_max_tokens() -> u32 {
    500
}
fn default_quiz_max_tokens() -> u32 {
    2000
}
fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_store_path() -> String {
    "laxbot.db".into()
}
fn default_page_size() -> usize {
    100
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    1338
}
fn default_cors_origin() -> String {
    "http://localhost:5173".into()
}
fn default_body_limit() -> usize {
    8 * 1024 * 1024
}
fn default_token_ttl() -> u64 {
    60 * 60
}
fn default_translate_url() -> String {
    "https://api-free.deepl.com".into()
}
fn default_encyclopedia_url() -> String {
    "https://sv.wikipedia.org/w/rest.php/v1".into()
}
fn default_excerpt_limit() -> usize {
    500
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            chat_model: default_chat_model(),
            vision_model: default_vision_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            followup_max_tokens: default_followup_max_tokens(),
            quiz_max_tokens: default_quiz_max_tokens(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
            page_size: default_page_size(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_secs: default_token_ttl(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            translate_api_url: default_translate_url(),
            translate_api_key: None,
            encyclopedia_api_url: default_encyclopedia_url(),
            excerpt_limit: default_excerpt_limit(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("store", &self.store)
            .field("gateway", &self.gateway)
            .field("auth", &self.auth)
            .field("tools", &self.tools)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("chat_model", &self.chat_model)
            .field("vision_model", &self.vision_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("followup_max_tokens", &self.followup_max_tokens)
            .field("quiz_max_tokens", &self.quiz_max_tokens)
            .finish()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &redact(&self.token_secret))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

impl std::fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("translate_api_url", &self.translate_api_url)
            .field("translate_api_key", &redact(&self.translate_api_key))
            .field("encyclopedia_api_url", &self.encyclopedia_api_url)
            .field("excerpt_limit", &self.excerpt_limit)
            .finish()
    }
}

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Load configuration from a file, then apply environment overrides:
    /// `LAXBOT_API_KEY`, `LAXBOT_TOKEN_SECRET`, `DEEPL_API_KEY`,
    /// `LAXBOT_MODEL`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var("LAXBOT_API_KEY") {
            config.provider.api_key = Some(key);
        } else if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        if let Ok(secret) = std::env::var("LAXBOT_TOKEN_SECRET") {
            config.auth.token_secret = Some(secret);
        }

        if let Ok(key) = std::env::var("DEEPL_API_KEY") {
            config.tools.translate_api_key = Some(key);
        }

        if let Ok(model) = std::env::var("LAXBOT_MODEL") {
            config.provider.chat_model = model;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Validate settings that would otherwise fail at an awkward time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::Invalid(format!(
                "provider.temperature must be in 0.0..=2.0, got {}",
                self.provider.temperature
            )));
        }
        if self.store.page_size == 0 {
            return Err(ConfigError::Invalid("store.page_size must be > 0".into()));
        }
        match self.store.backend.as_str() {
            "sqlite" | "in_memory" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "store.backend must be 'sqlite' or 'in_memory', got '{other}'"
                )));
            }
        }
        if self.tools.excerpt_limit == 0 {
            return Err(ConfigError::Invalid("tools.excerpt_limit must be > 0".into()));
        }
        Ok(())
    }

    /// Check whether a token secret is configured (required to serve).
    pub fn has_token_secret(&self) -> bool {
        self.auth
            .token_secret
            .as_deref()
            .is_some_and(|s| !s.is_empty())
    }
}
