//! Swedish/English translation via a DeepL-compatible API.
//!
//! The model names languages in Swedish ("svenska"/"engelska"); they are
//! mapped to DeepL codes here. Without an API key the tool still answers,
//! echoing the text with a note that the service is not configured, so the
//! assistant degrades instead of erroring out mid-conversation.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use laxbot_core::{Tool, ToolError, ToolName};

pub struct TranslateTool {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl TranslateTool {
    pub fn new(client: reqwest::Client, api_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }

    async fn translate(&self, text: &str, source: &str, target: &str, key: &str) -> Option<String> {
        #[derive(Deserialize)]
        struct Translation {
            text: String,
        }
        #[derive(Deserialize)]
        struct Response {
            translations: Vec<Translation>,
        }

        let url = format!("{}/v2/translate", self.api_url.trim_end_matches('/'));
        let result = self
            .client
            .post(&url)
            .header("Authorization", format!("DeepL-Auth-Key {key}"))
            .json(&serde_json::json!({
                "text": [text],
                "source_lang": source,
                "target_lang": target,
            }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => response
                .json::<Response>()
                .await
                .ok()
                .and_then(|body| body.translations.into_iter().next())
                .map(|t| t.text),
            Ok(response) => {
                warn!(status = %response.status(), "Translation request rejected");
                None
            }
            Err(e) => {
                warn!(error = %e, "Translation request failed");
                None
            }
        }
    }
}

/// Map a Swedish language name to a DeepL language code.
fn language_code(name: &str) -> &'static str {
    if name.eq_ignore_ascii_case("svenska") {
        "SV"
    } else {
        "EN"
    }
}

#[async_trait]
impl Tool for TranslateTool {
    fn name(&self) -> ToolName {
        ToolName::Translate
    }

    fn description(&self) -> &str {
        "Översätt text mellan svenska och engelska"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text att översätta"
                },
                "from_language": {
                    "type": "string",
                    "enum": ["svenska", "engelska"],
                    "description": "Språk att översätta från"
                },
                "to_language": {
                    "type": "string",
                    "enum": ["svenska", "engelska"],
                    "description": "Språk att översätta till"
                }
            },
            "required": ["text", "from_language", "to_language"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let text = arguments["text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'text' argument".into()))?;
        let from = arguments["from_language"].as_str().unwrap_or("svenska");
        let to = arguments["to_language"].as_str().unwrap_or("engelska");

        let Some(key) = self.api_key.as_deref() else {
            return Ok(format!(
                "Översättning från {from} till {to}: \"{text}\" (översättningstjänsten är inte konfigurerad)"
            ));
        };

        match self
            .translate(text, language_code(from), language_code(to), key)
            .await
        {
            Some(translated) => Ok(format!("Översättning: \"{translated}\"")),
            None => Ok("Kunde inte översätta texten. Försök igen.".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> TranslateTool {
        TranslateTool::new(
            reqwest::Client::new(),
            "https://api-free.deepl.com".into(),
            None,
        )
    }

    #[test]
    fn language_names_map_to_codes() {
        assert_eq!(language_code("svenska"), "SV");
        assert_eq!(language_code("Svenska"), "SV");
        assert_eq!(language_code("engelska"), "EN");
    }

    #[tokio::test]
    async fn without_key_echoes_with_note() {
        let tool = unconfigured();
        let output = tool
            .execute(serde_json::json!({
                "text": "katten sover",
                "from_language": "svenska",
                "to_language": "engelska",
            }))
            .await
            .unwrap();
        assert!(output.contains("katten sover"));
        assert!(output.contains("inte konfigurerad"));
    }

    #[tokio::test]
    async fn missing_text_is_invalid() {
        let tool = unconfigured();
        let err = tool
            .execute(serde_json::json!({"from_language": "svenska"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn tool_definition_uses_wire_name() {
        let def = unconfigured().to_definition();
        assert_eq!(def.name, "translate");
    }
}
