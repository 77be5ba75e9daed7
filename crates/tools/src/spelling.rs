//! Best-effort Swedish spelling feedback.
//!
//! There is no dictionary service behind this tool. It hands the word back
//! to the model in a structured sentence; the model itself supplies the
//! actual correction in its follow-up answer.

use async_trait::async_trait;

use laxbot_core::{Tool, ToolError, ToolName};

pub struct CheckSpellingTool;

#[async_trait]
impl Tool for CheckSpellingTool {
    fn name(&self) -> ToolName {
        ToolName::CheckSpelling
    }

    fn description(&self) -> &str {
        "Kontrollera stavning av svenska ord och ge förslag på rätt stavning"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "word": {
                    "type": "string",
                    "description": "Ord att kontrollera stavningen på"
                }
            },
            "required": ["word"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let word = arguments["word"]
            .as_str()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'word' argument".into()))?;

        Ok(format!("Stavningskontroll för ordet \"{word}\""))
    }
}
