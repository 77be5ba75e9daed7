//! Provider trait — the abstraction over the LLM completion backend.
//!
//! A Provider sends one assembled prompt to the model and returns the
//! complete reply, including any tool-call requests. The orchestrator
//! drives at most two `complete()` calls per turn; streaming is out of
//! scope for this service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::ImageAttachment;

/// The role of one prompt message sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model inside an assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedToolCall {
    /// The provider's call id; tool results are correlated back by it.
    pub id: String,
    /// Tool name as the model spelled it.
    pub name: String,
    /// Arguments as a JSON string (the wire format providers use).
    pub arguments: String,
}

/// One message in an assembled prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,

    /// Inline image on a user message, rendered as a data-URL content part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,

    /// Tool calls carried by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<RequestedToolCall>,

    /// For tool-result messages: the call id this result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
            image: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
            image: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user_with_image(content: impl Into<String>, image: ImageAttachment) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
            image: Some(image),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// An assistant message echoing the model's tool-call request, required
    /// by the wire protocol before the tool results.
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<RequestedToolCall>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
            image: None,
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// A tool-result message keyed by the originating call id.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Tool,
            content: content.into(),
            image: None,
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: serde_json::Value,
}

/// Whether the model may request tool calls in this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Model decides (round one).
    #[default]
    Auto,
    /// Tool use disabled (round two, no recursive chaining).
    None,
}

/// One completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<PromptMessage>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    #[serde(default)]
    pub tool_choice: ToolChoice,
}

fn default_temperature() -> f32 {
    0.7
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The reply text. May be empty when the model only requests tools.
    pub content: String,

    /// Tool calls the model wants executed before it can answer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<RequestedToolCall>,

    /// Which model actually responded.
    pub model: String,

    pub usage: Option<Usage>,
}

impl CompletionResponse {
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// The completion provider trait.
///
/// The orchestrator and quiz generator call `complete()` without knowing
/// which backend is configured.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}
