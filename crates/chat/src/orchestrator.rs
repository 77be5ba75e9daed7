//! The chat turn orchestrator.
//!
//! One turn is at most two completion rounds:
//!
//! 1. System prompt + the user's message, with tool definitions attached
//!    and `tool_choice: auto`. Vision model when an image is attached.
//! 2. Only if round one requested tools: the tool results are folded into
//!    the prompt and a follow-up round runs with tools disabled, so the
//!    model cannot chain further calls.
//!
//! Tool-level failures degrade into diagnostic result strings the model
//! can talk around. Provider failures abort the turn; nothing is
//! persisted for a failed turn.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use laxbot_config::ProviderConfig;
use laxbot_core::keys::format_timestamp;
use laxbot_core::{
    CompletionRequest, ImageAttachment, PromptMessage, Provider, Result, ToolCall, ToolChoice,
    ToolName, ToolRegistry, Turn,
};
use laxbot_store::SessionStore;

const SYSTEM_PROMPT: &str = "Du är en vänlig och pedagogisk läxhjälpsassistent för barn. \
När du får en bild, analysera den noggrant och beskriv vad du ser. \
Ditt mål är att hjälpa barn förstå och lära sig, inte bara ge dem svaren direkt. \
Förklara saker på ett enkelt och roligt sätt. Använd emojis ibland för att göra det roligare. \
Ställ följdfrågor för att hjälpa barnen tänka själva. Uppmuntra dem när de försöker. \
Du har tillgång till verktyg för beräkningar, översättning, stavningskontroll och \
informationssökning - använd dem när det passar!";

const DEFAULT_IMAGE_QUESTION: &str = "Vad ser du på denna bild av min läxa?";
const EMPTY_REPLY_FALLBACK: &str = "Oj, jag kunde inte generera ett svar. Försök igen!";

/// One incoming chat turn, already authorized.
#[derive(Debug, Clone)]
pub struct ChatTurnRequest {
    pub family_id: String,
    pub user_id: String,
    pub session_id: String,
    pub message: String,
    pub image: Option<ImageAttachment>,
}

/// The completed turn as returned to the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatReply {
    pub response: String,
    /// The user message's sort-key timestamp; the anchor for later
    /// single-turn deletion.
    pub timestamp: String,
}

pub struct ChatOrchestrator {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    store: Arc<SessionStore>,
    config: ProviderConfig,
}

impl ChatOrchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        store: Arc<SessionStore>,
        config: ProviderConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            store,
            config,
        }
    }

    /// Run one turn end to end and persist the resulting message pair.
    #[instrument(skip(self, request), fields(session = %request.session_id))]
    pub async fn run(&self, request: ChatTurnRequest) -> Result<ChatReply> {
        let timestamp = Utc::now();
        let system_prompt = self.build_system_prompt(&request).await;

        let user_message = match request.image.clone() {
            Some(image) => {
                let text = if request.message.trim().is_empty() {
                    DEFAULT_IMAGE_QUESTION.to_string()
                } else {
                    request.message.clone()
                };
                PromptMessage::user_with_image(text, image)
            }
            None => PromptMessage::user(request.message.clone()),
        };

        // Image analysis needs the vision model; text-only turns use the
        // cheaper chat model.
        let first_model = if request.image.is_some() {
            self.config.vision_model.clone()
        } else {
            self.config.chat_model.clone()
        };

        let mut messages = vec![PromptMessage::system(system_prompt), user_message];

        let first = self
            .provider
            .complete(CompletionRequest {
                model: first_model,
                messages: messages.clone(),
                temperature: self.config.temperature,
                max_tokens: Some(self.config.max_tokens),
                tools: self.registry.definitions(),
                tool_choice: ToolChoice::Auto,
            })
            .await?;

        let response_text = if first.wants_tools() {
            messages.push(PromptMessage::assistant_tool_calls(
                first.content.clone(),
                first.tool_calls.clone(),
            ));

            for requested in &first.tool_calls {
                let output = self.execute_tool(&requested.name, &requested.arguments).await;
                messages.push(PromptMessage::tool_result(requested.id.clone(), output));
            }

            // Follow-up round: tools disabled, no recursive chaining.
            let second = self
                .provider
                .complete(CompletionRequest {
                    model: self.config.chat_model.clone(),
                    messages,
                    temperature: self.config.temperature,
                    max_tokens: Some(self.config.followup_max_tokens),
                    tools: Vec::new(),
                    tool_choice: ToolChoice::None,
                })
                .await?;
            second.content
        } else {
            first.content
        };

        let response_text = if response_text.trim().is_empty() {
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            response_text
        };

        let turn = Turn::new(
            &request.family_id,
            &request.user_id,
            &request.session_id,
            &request.message,
            &response_text,
            timestamp,
        );
        self.store.put_turn(&turn).await?;

        info!(tool_calls = first.tool_calls.len(), "Chat turn completed");

        Ok(ChatReply {
            response: response_text,
            timestamp: format_timestamp(timestamp),
        })
    }

    /// Base prompt, plus an age hint when the user's profile has a birth
    /// date. Profile lookup is best effort; a store hiccup never fails
    /// the turn.
    async fn build_system_prompt(&self, request: &ChatTurnRequest) -> String {
        let profile = match self
            .store
            .get_profile(&request.family_id, &request.user_id)
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                debug!(error = %e, "Profile lookup failed, continuing without it");
                None
            }
        };

        let age = profile
            .and_then(|p| p.birth_date)
            .and_then(|d| age_from_birth_date(&d, Utc::now().date_naive()));

        match age {
            Some(age) => format!(
                "{SYSTEM_PROMPT} Barnet du hjälper är ungefär {age} år gammalt. \
                 Anpassa språket och förklaringarna efter åldern."
            ),
            None => SYSTEM_PROMPT.to_string(),
        }
    }

    /// Execute one requested tool call. Unknown names, unparseable
    /// arguments, and executor failures all come back as result text.
    async fn execute_tool(&self, name: &str, arguments: &str) -> String {
        let Ok(tool_name) = ToolName::from_str(name) else {
            warn!(tool = name, "Model requested an unknown tool");
            return "Okänd funktion".into();
        };

        let parsed: serde_json::Value = match serde_json::from_str(arguments) {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = name, error = %e, "Unparseable tool arguments");
                return format!("Verktyget {name} fick ogiltiga argument.");
            }
        };

        let call = ToolCall {
            id: String::new(),
            name: tool_name,
            arguments: parsed,
        };
        debug!(tool = name, "Executing tool");

        match self.registry.execute(&call).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                format!("Verktyget {name} kunde inte användas just nu.")
            }
        }
    }
}

/// Whole years between a `YYYY-MM-DD` birth date and `today`.
fn age_from_birth_date(birth_date: &str, today: NaiveDate) -> Option<u32> {
    let born = NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").ok()?;
    if born > today {
        return None;
    }
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}
