//! Quiz generation — one completion, strict parsing, nothing persisted.
//!
//! The model is told to answer with ONLY a JSON array of exactly five
//! multiple-choice questions. Models still wrap arrays in chatter, so the
//! parser slices from the first `[` to the last `]` before decoding.
//! Anything that does not decode into at least one question is a
//! malformed-response error; there is no canned quiz to fall back to.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use laxbot_config::ProviderConfig;
use laxbot_core::{
    CompletionRequest, Error, ImageAttachment, PromptMessage, Provider, ProviderError, Result,
    ToolChoice,
};

const QUIZ_SYSTEM_PROMPT: &str = "Du är en lärare som skapar quiz för barn.
Skapa exakt 5 flervalsfrågor baserat på läxan.
Returnera ENDAST en JSON-array enligt formatet:
[
  {
    \"question\": \"Fråga\",
    \"options\": [\"A\",\"B\",\"C\",\"D\"],
    \"correctAnswer\": \"A\",
    \"explanation\": \"Kort förklaring\"
  }
]";

const IMAGE_QUIZ_PROMPT: &str = "Skapa quiz baserat på läxan i bilden.";

/// Requested question difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    fn prompt_clause(self) -> &'static str {
        match self {
            Difficulty::Easy => "Gör frågorna enkla, för yngre barn.",
            Difficulty::Medium => "Gör frågorna medelsvåra.",
            Difficulty::Hard => "Gör frågorna utmanande, för äldre barn.",
        }
    }
}

/// One multiple-choice question, in the wire shape the clients expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    pub explanation: String,
}

pub struct QuizGenerator {
    provider: Arc<dyn Provider>,
    config: ProviderConfig,
}

impl QuizGenerator {
    pub fn new(provider: Arc<dyn Provider>, config: ProviderConfig) -> Self {
        Self { provider, config }
    }

    /// Generate a quiz from a topic text or a homework photo.
    #[instrument(skip(self, topic, image))]
    pub async fn generate(
        &self,
        topic: &str,
        image: Option<ImageAttachment>,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<QuizQuestion>> {
        let system_prompt = match difficulty {
            Some(level) => format!("{QUIZ_SYSTEM_PROMPT}\n{}", level.prompt_clause()),
            None => QUIZ_SYSTEM_PROMPT.to_string(),
        };

        let user_message = match image {
            Some(image) => PromptMessage::user_with_image(IMAGE_QUIZ_PROMPT, image),
            None => PromptMessage::user(topic),
        };

        // Image-based quizzes need the vision model regardless of mode.
        let model = if user_message.image.is_some() {
            self.config.vision_model.clone()
        } else {
            self.config.chat_model.clone()
        };

        let response = self
            .provider
            .complete(CompletionRequest {
                model,
                messages: vec![PromptMessage::system(system_prompt), user_message],
                temperature: self.config.temperature,
                max_tokens: Some(self.config.quiz_max_tokens),
                tools: Vec::new(),
                tool_choice: ToolChoice::None,
            })
            .await?;

        let questions = parse_quiz(&response.content)?;
        info!(questions = questions.len(), "Quiz generated");
        Ok(questions)
    }
}

/// Decode the question array out of a model reply, tolerating text around
/// the JSON.
fn parse_quiz(content: &str) -> Result<Vec<QuizQuestion>> {
    let start = content.find('[');
    let end = content.rfind(']');

    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            return Err(Error::Provider(ProviderError::MalformedResponse(
                "quiz reply contains no JSON array".into(),
            )));
        }
    };

    let questions: Vec<QuizQuestion> = serde_json::from_str(json).map_err(|e| {
        Error::Provider(ProviderError::MalformedResponse(format!(
            "quiz reply is not a question array: {e}"
        )))
    })?;

    if questions.is_empty() {
        return Err(Error::Provider(ProviderError::MalformedResponse(
            "quiz reply decoded to an empty array".into(),
        )));
    }
    Ok(questions)
}
