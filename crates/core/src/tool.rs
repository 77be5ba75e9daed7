//! Tool trait and registry — the closed set of auxiliary capabilities the
//! model may invoke between its two completion rounds.
//!
//! Dispatch is keyed by the [`ToolName`] enum rather than raw strings, so
//! adding a capability forces every match site to handle it. String names
//! arriving from the model are parsed with `FromStr`; unknown names are the
//! caller's problem to degrade gracefully (the orchestrator substitutes a
//! diagnostic tool result).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// The closed set of tool identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Arithmetic evaluation of a textual expression.
    Calculate,
    /// Swedish/English text translation.
    Translate,
    /// Best-effort spelling feedback.
    CheckSpelling,
    /// Encyclopedia fact lookup.
    SearchInformation,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::Calculate => "calculate",
            ToolName::Translate => "translate",
            ToolName::CheckSpelling => "check_spelling",
            ToolName::SearchInformation => "search_information",
        }
    }

    /// Every tool name, in registry order.
    pub fn all() -> [ToolName; 4] {
        [
            ToolName::Calculate,
            ToolName::Translate,
            ToolName::CheckSpelling,
            ToolName::SearchInformation,
        ]
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "calculate" => Ok(ToolName::Calculate),
            "translate" => Ok(ToolName::Translate),
            "check_spelling" => Ok(ToolName::CheckSpelling),
            "search_information" => Ok(ToolName::SearchInformation),
            other => Err(format!("unknown tool: {other}")),
        }
    }
}

/// A resolved request to execute one tool.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// The provider's call id, threaded through to the tool-result message.
    pub id: String,
    pub name: ToolName,
    /// Arguments as a JSON object, already parsed from the wire string.
    pub arguments: serde_json::Value,
}

/// The core Tool trait.
///
/// Executors return a plain string that is folded back into the
/// conversation. Ordinary "no result" conditions are *not* errors; they
/// come back as human-readable text; only unexpected upstream failures
/// surface as [`ToolError`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The identifier this executor answers to.
    fn name(&self) -> ToolName;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError>;

    /// Convert this tool into a definition for the provider.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().as_str().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The registry of available tools, keyed by [`ToolName`].
///
/// The orchestrator uses this to attach definitions to round one and to
/// execute the calls the model requests.
pub struct ToolRegistry {
    tools: BTreeMap<ToolName, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing executor for the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: ToolName) -> Option<&dyn Tool> {
        self.tools.get(&name).map(|t| t.as_ref())
    }

    /// All tool definitions, in stable name order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute one resolved call.
    pub async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self.tools.get(&call.name).ok_or_else(|| {
            // A registered enum variant without an executor is a wiring bug.
            ToolError::ExecutionFailed {
                tool_name: call.name.to_string(),
                reason: "no executor registered".into(),
            }
        })?;
        tool.execute(call.arguments.clone()).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
