//! Chat turn orchestration and quiz generation.
//!
//! [`ChatOrchestrator`] drives the two-round completion pipeline: one
//! round where the model may request tools, tool execution, and an
//! optional follow-up round with tools disabled. Completed turns are
//! persisted as a user/assistant message pair.
//!
//! [`QuizGenerator`] is the stateless sibling: one completion, strict
//! JSON-array parsing, nothing persisted.

pub mod orchestrator;
pub mod quiz;

pub use orchestrator::{ChatOrchestrator, ChatReply, ChatTurnRequest};
pub use quiz::{Difficulty, QuizGenerator, QuizQuestion};
