//! Completion provider implementations for laxbot.
//!
//! One backend: any OpenAI-compatible `/chat/completions` endpoint.
//! Everything behind the [`laxbot_core::Provider`] trait, so the chat
//! pipeline never sees wire formats.

pub mod openai;

pub use openai::OpenAiProvider;
