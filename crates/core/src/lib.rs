//! # Laxbot Core
//!
//! Domain types, traits, and error definitions for the laxbot family
//! homework-help service. This crate has **zero framework dependencies**:
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod identity;
pub mod keys;
pub mod kv;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{AuthError, Error, ProviderError, Result, StoreError, ToolError};
pub use identity::{Principal, UserProfile, UserRole};
pub use kv::{Item, ItemKey, KeyValueStore, QueryPage, MAX_BATCH_DELETE};
pub use message::{ChatMessage, ImageAttachment, Role, Turn};
pub use provider::{
    CompletionRequest, CompletionResponse, PromptMessage, PromptRole, Provider, RequestedToolCall,
    ToolChoice, ToolDefinition, Usage,
};
pub use tool::{Tool, ToolCall, ToolName, ToolRegistry};
