//! LLM provider abstraction layer
//!
//! This crate provides provider-agnostic types for talking to a hosted
//! language model:
//!
//! - Message types, including tool-use and tool-result blocks
//! - Completion request/response types
//! - Tool definitions for function calling
//! - The [`LLMProvider`] trait
//! - The Anthropic Messages API provider (behind the `anthropic` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

// Provider implementations (feature-gated)
#[cfg(feature = "anthropic")]
pub mod providers;
