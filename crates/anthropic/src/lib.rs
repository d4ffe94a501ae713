//! Client for the Anthropic Messages API, used as the code-generation
//! service: it turns a math topic (plus, on retry, the previous failure
//! detail) into Manim source text.

pub mod client;
pub mod messages;
pub mod prompts;

pub use client::{AnthropicClient, AnthropicConfig, AnthropicError};
