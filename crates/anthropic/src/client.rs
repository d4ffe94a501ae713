//! HTTP client for the Anthropic Messages API.
//!
//! [`AnthropicClient`] wraps the REST endpoint used for code generation.
//! It owns response-payload extraction (fenced code blocks) and consults a
//! [`CodeValidator`] before accepting a response: a heuristic miss triggers
//! exactly one stricter secondary call, after which the result is returned
//! as-is — the renderer is the actual correctness oracle.

use std::time::Duration;

use mathviz_core::extract::{extract_code_block, CodeValidator, HeuristicValidator};

use crate::messages::{Message, MessagesRequest, MessagesResponse, ANTHROPIC_VERSION};
use crate::prompts;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default generation model.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";

/// HTTP request timeout for a single generation call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Token/temperature settings for the primary generation call.
const PRIMARY_MAX_TOKENS: u32 = 10_000;
const PRIMARY_TEMPERATURE: f32 = 0.2;

/// Token/temperature settings for the stricter secondary call.
const STRICT_MAX_TOKENS: u32 = 4_000;
const STRICT_TEMPERATURE: f32 = 0.1;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Connection configuration for the generation service.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key sent in the `x-api-key` header.
    pub api_key: String,
    /// Base HTTP URL (default: `https://api.anthropic.com`).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
}

impl AnthropicConfig {
    /// Config with default endpoint and model for a given key.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the generation-service call itself (transport or service
/// fault — never "the generated code is wrong").
#[derive(Debug, thiserror::Error)]
pub enum AnthropicError {
    /// The HTTP request failed (network, DNS, TLS, timeout).
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("generation service error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The service answered 2xx but with no text content.
    #[error("generation service returned an empty response")]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for one generation-service endpoint.
pub struct AnthropicClient {
    client: reqwest::Client,
    config: AnthropicConfig,
    validator: Box<dyn CodeValidator>,
}

impl AnthropicClient {
    /// Create a client with the default quality heuristic.
    pub fn new(config: AnthropicConfig) -> Self {
        Self::with_validator(config, Box::new(HeuristicValidator::default()))
    }

    /// Create a client with a custom acceptance check.
    pub fn with_validator(config: AnthropicConfig, validator: Box<dyn CodeValidator>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            config,
            validator,
        }
    }

    /// Model identifier this client generates with.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Generate Manim source for `topic`.
    ///
    /// With `prior_error` present the request is a correction: the failure
    /// detail from the previous attempt is embedded so the model is biased
    /// toward fixing it. The returned text has fenced-block wrapping
    /// stripped; if the first response fails the quality heuristic, one
    /// stricter call is made and its extraction returned regardless.
    pub async fn generate(
        &self,
        topic: &str,
        prior_error: Option<&str>,
    ) -> Result<String, AnthropicError> {
        let user_prompt = match prior_error {
            Some(error) => prompts::correction_prompt(topic, error),
            None => prompts::fresh_prompt(topic),
        };

        let raw = self
            .call(
                prompts::CODEGEN_SYSTEM_PROMPT,
                &user_prompt,
                PRIMARY_MAX_TOKENS,
                PRIMARY_TEMPERATURE,
            )
            .await?;
        let code = extract_code_block(&raw);

        if self.validator.is_acceptable(&code) {
            return Ok(code);
        }

        tracing::info!(
            topic,
            "Generated response looks like prose rather than code, retrying with strict prompt",
        );

        let raw = self
            .call(
                prompts::STRICT_SYSTEM_PROMPT,
                &prompts::strict_prompt(topic),
                STRICT_MAX_TOKENS,
                STRICT_TEMPERATURE,
            )
            .await?;
        Ok(extract_code_block(&raw))
    }

    /// One messages-API round trip, returning the first text block.
    async fn call(
        &self,
        system: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, AnthropicError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens,
            temperature,
            system,
            messages: vec![Message::user(user_prompt)],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AnthropicError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response.json::<MessagesResponse>().await?;
        parsed
            .first_text()
            .map(str::to_string)
            .ok_or(AnthropicError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
