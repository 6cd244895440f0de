//! Completion service — the one external capability this runner consumes.
//!
//! The core never talks to the network; everything it needs from a language
//! model goes through [`CompletionService`]. The production implementation
//! is an OpenAI-compatible chat-completions client. Transport, service, and
//! timeout problems all surface as a single [`CompletionError`] carrying a
//! human-readable cause.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use orchestration::{Fragment, Role};

use crate::config::ServiceEndpoint;

/// One text-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Role instruction for this call.
    pub system_prompt: String,
    /// Ordered, role-tagged message fragments.
    pub messages: Vec<Fragment>,
    /// Generation cap for this call.
    pub max_output_tokens: u32,
    /// Sampling temperature in [0, 1].
    pub temperature: f32,
}

/// A successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

/// Uniform completion failure: service-unavailable, invalid-request, and
/// timeout all collapse into one kind with a human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("completion failed: {0}")]
pub struct CompletionError(pub String);

/// Stateless request/response text generation.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError>;
}

/// Map a fragment role onto the chat-completions wire role.
fn wire_role(role: Role) -> &'static str {
    match role {
        Role::Requester => "user",
        Role::Assistant => "assistant",
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client.
pub struct HttpCompletionService {
    client: reqwest::Client,
    endpoint: ServiceEndpoint,
}

impl HttpCompletionService {
    /// Build a client against the given endpoint with a per-request timeout.
    ///
    /// Timeout expiry surfaces as a [`CompletionError`] like any other
    /// transport failure.
    pub fn new(endpoint: ServiceEndpoint, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build completion HTTP client")?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl CompletionService for HttpCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        let mut messages = vec![WireMessage {
            role: "system",
            content: &request.system_prompt,
        }];
        messages.extend(request.messages.iter().map(|fragment| WireMessage {
            role: wire_role(fragment.role),
            content: &fragment.text,
        }));

        let body = WireRequest {
            model: &self.endpoint.model,
            messages,
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
        };

        let url = format!("{}/chat/completions", self.endpoint.url.trim_end_matches('/'));
        debug!(%url, fragments = request.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CompletionError(format!(
                "service returned {status}: {}",
                detail.chars().take(200).collect::<String>()
            )));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| CompletionError(format!("malformed response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError("response contained no generated text".into()))?;

        Ok(Completion { text })
    }
}
