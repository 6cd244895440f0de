//! Runner configuration, built from the environment with hard defaults.

use std::time::Duration;

/// Completion service endpoint (OpenAI-compatible chat completions).
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

/// Per-call generation tunables.
#[derive(Debug, Clone, Copy)]
pub struct CallParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// Top-level runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Where completion calls go.
    pub endpoint: ServiceEndpoint,
    /// Per-request timeout; expiry surfaces as a completion failure.
    pub request_timeout: Duration,
    /// Tunables for persona turns.
    pub agent_call: CallParams,
    /// Tunables for recurrent summary calls.
    pub summary_call: CallParams,
    /// Tunables for the final synthesis call.
    pub synthesis_call: CallParams,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            endpoint: ServiceEndpoint {
                url: std::env::var("DEBATE_API_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
                api_key: std::env::var("DEBATE_API_KEY").unwrap_or_default(),
                model: std::env::var("DEBATE_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            },
            request_timeout: Duration::from_secs(
                std::env::var("DEBATE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(120),
            ),
            agent_call: CallParams {
                max_output_tokens: 2000,
                temperature: 0.7,
            },
            summary_call: CallParams {
                max_output_tokens: 1000,
                temperature: 0.3,
            },
            synthesis_call: CallParams {
                max_output_tokens: 2000,
                temperature: 0.5,
            },
        }
    }
}
