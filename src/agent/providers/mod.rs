//! Model backends that can run an agent.
//!
//! Every backend implements [`ChatModel`]; the runner only ever talks to the trait.

/// OpenAI-compatible chat-completions backend (Gemini, OpenAI, Ollama, custom).
pub mod http;

use async_trait::async_trait;

/// A language model that answers one prompt under a system instruction.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Name shown in the UI and in logs.
    fn name(&self) -> &str;

    /// Sends `prompt` with `instructions` as the system message and returns the
    /// model's reply text.
    async fn complete(&self, instructions: &str, prompt: &str) -> Result<String, ModelError>;
}

/// Errors raised while talking to a model backend.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("no API key configured for {provider} (set {env_var} or add api_key to the config file)")]
    MissingApiKey {
        provider: &'static str,
        env_var: String,
    },
    #[error("{0} requires base_url in the config file")]
    MissingBaseUrl(&'static str),
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode {provider} response: {source}")]
    Decode {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0} returned an empty response")]
    EmptyResponse(String),
}
