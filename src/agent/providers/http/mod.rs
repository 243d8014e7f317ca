use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::config::{ProviderConfig, ProviderKind};

use super::{ChatModel, ModelError};

mod models;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// [`ChatModel`] over an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatModel {
    info: ModelInfo,
    client: Client,
}

#[derive(Clone, Debug)]
struct ModelInfo {
    provider: ProviderKind,
    label: String,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    headers: BTreeMap<String, String>,
}

impl OpenAiCompatModel {
    /// Builds the backend, resolving the API key from the environment.
    pub fn new(config: &ProviderConfig) -> Result<Self, ModelError> {
        Self::with_api_key(config, config.resolved_api_key())
    }

    /// Builds the backend with an already resolved key.
    pub fn with_api_key(config: &ProviderConfig, api_key: Option<String>) -> Result<Self, ModelError> {
        let provider = config.kind.clone();
        if api_key.is_none() && provider.requires_api_key() {
            let env_var = config
                .api_key_env
                .clone()
                .or_else(|| provider.default_key_env().map(str::to_string))
                .unwrap_or_default();
            return Err(ModelError::MissingApiKey {
                provider: provider.display_name(),
                env_var,
            });
        }
        let base_url = config
            .resolved_base_url()
            .ok_or(ModelError::MissingBaseUrl(provider.display_name()))?;
        let model = config.resolved_model();
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ModelError::Client)?;

        let info = ModelInfo {
            label: format!("{} ({})", provider.display_name(), model),
            provider,
            endpoint: completions_url(&base_url),
            model,
            api_key,
            headers: config.extra_headers.clone(),
        };
        // Fail on bad headers now rather than on the first request.
        build_headers(&info)?;
        Ok(Self { info, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.info.endpoint
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatModel {
    fn name(&self) -> &str {
        &self.info.label
    }

    async fn complete(&self, instructions: &str, prompt: &str) -> Result<String, ModelError> {
        use models::{ChatCompletionMessage, ChatCompletionPayload, ChatCompletionResponse};

        let payload = ChatCompletionPayload {
            model: &self.info.model,
            messages: vec![
                ChatCompletionMessage {
                    role: "system",
                    content: instructions,
                },
                ChatCompletionMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };
        let provider = self.info.provider.display_name().to_string();
        debug!(
            "POST {} (model {}, {} prompt chars)",
            self.info.endpoint,
            self.info.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(&self.info.endpoint)
            .headers(build_headers(&self.info)?)
            .json(&payload)
            .send()
            .await
            .map_err(|source| ModelError::Transport {
                provider: provider.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} responded with {}", provider, status);
            return Err(ModelError::Status {
                provider,
                status,
                body: body.trim().to_string(),
            });
        }

        let data: ChatCompletionResponse =
            response.json().await.map_err(|source| ModelError::Decode {
                provider: provider.clone(),
                source,
            })?;
        data.first_text().ok_or(ModelError::EmptyResponse(provider))
    }
}

fn completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{}/chat/completions", base)
    }
}

fn build_headers(info: &ModelInfo) -> Result<HeaderMap, ModelError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(api_key) = &info.api_key {
        let value = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|err| {
            ModelError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
                reason: err.to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, value);
    }
    for (key, value) in info.headers.iter() {
        let invalid = |reason: String| ModelError::InvalidHeader {
            name: key.clone(),
            reason,
        };
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| invalid(err.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|err| invalid(err.to_string()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
