//! Settings for the agent maker, usually loaded from `config/agent-maker.toml`.
//!
//! The file is optional. When it is missing the provider is inferred from the
//! environment, and when no API key can be found at all the caller is told to
//! ask the user for one.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "AGENT_MAKER_CONFIG";

pub const DEFAULT_AGENT_NAME: &str = "My Custom Agent";

pub const DEFAULT_AGENT_INSTRUCTIONS: &str = "You are a helpful assistant specialized in programming. Answer questions clearly, and only if they are related to coding.";

pub const DEFAULT_GENERATOR_PROMPT: &str = "You are a prompt engineer that helps generate system prompts for AI agents.

Based on the user's description of the agent, generate a clear and detailed instruction that will help the AI agent behave as desired.

Always include tone, subject expertise, and behavior rules if possible.";

/// Top-level settings structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub defaults: AgentDefaults,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Resolves where the config file lives: `$AGENT_MAKER_CONFIG` if set, otherwise
    /// `config/agent-maker.toml` under the workspace root.
    pub fn config_path(workspace_root: &Path) -> PathBuf {
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => {
                let path = PathBuf::from(path);
                if path.is_relative() {
                    workspace_root.join(path)
                } else {
                    path
                }
            }
            _ => workspace_root.join("config/agent-maker.toml"),
        }
    }

    /// Reads and parses the settings file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings: {}", path.display()))
    }

    /// Works out a usable provider setup.
    ///
    /// Tries, in order:
    /// 1. the config file at `config_path`,
    /// 2. API keys exported in the environment (`GEMINI_API_KEY`, `OPENAI_API_KEY`),
    /// 3. gives up with [`Bootstrap::NeedsApiKey`] so the UI can prompt for a key.
    ///
    /// `lookup` reads environment variables; it is injected so tests stay hermetic.
    pub fn bootstrap<F>(config_path: &Path, lookup: F) -> Result<Bootstrap>
    where
        F: Fn(&str) -> Option<String>,
    {
        if config_path.exists() {
            let settings = Self::load(config_path)?;
            if settings.provider.kind.requires_api_key()
                && settings.provider.resolved_api_key_with(&lookup).is_none()
            {
                let instructions = format!(
                    "{} needs an API key. Enter one to save it to {}.",
                    settings.provider.kind.display_name(),
                    config_path.display()
                );
                return Ok(Bootstrap::NeedsApiKey {
                    settings,
                    instructions,
                });
            }
            return Ok(Bootstrap::Ready {
                settings,
                message: Some(format!("Loaded {}", config_path.display())),
            });
        }

        if let Some((settings, message)) = Self::detect_env_provider(&lookup) {
            return Ok(Bootstrap::Ready {
                settings,
                message: Some(message),
            });
        }

        Ok(Bootstrap::NeedsApiKey {
            settings: Self::default(),
            instructions: String::from(
                "No API key found. Export GEMINI_API_KEY or OPENAI_API_KEY, or enter a Gemini key now.",
            ),
        })
    }

    /// Picks the first provider whose key is exported in the environment.
    fn detect_env_provider<F>(lookup: &F) -> Option<(Settings, String)>
    where
        F: Fn(&str) -> Option<String>,
    {
        for kind in [ProviderKind::Gemini, ProviderKind::OpenAi] {
            let Some(var) = kind.default_key_env() else {
                continue;
            };
            let found = lookup(var).is_some_and(|value| !value.trim().is_empty());
            if !found {
                continue;
            }
            let settings = Settings {
                provider: ProviderConfig {
                    kind: kind.clone(),
                    api_key_env: Some(var.to_string()),
                    ..ProviderConfig::default()
                },
                ..Settings::default()
            };
            let message = format!(
                "Found {} in the environment, using {}",
                var,
                kind.display_name()
            );
            return Some((settings, message));
        }
        None
    }

    /// Writes the settings back to `path`, creating parent directories as needed.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create settings dir: {}", dir.display()))?;
        }
        let serialized = toml::to_string_pretty(self).context("failed to serialize settings")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
        Ok(())
    }
}

/// Outcome of [`Settings::bootstrap`].
#[derive(Debug)]
pub enum Bootstrap {
    Ready {
        settings: Settings,
        message: Option<String>,
    },
    /// Settings are usable apart from the missing API key.
    NeedsApiKey {
        settings: Settings,
        instructions: String,
    },
}

impl Bootstrap {
    pub fn settings(&self) -> &Settings {
        match self {
            Bootstrap::Ready { settings, .. } | Bootstrap::NeedsApiKey { settings, .. } => {
                settings
            }
        }
    }
}

/// Connection details for the chat-completions endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    /// Base URL up to, but not including, `/chat/completions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Inline key. Takes precedence over `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    /// Resolves the API key from the process environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.resolved_api_key_with(&|var: &str| env::var(var).ok())
    }

    /// Resolves the API key: inline `api_key` first, then `api_key_env`, then the
    /// provider's conventional variable. Blank values count as missing.
    pub fn resolved_api_key_with<F>(&self, lookup: &F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = self.api_key.as_ref().filter(|key| !key.trim().is_empty()) {
            return Some(key.trim().to_string());
        }
        let var = self
            .api_key_env
            .as_deref()
            .or_else(|| self.kind.default_key_env())?;
        lookup(var)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.kind.default_model().to_string())
    }

    pub fn resolved_base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| self.kind.default_base_url().map(str::to_string))
    }
}

/// Chat-completions compatible providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
    Ollama,
    Custom,
}

impl ProviderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Ollama => "Ollama",
            ProviderKind::Custom => "Custom endpoint",
        }
    }

    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            ProviderKind::OpenAi => Some("https://api.openai.com/v1"),
            ProviderKind::Ollama => Some("http://localhost:11434/v1"),
            ProviderKind::Custom => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Ollama => "llama3",
            ProviderKind::Custom => "default",
        }
    }

    pub fn default_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama | ProviderKind::Custom => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderKind::Gemini | ProviderKind::OpenAi)
    }
}

/// Initial values for the agent form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    #[serde(default = "default_agent_instructions")]
    pub agent_instructions: String,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            agent_name: default_agent_name(),
            agent_instructions: default_agent_instructions(),
        }
    }
}

fn default_agent_name() -> String {
    DEFAULT_AGENT_NAME.to_string()
}

fn default_agent_instructions() -> String {
    DEFAULT_AGENT_INSTRUCTIONS.to_string()
}

/// Settings for the prompt-engineer agent that drafts instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_generator_prompt")]
    pub system_prompt: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_generator_prompt(),
        }
    }
}

fn default_generator_prompt() -> String {
    DEFAULT_GENERATOR_PROMPT.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Log file; defaults to `logs/agent-maker.log` under the workspace root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// A log4rs YAML file that replaces the built-in logging setup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
}
