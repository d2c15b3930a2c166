use crate::error::{to_env_var, ConfigError, ENV_PREFIX};
use colloquy::agent::Agent;
use colloquy::conversation::DEFAULT_OPENING_LINE;
use colloquy::news::{NewsConfig, NEWS_HOST};
use colloquy::providers::{
    configs::{OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig},
    ollama::{OLLAMA_HOST, OLLAMA_MODEL},
    openai::OPENAI_HOST,
};
use colloquy::retry::RetryConfig;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given
const DEFAULT_CONFIG_NAME: &str = "colloquy";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    Ollama {
        #[serde(default = "default_ollama_host")]
        host: String,
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        #[serde(default)]
        api_key: Option<String>,
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
}

impl ProviderSettings {
    /// Model used by agents that don't name their own
    pub fn model(&self) -> &str {
        match self {
            ProviderSettings::Ollama { model, .. } | ProviderSettings::OpenAi { model, .. } => {
                model
            }
        }
    }

    // Convert to the colloquy ProviderConfig
    pub fn into_config(self) -> ProviderConfig {
        match self {
            ProviderSettings::Ollama {
                host,
                temperature,
                max_tokens,
                ..
            } => ProviderConfig::Ollama(OllamaProviderConfig {
                host,
                temperature,
                max_tokens,
            }),
            ProviderSettings::OpenAi {
                host,
                api_key,
                temperature,
                max_tokens,
                ..
            } => ProviderConfig::OpenAi(OpenAiProviderConfig {
                host,
                api_key,
                temperature,
                max_tokens,
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AgentSettings {
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationSettings {
    #[serde(default = "default_turns")]
    pub turns: usize,
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
    #[serde(default = "default_opening_line")]
    pub opening_line: String,
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentSettings>,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            turns: default_turns(),
            pause_ms: default_pause_ms(),
            opening_line: default_opening_line(),
            agents: default_agents(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewsSettings {
    #[serde(default = "default_news_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            host: default_news_host(),
            api_key: None,
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
            limit: default_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NewsSettings {
    pub fn into_config(self, api_key: String) -> NewsConfig {
        NewsConfig {
            host: self.host,
            api_key,
            retry: RetryConfig::new(self.retries, Duration::from_millis(self.backoff_ms)),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub provider: ProviderSettings,
    #[serde(default)]
    pub conversation: ConversationSettings,
    #[serde(default)]
    pub news: NewsSettings,
}

impl Settings {
    /// Load settings from the config file (explicit, or `colloquy.*` if present) and environment
    pub fn new(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_and_validate(path)
    }

    /// The configured participants, each bound to its own model or the provider's default
    pub fn agents(&self) -> Vec<Agent> {
        self.conversation
            .agents
            .iter()
            .map(|agent| {
                let model = agent.model.as_deref().unwrap_or(self.provider.model());
                Agent::new(&agent.name, &agent.instructions, model)
            })
            .collect()
    }

    fn load_and_validate(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config = Config::builder()
            .set_default("provider.type", "ollama")?
            .add_source(file)
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    // Extract field name from "missing field `model`"; only the provider
                    // section has required fields
                    let field = error_str.split('`').nth(1).unwrap_or_default();
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&format!("provider.{}", field)),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_ollama_host() -> String {
    OLLAMA_HOST.to_string()
}

fn default_ollama_model() -> String {
    OLLAMA_MODEL.to_string()
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_turns() -> usize {
    6
}

fn default_pause_ms() -> u64 {
    300
}

fn default_opening_line() -> String {
    DEFAULT_OPENING_LINE.to_string()
}

fn default_agents() -> Vec<AgentSettings> {
    vec![
        AgentSettings {
            name: "Alice".to_string(),
            instructions: "You are Alice, a concise technical analyst.".to_string(),
            model: None,
        },
        AgentSettings {
            name: "Bob".to_string(),
            instructions: "You are Bob, a curious and friendly product manager.".to_string(),
            model: None,
        },
    ]
}

fn default_news_host() -> String {
    NEWS_HOST.to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_limit() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    10
}
