// Unified enum to wrap different provider configurations
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Ollama(OllamaProviderConfig),
    OpenAi(OpenAiProviderConfig),
}

#[derive(Debug, Clone)]
pub struct OllamaProviderConfig {
    pub host: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OllamaProviderConfig {
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Any server speaking the OpenAI chat/completions protocol, including Ollama's `/v1` surface
#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiProviderConfig {
    pub fn new<S: Into<String>>(host: S, api_key: Option<String>) -> Self {
        Self {
            host: host.into(),
            api_key,
            temperature: None,
            max_tokens: None,
        }
    }
}
