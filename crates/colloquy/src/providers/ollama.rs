use super::base::{Provider, Usage};
use super::configs::OllamaProviderConfig;
use super::utils::{count, endpoint, insert_optional, messages_to_chat_spec, post_json};
use crate::errors::ModelCallError;
use crate::models::message::Message;
use crate::models::response::{ModelResponse, Reply};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const OLLAMA_HOST: &str = "http://localhost:11434";
pub const OLLAMA_MODEL: &str = "qwen2.5:14b";

/// Talks to a local Ollama server through its native `/api/chat` and `/api/generate` endpoints
pub struct OllamaProvider {
    client: Client,
    config: OllamaProviderConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaProviderConfig) -> Result<Self, ModelCallError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Usage {
        Usage::from_counts(
            count(data, "prompt_eval_count"),
            count(data, "eval_count"),
            None,
        )
    }

    fn options(&self) -> Option<Value> {
        let mut options = json!({});
        insert_optional(&mut options, "temperature", self.config.temperature);
        insert_optional(&mut options, "num_predict", self.config.max_tokens);
        match options.as_object() {
            Some(map) if !map.is_empty() => Some(options),
            _ => None,
        }
    }

    async fn post(&self, path: &str, payload: Value) -> Result<Value, ModelCallError> {
        let url = endpoint(&self.config.host, path);
        let response = post_json(&self.client, &url, &payload, None).await?;

        if let Some(error) = response.get("error") {
            return Err(ModelCallError::Backend(error.to_string()));
        }
        Ok(response)
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<ModelResponse, ModelCallError> {
        let mut payload = json!({
            "model": model,
            "messages": messages_to_chat_spec(messages),
            "stream": false,
        });
        insert_optional(&mut payload, "options", self.options());

        let response = self.post("/api/chat", payload).await?;

        // Anything without message content is handed over untyped
        let Some(content) = response["message"]["content"].as_str() else {
            return Ok(ModelResponse::from_json(response));
        };
        Ok(ModelResponse::Reply(Reply {
            model: response["model"].as_str().map(String::from),
            response: None,
            text: Some(content.to_string()),
            usage: Some(Self::get_usage(&response)),
        }))
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<ModelResponse, ModelCallError> {
        let mut payload = json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
        });
        insert_optional(&mut payload, "options", self.options());

        let response = self.post("/api/generate", payload).await?;

        let Some(generated) = response["response"].as_str() else {
            return Ok(ModelResponse::from_json(response));
        };
        Ok(ModelResponse::Reply(Reply {
            model: response["model"].as_str().map(String::from),
            response: Some(generated.to_string()),
            text: None,
            usage: Some(Self::get_usage(&response)),
        }))
    }
}
