use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{count, endpoint, insert_optional, messages_to_chat_spec, post_json};
use crate::errors::ModelCallError;
use crate::models::message::Message;
use crate::models::response::{ModelResponse, Reply};

pub const OPENAI_HOST: &str = "https://api.openai.com";

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ModelCallError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Option<Usage> {
        let usage = data.get("usage")?;
        Some(Usage::from_counts(
            count(usage, "prompt_tokens"),
            count(usage, "completion_tokens"),
            count(usage, "total_tokens"),
        ))
    }

    async fn post(&self, path: &str, mut payload: Value) -> Result<Value, ModelCallError> {
        insert_optional(&mut payload, "temperature", self.config.temperature);
        insert_optional(&mut payload, "max_tokens", self.config.max_tokens);

        let url = endpoint(&self.config.host, path);
        let response = post_json(
            &self.client,
            &url,
            &payload,
            self.config.api_key.as_deref(),
        )
        .await?;

        if let Some(error) = response.get("error") {
            return Err(ModelCallError::Backend(error.to_string()));
        }
        Ok(response)
    }

    fn to_reply(response: &Value, text: &str) -> ModelResponse {
        ModelResponse::Reply(Reply {
            model: response["model"].as_str().map(String::from),
            response: None,
            text: Some(text.to_string()),
            usage: Self::get_usage(response),
        })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<ModelResponse, ModelCallError> {
        let payload = json!({
            "model": model,
            "messages": messages_to_chat_spec(messages),
        });

        let response = self.post("/v1/chat/completions", payload).await?;

        match response["choices"][0]["message"]["content"].as_str() {
            Some(text) => Ok(Self::to_reply(&response, text)),
            None => Ok(ModelResponse::from_json(response)),
        }
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<ModelResponse, ModelCallError> {
        let payload = json!({
            "model": model,
            "prompt": prompt,
        });

        let response = self.post("/v1/completions", payload).await?;

        match response["choices"][0]["text"].as_str() {
            Some(text) => Ok(Self::to_reply(&response, text)),
            None => Ok(ModelResponse::from_json(response)),
        }
    }
}
