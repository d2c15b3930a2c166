use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ModelCallError;
use crate::models::message::Message;
use crate::models::response::ModelResponse;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    /// Use the reported total, or derive it when both halves are known
    pub fn from_counts(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        let total_tokens = total_tokens.or(match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => input.checked_add(output),
            _ => None,
        });
        Self::new(input_tokens, output_tokens, total_tokens)
    }
}

/// Base trait for model-serving backends (Ollama, OpenAI-compatible servers, etc)
///
/// Backends expose two request modes: structured multi-turn chat and single-shot completion.
/// Both hand back the raw response shape; turning it into text is the normalizer's job.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next utterance from an ordered message list
    async fn chat(&self, model: &str, messages: &[Message])
        -> Result<ModelResponse, ModelCallError>;

    /// Generate a continuation for a single prompt
    async fn complete(&self, model: &str, prompt: &str) -> Result<ModelResponse, ModelCallError>;
}
