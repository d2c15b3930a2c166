use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::errors::ModelCallError;
use crate::models::message::Message;
use crate::models::response::{ModelResponse, Reply};
use crate::providers::base::Provider;

type Outcome = Result<ModelResponse, ModelCallError>;

/// A request the mock provider received
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Chat { model: String, messages: Vec<Message> },
    Complete { model: String, prompt: String },
}

/// A mock provider that returns pre-configured outcomes for testing
///
/// Chat and completion each pop from their own queue. Once a queue is drained the provider
/// answers with an empty reply, or with an error when built with [`MockProvider::unavailable`].
pub struct MockProvider {
    chat: Mutex<VecDeque<Outcome>>,
    completion: Mutex<VecDeque<Outcome>>,
    calls: Mutex<Vec<MockCall>>,
    fail_when_drained: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            chat: Mutex::new(VecDeque::new()),
            completion: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            fail_when_drained: false,
        }
    }

    /// A provider whose capabilities fail once their scripted outcomes run out
    pub fn unavailable() -> Self {
        Self {
            fail_when_drained: true,
            ..Self::new()
        }
    }

    pub fn with_chat(self, outcome: Outcome) -> Self {
        self.chat.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_chat_text<S: Into<String>>(self, text: S) -> Self {
        self.with_chat(Ok(Reply::with_text(text).into()))
    }

    pub fn with_completion(self, outcome: Outcome) -> Self {
        self.completion.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_completion_text<S: Into<String>>(self, text: S) -> Self {
        self.with_completion(Ok(Reply::with_response(text).into()))
    }

    /// Every request received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, queue: &Mutex<VecDeque<Outcome>>, capability: &str) -> Outcome {
        match queue.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None if self.fail_when_drained => Err(ModelCallError::Backend(format!(
                "{} capability unavailable",
                capability
            ))),
            None => Ok(Reply::with_text("").into()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<ModelResponse, ModelCallError> {
        self.calls.lock().unwrap().push(MockCall::Chat {
            model: model.to_string(),
            messages: messages.to_vec(),
        });
        self.next(&self.chat, "chat")
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<ModelResponse, ModelCallError> {
        self.calls.lock().unwrap().push(MockCall::Complete {
            model: model.to_string(),
            prompt: prompt.to_string(),
        });
        self.next(&self.completion, "completion")
    }
}
