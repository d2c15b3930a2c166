//! Turn-based conversation between agents
//!
//! Turns run strictly one after another. Each turn asks the speaking agent's model for a reply
//! through an ordered list of [`ReplyStrategy`]s, so a failing backend degrades to a fallback
//! request and finally to a placeholder line instead of ending the conversation.
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::agent::Agent;
use crate::errors::{ConversationError, ModelCallError};
use crate::models::transcript::{Transcript, Utterance};
use crate::providers::base::Provider;
use crate::retry::{Sleeper, TokioSleeper};

/// Prompt seed for the completion fallback when nothing has been said yet
pub const DEFAULT_OPENING_LINE: &str = "Start the discussion.";

/// One way of asking a model for the next utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStrategy {
    /// Structured chat over the agent's full context
    Chat,
    /// Single-shot completion seeded with the latest utterance
    Completion,
}

pub struct Conversation {
    provider: Arc<dyn Provider>,
    strategies: Vec<ReplyStrategy>,
    pause: Duration,
    sleeper: Arc<dyn Sleeper>,
    opening_line: String,
}

impl Conversation {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            strategies: vec![ReplyStrategy::Chat, ReplyStrategy::Completion],
            pause: Duration::ZERO,
            sleeper: Arc::new(TokioSleeper),
            opening_line: DEFAULT_OPENING_LINE.to_string(),
        }
    }

    /// Replace the fallback chain; strategies are tried in the given order
    pub fn with_strategies(mut self, strategies: Vec<ReplyStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Wait this long between turns
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_opening_line<S: Into<String>>(mut self, opening_line: S) -> Self {
        self.opening_line = opening_line.into();
        self
    }

    pub fn strategies(&self) -> &[ReplyStrategy] {
        &self.strategies
    }

    /// The single-shot prompt used by the completion strategy
    pub fn completion_prompt(&self, speaker: &Agent, transcript: &Transcript) -> String {
        let last = transcript
            .last()
            .map(|utterance| utterance.text.as_str())
            .unwrap_or(&self.opening_line);
        format!("{}, reply to: {}", speaker.name(), last)
    }

    async fn attempt(
        &self,
        strategy: ReplyStrategy,
        speaker: &Agent,
        transcript: &Transcript,
    ) -> Result<String, ModelCallError> {
        let response = match strategy {
            ReplyStrategy::Chat => {
                let context = speaker.build_context(transcript);
                self.provider.chat(speaker.model(), &context).await?
            }
            ReplyStrategy::Completion => {
                let prompt = self.completion_prompt(speaker, transcript);
                self.provider.complete(speaker.model(), &prompt).await?
            }
        };
        Ok(response.normalize())
    }

    /// Try each strategy in order and return the first reply, or the last failure
    pub async fn attempt_reply(
        &self,
        speaker: &Agent,
        transcript: &Transcript,
    ) -> Result<String, ModelCallError> {
        let mut last_error =
            ModelCallError::Backend("no reply strategies configured".to_string());
        for &strategy in &self.strategies {
            match self.attempt(strategy, speaker, transcript).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    warn!(speaker = speaker.name(), ?strategy, error = %err, "reply attempt failed");
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }

    /// The speaker's next line; failures become a diagnostic placeholder
    pub async fn reply(&self, speaker: &Agent, transcript: &Transcript) -> String {
        match self.attempt_reply(speaker, transcript).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => format!("(error generating reply: {})", err),
        }
    }

    pub async fn run(
        &self,
        agents: &mut [Agent],
        turns: usize,
    ) -> Result<Transcript, ConversationError> {
        self.run_with(agents, turns, |_, _| {}).await
    }

    /// Run `turns` turns round-robin over `agents`, calling `on_turn` after each committed turn
    ///
    /// After every turn the speaker remembers what it said and every other agent remembers what
    /// it heard, so each memory grows by exactly one entry per turn.
    pub async fn run_with<F>(
        &self,
        agents: &mut [Agent],
        turns: usize,
        mut on_turn: F,
    ) -> Result<Transcript, ConversationError>
    where
        F: FnMut(usize, &Utterance),
    {
        let mut transcript = Transcript::new();
        if turns == 0 {
            return Ok(transcript);
        }
        if agents.is_empty() {
            return Err(ConversationError::NoParticipants);
        }
        let mut names = HashSet::new();
        if let Some(duplicate) = agents.iter().find(|agent| !names.insert(agent.name())) {
            return Err(ConversationError::DuplicateParticipant(
                duplicate.name().to_string(),
            ));
        }

        for turn in 0..turns {
            let index = turn % agents.len();
            let speaker = &agents[index];
            info!(turn = turn + 1, speaker = speaker.name(), "generating");

            let text = self.reply(speaker, &transcript).await;
            let utterance = Utterance::new(speaker.name(), text);

            for (position, agent) in agents.iter_mut().enumerate() {
                if position == index {
                    agent.remember(format!("I said: {}", utterance.text));
                } else {
                    agent.remember(format!(
                        "I heard {} say: {}",
                        utterance.speaker, utterance.text
                    ));
                }
            }
            transcript.push(utterance);

            if let Some(committed) = transcript.last() {
                on_turn(turn, committed);
            }

            if !self.pause.is_zero() && turn + 1 < turns {
                self.sleeper.sleep(self.pause).await;
            }
        }

        Ok(transcript)
    }
}
