use serde::Serialize;

use crate::models::message::{Message, Role};
use crate::models::transcript::Transcript;

/// An independent conversational participant
///
/// Each agent carries a fixed instruction prompt, the identifier of the model it addresses and
/// a private, append-only memory that is never shared with other agents.
#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    name: String,
    instructions: String,
    model: String,
    memory: Vec<String>,
}

impl Agent {
    pub fn new<N, I, M>(name: N, instructions: I, model: M) -> Self
    where
        N: Into<String>,
        I: Into<String>,
        M: Into<String>,
    {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            memory: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn memory(&self) -> &[String] {
        &self.memory
    }

    /// Append an entry to private memory
    pub fn remember<S: Into<String>>(&mut self, entry: S) {
        self.memory.push(entry.into());
    }

    /// Build the ordered context this agent sends to a chat backend
    ///
    /// The instruction prompt comes first (when set), then every memory entry as additional
    /// instruction context, then the shared transcript. Transcript lines are attributed to this
    /// agent when it spoke them and to the other side otherwise, and always carry the speaker's
    /// name since several participants may share the other role.
    pub fn build_context(&self, transcript: &Transcript) -> Vec<Message> {
        let mut messages = Vec::with_capacity(1 + self.memory.len() + transcript.len());

        if !self.instructions.is_empty() {
            messages.push(Message::instruction(&self.instructions));
        }
        messages.extend(self.memory.iter().map(Message::instruction));
        messages.extend(transcript.iter().map(|utterance| {
            let role = if utterance.speaker == self.name {
                Role::Own
            } else {
                Role::Other
            };
            Message::new(role, format!("{}: {}", utterance.speaker, utterance.text))
        }));

        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transcript::Utterance;

    #[test]
    fn test_empty_state_has_only_instructions() {
        let agent = Agent::new("Alice", "You are Alice.", "qwen2.5");
        let context = agent.build_context(&Transcript::new());
        assert_eq!(context, vec![Message::instruction("You are Alice.")]);
    }

    #[test]
    fn test_no_instructions_no_state_is_empty() {
        let agent = Agent::new("Alice", "", "qwen2.5");
        assert!(agent.build_context(&Transcript::new()).is_empty());
    }

    #[test]
    fn test_context_order_and_roles() {
        let mut agent = Agent::new("Bob", "You are Bob.", "llama3");
        agent.remember("I heard Alice say: hi");
        agent.remember("I said: hello");

        let mut transcript = Transcript::new();
        transcript.push(Utterance::new("Alice", "hi"));
        transcript.push(Utterance::new("Bob", "hello"));
        transcript.push(Utterance::new("Carol", "hey all"));

        let context = agent.build_context(&transcript);

        assert_eq!(
            context,
            vec![
                Message::instruction("You are Bob."),
                Message::instruction("I heard Alice say: hi"),
                Message::instruction("I said: hello"),
                Message::other("Alice: hi"),
                Message::own("Bob: hello"),
                Message::other("Carol: hey all"),
            ]
        );
    }

    #[test]
    fn test_build_context_does_not_mutate() {
        let mut agent = Agent::new("Alice", "x", "m");
        agent.remember("note");
        let mut transcript = Transcript::new();
        transcript.push(Utterance::new("Bob", "hi"));

        let first = agent.build_context(&transcript);
        let second = agent.build_context(&transcript);

        assert_eq!(first, second);
        assert_eq!(agent.memory(), ["note".to_string()]);
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_accessors() {
        let agent = Agent::new("Alice", "You are Alice.", "qwen2.5:14b");
        assert_eq!(agent.name(), "Alice");
        assert_eq!(agent.instructions(), "You are Alice.");
        assert_eq!(agent.model(), "qwen2.5:14b");
        assert!(agent.memory().is_empty());
    }
}
