use serde::{Deserialize, Serialize};

/// Who a context entry is attributed to, from the point of view of the agent being prompted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Framing context: the instruction prompt and private memory
    Instruction,
    /// Something the prompted agent said itself
    #[serde(rename = "self")]
    Own,
    /// Something another participant said
    Other,
}

impl Role {
    /// The equivalent role in the system/assistant/user vocabulary most chat backends share
    pub fn as_chat_role(&self) -> &'static str {
        match self {
            Role::Instruction => "system",
            Role::Own => "assistant",
            Role::Other => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A single entry of the context sent to a chat backend
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }

    pub fn instruction<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Instruction, content)
    }

    pub fn own<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Own, content)
    }

    pub fn other<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Other, content)
    }
}
