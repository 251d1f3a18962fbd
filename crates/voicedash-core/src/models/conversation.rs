use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::format::format_timestamp;

/// Speaker of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Bot,
    /// Tool calls and anything else the backend adds later
    #[serde(other)]
    Other,
}

impl Role {
    /// Whether the message came from the assistant side of the call
    pub fn is_agent(&self) -> bool {
        matches!(self, Role::Assistant | Role::Bot)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
            Role::Bot => write!(f, "bot"),
            Role::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(alias = "content", default)]
    pub message: String,
    /// Seconds since epoch
    #[serde(default)]
    pub time: Option<f64>,
}

impl Message {
    /// Timestamp used for ordering; missing times sort first.
    pub fn sort_key(&self) -> f64 {
        self.time.unwrap_or(0.0)
    }

    pub fn time_display(&self) -> String {
        format_timestamp(self.time)
    }
}

/// Messages of one call, in the order the backend sent them.
pub type Conversation = Vec<Message>;

/// Payload of `GET /messages`: assistant name to that assistant's conversations.
pub type ConversationLog = BTreeMap<String, Vec<Conversation>>;
