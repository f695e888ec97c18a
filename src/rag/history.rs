use serde::{Deserialize, Serialize};

use super::prompts::EMPTY_HISTORY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation. Sources are only ever present on
/// assistant turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources,
        }
    }
}

/// Render history the way the prompts expect it: one `User:`/`Assistant:`
/// line per turn, or the fixed empty-history marker.
pub fn format_history(turns: &[ChatTurn]) -> String {
    if turns.is_empty() {
        return EMPTY_HISTORY.to_string();
    }

    turns
        .iter()
        .map(|turn| match turn.role {
            Role::User => format!("User: {}", turn.content),
            Role::Assistant => format!("Assistant: {}", turn.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
