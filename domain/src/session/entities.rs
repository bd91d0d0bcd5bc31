//! Session domain entities

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Keep only the most recent `exchanges` user/assistant pairs.
pub fn history_window(history: &[Message], exchanges: usize) -> &[Message] {
    let keep = exchanges.saturating_mul(2);
    &history[history.len().saturating_sub(keep)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert!("system".parse::<Role>().is_err());
    }

    #[test]
    fn test_history_window_keeps_tail() {
        let history: Vec<Message> = (0..30)
            .map(|i| {
                if i % 2 == 0 {
                    Message::assistant(format!("q{i}"))
                } else {
                    Message::user(format!("a{i}"))
                }
            })
            .collect();

        let window = history_window(&history, 10);
        assert_eq!(window.len(), 20);
        assert_eq!(window[0].content, "q10");
        assert_eq!(window.last().unwrap().content, "a29");
    }

    #[test]
    fn test_history_window_short_history() {
        let history = vec![Message::assistant("hello")];
        assert_eq!(history_window(&history, 10).len(), 1);
        assert!(history_window(&history, 0).is_empty());
    }
}
