//! Conversation memory: prior turns re-materialized for each request.
//!
//! Built fresh from caller-supplied history on every run and never kept
//! between runs.

use fieldhand_core::message::Message;

const EMPTY_HISTORY: &str = "(no previous messages)";

#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    messages: Vec<Message>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from history, preserving order.
    pub fn from_messages(messages: &[Message]) -> Self {
        Self {
            messages: messages.to_vec(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// One `Role: content` line per message, oldest first.
    pub fn render(&self) -> String {
        if self.messages.is_empty() {
            return EMPTY_HISTORY.to_string();
        }
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldhand_core::message::Role;

    #[test]
    fn round_trip_keeps_order() {
        let memory = ConversationMemory::from_messages(&[
            Message::user("hi"),
            Message::assistant("hello"),
        ]);
        assert_eq!(memory.render(), "User: hi\nAssistant: hello");
        assert_eq!(memory.messages()[0].role, Role::User);
        assert_eq!(memory.messages()[1].content, "hello");
    }

    #[test]
    fn empty_history_renders_placeholder() {
        let memory = ConversationMemory::new();
        assert!(memory.is_empty());
        assert_eq!(memory.render(), EMPTY_HISTORY);
    }
}
