use crate::types::{ChatMessage, ParticipantName};
use std::collections::VecDeque;

/// Append-only chat history, replayed to every new connection.
///
/// Unbounded unless a limit is configured, in which case the oldest entries
/// are evicted.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
    limit: Option<usize>,
}

impl ChatLog {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            messages: VecDeque::new(),
            limit,
        }
    }

    /// Stamp with the server receipt time and append
    pub fn append(&mut self, name: ParticipantName, message: String, now_ms: i64) -> ChatMessage {
        let entry = ChatMessage {
            name,
            message,
            timestamp: now_ms,
        };
        self.messages.push_back(entry.clone());
        if let Some(limit) = self.limit {
            while self.messages.len() > limit {
                self.messages.pop_front();
            }
        }
        entry
    }

    pub fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
