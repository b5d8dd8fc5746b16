//! Sliding-window conversation memory.
//!
//! Holds at most `max_messages` messages. A leading System message is pinned:
//! it counts toward the limit but eviction always removes the oldest
//! non-system message first.

use ragdesk_core::types::{Message, Role};

#[derive(Debug, Clone)]
pub struct ChatMemory {
    max_messages: usize,
    messages: Vec<Message>,
}

impl ChatMemory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages: max_messages.max(1),
            messages: Vec::new(),
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, evicting the oldest non-system message when full.
    /// A System message replaces the current role instead.
    pub fn append(&mut self, message: Message) {
        if message.role == Role::System {
            self.set_system_role(&message.content);
            return;
        }
        self.messages.push(message);
        while self.messages.len() > self.max_messages {
            let oldest = usize::from(self.has_system());
            if oldest >= self.messages.len() {
                break;
            }
            self.messages.remove(oldest);
        }
    }

    /// The current window, oldest first.
    pub fn window(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn system_role(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Install `role` as the system message. Returns `false` and keeps the
    /// history when the role is unchanged; otherwise the history is dropped.
    pub fn set_system_role(&mut self, role: &str) -> bool {
        if self.system_role() == Some(role) {
            return false;
        }
        self.messages.clear();
        self.messages.push(Message::system(role));
        true
    }

    fn has_system(&self) -> bool {
        self.system_role().is_some()
    }
}
